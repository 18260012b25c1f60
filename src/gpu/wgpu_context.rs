use wgpu::Adapter;

/// Headless device and queue for the compute backend.
pub struct WgpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter: Adapter,
}

impl WgpuContext {
    pub async fn new() -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Simulation Device"),
                required_features: wgpu::Features::empty(),
                required_limits: adapter.limits(),
                ..Default::default()
            })
            .await?;

        Ok(Self { device, queue, adapter })
    }

    /// Blocks on [`WgpuContext::new`].
    pub fn new_blocking() -> anyhow::Result<Self> {
        pollster::block_on(Self::new())
    }

    pub fn get_device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn get_queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn get_adapter(&self) -> &Adapter {
        &self.adapter
    }
}
