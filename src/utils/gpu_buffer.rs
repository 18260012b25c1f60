use crate::gpu::wgpu_context::WgpuContext;
use wgpu::Buffer;

/// A typed GPU buffer that remembers how many elements it holds.
///
/// The allocation always has room for at least one element, so empty
/// populations can still be bound.
#[derive(Debug)]
pub struct GpuBuffer<T> {
    data: Vec<T>,
    buffer: wgpu::Buffer,
}

impl<T: bytemuck::Pod> GpuBuffer<T> {
    pub fn new(wgpu_context: &WgpuContext, label: &str, data: Vec<T>, usage: wgpu::BufferUsages) -> Self {
        let usage = usage | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC;
        let buffer = wgpu_context.get_device().create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (data.len().max(1) * size_of::<T>()) as u64,
            usage,
            mapped_at_creation: false,
        });
        if !data.is_empty() {
            wgpu_context.get_queue().write_buffer(&buffer, 0, bytemuck::cast_slice(&data));
        }

        Self { data, buffer }
    }

    pub fn zeroed(wgpu_context: &WgpuContext, label: &str, len: usize, usage: wgpu::BufferUsages) -> Self {
        Self::new(wgpu_context, label, vec![T::zeroed(); len], usage)
    }

    /// Overwrites one element in place; used for uniform blocks.
    pub fn replace_elem(&mut self, value: T, index: usize, wgpu_context: &WgpuContext) {
        self.data[index] = value;
        let offset = (index * size_of::<T>()) as u64;
        wgpu_context
            .get_queue()
            .write_buffer(&self.buffer, offset, bytemuck::bytes_of(&self.data[index]));
    }

    /// Downloads the buffer into the CPU-side copy and returns it.
    pub fn download(&mut self, wgpu_context: &WgpuContext) -> anyhow::Result<&[T]> {
        let device = wgpu_context.get_device();
        let size = (self.data.len() * size_of::<T>()) as u64;
        if size == 0 {
            return Ok(&self.data);
        }

        // The main buffer cannot be mapped, so copy it into a MAP_READ staging buffer first
        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Staging Buffer (Download)"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Download Encoder"),
        });
        encoder.copy_buffer_to_buffer(&self.buffer, 0, &staging_buffer, 0, size);
        wgpu_context.get_queue().submit(Some(encoder.finish()));

        let buffer_slice = staging_buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        // Blocks until the copy and the mapping have finished
        device.poll(wgpu::PollType::Wait)?;
        receiver.recv()??;

        {
            let mapped_range = buffer_slice.get_mapped_range();
            self.data.clear();
            self.data.extend_from_slice(bytemuck::cast_slice(&mapped_range));
        }
        staging_buffer.unmap();

        Ok(&self.data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Size in bytes of the elements this buffer holds.
    pub fn byte_len(&self) -> u64 {
        (self.data.len() * size_of::<T>()) as u64
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }
}
