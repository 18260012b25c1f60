use wgpu::{BindGroup, BindGroupLayout};
use crate::gpu::wgpu_context::WgpuContext;

/// How a buffer is bound to a compute shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Uniform,
    /// Always bound read-write; shaders declare every storage array `read_write`.
    Storage,
}

pub struct BindResources {
    pub bind_group: BindGroup,
    pub bind_group_layout: BindGroupLayout,
}

impl BindResources {
    /// Creates a layout and a bind group where binding `i` is `bindings[i]`.
    pub fn new(wgpu_context: &WgpuContext, label: &str, bindings: &[(BindingKind, &wgpu::Buffer)]) -> Self {
        let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = bindings
            .iter()
            .enumerate()
            .map(|(binding, (kind, _))| wgpu::BindGroupLayoutEntry {
                binding: binding as u32,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: match kind {
                        BindingKind::Uniform => wgpu::BufferBindingType::Uniform,
                        BindingKind::Storage => wgpu::BufferBindingType::Storage { read_only: false },
                    },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            })
            .collect();

        let bind_group_layout = wgpu_context.get_device().create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{label} Bind Group Layout")),
            entries: &layout_entries,
        });

        let group_entries: Vec<wgpu::BindGroupEntry> = bindings
            .iter()
            .enumerate()
            .map(|(binding, (_, buffer))| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: buffer.as_entire_binding(),
            })
            .collect();

        let bind_group = wgpu_context.get_device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} Bind Group")),
            layout: &bind_group_layout,
            entries: &group_entries,
        });

        Self {
            bind_group,
            bind_group_layout,
        }
    }
}
