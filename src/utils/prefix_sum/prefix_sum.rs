use wgpu::CommandEncoder;
use crate::gpu::wgpu_context::WgpuContext;
use crate::utils::bind_resources::{BindResources, BindingKind};
use crate::utils::compute_shader::ComputeShader;
use crate::utils::gpu_buffer::GpuBuffer;

const WORKGROUP_SIZE: (u32, u32, u32) = (256, 1, 1);
const ELEMS_PER_THREAD: u32 = 2;
const BLOCK_SIZE: u32 = ELEMS_PER_THREAD * WORKGROUP_SIZE.0;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct ScanParams {
    num_items: u32,
    _padding: [u32; 3],
}

/// Exclusive prefix sum of a `u32` storage buffer, in place.
///
/// Pass 1 scans every block of `BLOCK_SIZE` values and stores the block
/// totals. Pass 2 scans the totals, with a nested `PrefixSum` when there are
/// more blocks than fit in one workgroup. Pass 3 adds each block's offset back.
pub struct PrefixSum {
    scan_blocks: ComputeShader,
    scan_block_sums: ComputeShader,
    add_block_offsets: ComputeShader,
    bind_resources: BindResources,
    _block_sums: GpuBuffer<u32>,
    _uniform_data: GpuBuffer<ScanParams>,
    num_items: u32,
    block_prefix_sum: Option<Box<PrefixSum>>,
}

impl PrefixSum {
    pub fn new(wgpu_context: &WgpuContext, buffer: &GpuBuffer<u32>) -> Self {
        let num_items = buffer.len() as u32;
        let num_blocks = num_items.div_ceil(BLOCK_SIZE);

        let block_sums: GpuBuffer<u32> = GpuBuffer::zeroed(wgpu_context, "Prefix Sum Block Sums", num_blocks as usize, wgpu::BufferUsages::STORAGE);
        let uniform_data = GpuBuffer::new(
            wgpu_context,
            "Prefix Sum Params",
            vec![ScanParams { num_items, _padding: [0; 3] }],
            wgpu::BufferUsages::UNIFORM,
        );

        let bind_resources = BindResources::new(
            wgpu_context,
            "Prefix Sum",
            &[
                (BindingKind::Storage, buffer.buffer()),
                (BindingKind::Uniform, uniform_data.buffer()),
                (BindingKind::Storage, block_sums.buffer()),
            ],
        );

        let module = wgpu_context
            .get_device()
            .create_shader_module(wgpu::include_wgsl!("prefix_sum.wgsl"));
        let layout = &bind_resources.bind_group_layout;

        let block_prefix_sum = (num_blocks > BLOCK_SIZE).then(|| Box::new(PrefixSum::new(wgpu_context, &block_sums)));

        Self {
            scan_blocks: ComputeShader::new(wgpu_context, &module, "scan_blocks", layout, WORKGROUP_SIZE),
            scan_block_sums: ComputeShader::new(wgpu_context, &module, "scan_block_sums", layout, WORKGROUP_SIZE),
            add_block_offsets: ComputeShader::new(wgpu_context, &module, "add_block_offsets", layout, WORKGROUP_SIZE),
            bind_resources,
            _block_sums: block_sums,
            _uniform_data: uniform_data,
            num_items,
            block_prefix_sum,
        }
    }

    /// Records the scan passes. The buffer's total is not returned; it is
    /// the last offset plus the last input value.
    pub fn execute(&self, encoder: &mut CommandEncoder) {
        if self.num_items == 0 {
            return;
        }
        let num_blocks = self.num_items.div_ceil(BLOCK_SIZE);
        let bind_group = &self.bind_resources.bind_group;

        self.scan_blocks.dispatch(encoder, (num_blocks, 1, 1), bind_group);

        match &self.block_prefix_sum {
            Some(block_prefix_sum) => block_prefix_sum.execute(encoder),
            None => self.scan_block_sums.dispatch(encoder, (1, 1, 1), bind_group),
        }

        self.add_block_offsets.dispatch_by_items(encoder, (self.num_items, 1, 1), bind_group);
    }
}
