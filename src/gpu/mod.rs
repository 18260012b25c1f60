//! Compute-shader backend running the same tick stages on the GPU.

pub mod wgpu_context;
pub mod gpu_simulation;
