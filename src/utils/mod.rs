pub mod prefix_sum;

#[cfg(feature = "gpu")]
pub mod gpu_buffer;
#[cfg(feature = "gpu")]
pub mod compute_shader;
#[cfg(feature = "gpu")]
pub mod bind_resources;
