mod scan;
pub use scan::{exclusive_scan, exclusive_scan_sequential, PrefixSum};

#[cfg(feature = "gpu")]
pub mod prefix_sum;
