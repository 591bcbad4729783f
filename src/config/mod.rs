//! JSON runtime configuration of the `depth_rgb_calib` binary.
pub mod runtime;

pub use runtime::{load_config, OutputConfig, RuntimeConfig};
