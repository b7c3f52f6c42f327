mod build;
mod flush_cache;
mod preset;
mod steps;

pub use build::{BuildArgs, cmd_build};
pub use flush_cache::cmd_flush_cache;
pub use preset::{cmd_preset, cmd_presets};
pub use steps::cmd_steps;
