//! Step definitions and sandbox configurations of the supported targets.

pub mod android;
pub mod linux;
pub mod macos;
pub mod shared;
pub mod windows;
