//! j2v8build-lib: build orchestration for J2V8
//!
//! This crate turns a build request into an ordered list of atomic build steps
//! and runs them for one target platform:
//! - `steps`: the step registry and the token resolution into a plan
//! - `platform`: target platforms, their step definitions and sandboxes
//! - `config`: the per-step configuration and its frozen snapshots
//! - `execute`: the step lifecycle on the host shell, Docker or Vagrant
//! - `cache`: tagged reuse of the Node.js runtime output

pub mod cache;
pub mod config;
pub mod consts;
pub mod execute;
pub mod frozen;
pub mod params;
pub mod placeholder;
pub mod platform;
pub mod presets;
pub mod settings;
pub mod steps;

#[cfg(test)]
mod util;

use thiserror::Error;

use crate::cache::CacheError;
use crate::execute::ExecuteError;
use crate::params::ParamsError;
use crate::platform::PlatformError;

/// Coarse classification of a failed build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The request itself is invalid; nothing ran.
  Configuration,
  /// A tool the build needs is missing or unusable.
  Environment,
  /// A build command failed.
  Execution,
  /// The runtime output could not be moved in or out of the cache.
  Cache,
}

#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Params(#[from] ParamsError),

  #[error(transparent)]
  Platform(#[from] PlatformError),

  #[error(transparent)]
  Execute(#[from] ExecuteError),

  #[error(transparent)]
  Cache(#[from] CacheError),
}

impl BuildError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      BuildError::Params(_) | BuildError::Platform(_) => ErrorKind::Configuration,
      BuildError::Execute(err) if err.is_health_check() => ErrorKind::Environment,
      BuildError::Execute(_) => ErrorKind::Execution,
      BuildError::Cache(_) => ErrorKind::Cache,
    }
  }
}
