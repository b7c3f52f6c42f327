//! Test utilities for j2v8build-lib.
//!
//! [`RecordingRunner`] stands in for the host shell: it remembers every
//! command a build system issues, answers captures from canned output and
//! fails the commands it is told to fail.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::config::{StepConfig, StepConfigBuilder};
use crate::execute::shell::{CommandRunner, Teardown};
use crate::execute::types::ExecuteError;
use crate::frozen::Frozen;
use crate::platform::{Arch, Os, PlatformRegistry};
use crate::settings::Settings;

/// Project root used by [`step_config`].
pub const TEST_ROOT: &str = "/src/j2v8";

/// A frozen configuration for `os`/`arch`, adjusted by `adjust`.
pub fn step_config(os: Os, arch: Arch, adjust: impl FnOnce(&mut StepConfigBuilder)) -> Frozen<StepConfig> {
  let registry = PlatformRegistry::standard();
  let target = registry.get(os).expect("standard registry has every target");
  let mut builder = StepConfigBuilder::new(&Settings::new(TEST_ROOT), target, arch);
  adjust(&mut builder);
  builder.freeze()
}

/// One command seen by a [`RecordingRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
  pub cmd: String,
  pub cwd: Option<PathBuf>,
}

#[derive(Debug, Default)]
struct State {
  runs: Vec<Recorded>,
  teardowns: Vec<String>,
  outputs: Vec<(String, String)>,
  failing: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
  state: Arc<Mutex<State>>,
}

impl RecordingRunner {
  pub fn new() -> Self {
    Self::default()
  }

  /// Answer captures of commands starting with `prefix` with `output`.
  pub fn respond(self, prefix: &str, output: &str) -> Self {
    self.lock().outputs.push((prefix.to_string(), output.to_string()));
    self
  }

  /// Fail commands starting with `prefix`.
  pub fn fail(self, prefix: &str) -> Self {
    self.lock().failing.push(prefix.to_string());
    self
  }

  /// Every command run or captured, in order.
  pub fn commands(&self) -> Vec<String> {
    self.lock().runs.iter().map(|r| r.cmd.clone()).collect()
  }

  pub fn recorded(&self) -> Vec<Recorded> {
    self.lock().runs.clone()
  }

  /// Teardown commands that have fired.
  pub fn torn_down(&self) -> Vec<String> {
    self.lock().teardowns.clone()
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, State> {
    self.state.lock().expect("recording runner poisoned")
  }

  fn record(&self, cmd: &str, cwd: Option<&Path>) -> Result<(), ExecuteError> {
    let mut state = self.lock();
    state.runs.push(Recorded {
      cmd: cmd.to_string(),
      cwd: cwd.map(Path::to_path_buf),
    });
    if state.failing.iter().any(|prefix| cmd.starts_with(prefix.as_str())) {
      return Err(ExecuteError::CmdFailed {
        cmd: cmd.to_string(),
        code: Some(1),
      });
    }
    Ok(())
  }
}

impl CommandRunner for RecordingRunner {
  async fn run(&self, cmd: &str, cwd: Option<&Path>) -> Result<(), ExecuteError> {
    self.record(cmd, cwd)
  }

  async fn capture(&self, cmd: &str, cwd: Option<&Path>) -> Result<String, ExecuteError> {
    self.record(cmd, cwd)?;
    let state = self.lock();
    Ok(
      state
        .outputs
        .iter()
        .find(|(prefix, _)| cmd.starts_with(prefix.as_str()))
        .map(|(_, output)| output.clone())
        .unwrap_or_default(),
    )
  }

  fn teardown(&self, cmd: String, _cwd: Option<PathBuf>) -> Teardown {
    let state = Arc::clone(&self.state);
    Teardown::new(move || {
      if let Ok(mut state) = state.lock() {
        state.teardowns.push(cmd);
      }
    })
  }
}
