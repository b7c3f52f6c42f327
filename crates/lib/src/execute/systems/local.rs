use std::path::PathBuf;

use crate::config::StepConfig;
use crate::execute::shell::CommandRunner;
use crate::execute::systems::BuildSystem;
use crate::execute::types::ExecuteError;

/// Runs steps directly in the shell of the machine this process runs on,
/// which is the sandbox itself when invoked as a cross-compile agent.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellBuildSystem;

impl BuildSystem for ShellBuildSystem {
  fn name(&self) -> &'static str {
    "shell"
  }

  async fn health_check<R: CommandRunner>(&self, config: &StepConfig, runner: &R) -> Result<(), ExecuteError> {
    let probe = if config.target.is_windows() { "ver" } else { "bash --version" };
    runner
      .capture(probe, None)
      .await
      .map(|_| ())
      .map_err(|err| ExecuteError::HealthCheck {
        system: self.name().to_string(),
        message: err.to_string(),
      })
  }

  async fn exec_build<R: CommandRunner>(&self, config: &StepConfig, runner: &R) -> Result<(), ExecuteError> {
    let mut cmds = vec!["cd $BUILD_CWD".to_string()];
    cmds.extend(config.commands());
    let line = config.inject_env(&cmds.join(" && "))?;
    let cwd = PathBuf::from(config.inject_env("$BUILD_CWD")?);

    runner.run(&line, Some(&cwd)).await
  }
}
