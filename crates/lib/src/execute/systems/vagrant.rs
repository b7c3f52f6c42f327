use std::path::PathBuf;

use tracing::info;

use crate::config::StepConfig;
use crate::execute::shell::{CommandRunner, Teardown};
use crate::execute::systems::BuildSystem;
use crate::execute::types::ExecuteError;
use crate::platform::{Dialect, Os};

/// Runs a step inside a Vagrant managed virtual machine.
///
/// The machine is brought up in pre-build and halted again in post-build;
/// the pre-build guard only matters when the build fails in between.
#[derive(Debug, Clone, Copy, Default)]
pub struct VagrantBuildSystem;

impl VagrantBuildSystem {
  fn host_dir(config: &StepConfig) -> Result<PathBuf, ExecuteError> {
    Ok(PathBuf::from(config.inject_env("$HOST_CWD")?))
  }

  /// Separator for chaining commands in the shell of this machine, which is
  /// where `vagrant` itself runs.
  fn host_separator() -> &'static str {
    if cfg!(windows) { "&& " } else { "; " }
  }
}

impl BuildSystem for VagrantBuildSystem {
  fn name(&self) -> &'static str {
    "vagrant"
  }

  async fn health_check<R: CommandRunner>(&self, _config: &StepConfig, runner: &R) -> Result<(), ExecuteError> {
    runner
      .capture("vagrant --version", None)
      .await
      .map(|_| ())
      .map_err(|err| ExecuteError::HealthCheck {
        system: self.name().to_string(),
        message: err.to_string(),
      })
  }

  async fn pre_build<R: CommandRunner>(
    &self,
    config: &StepConfig,
    runner: &R,
  ) -> Result<Option<Teardown>, ExecuteError> {
    let host_dir = Self::host_dir(config)?;
    let separator = Self::host_separator();

    let mut cmd = String::new();
    if let Some(pre) = &config.pre_build_cmd {
      cmd.push_str(pre);
      cmd.push_str(separator);
    }
    if let Some(image) = &config.sys_image {
      let host = Dialect::for_target(Os::current().unwrap_or(Os::Linux));
      cmd.push_str(&host.set_env("VAGRANT_SYS_IMAGE", image));
      cmd.push_str(separator);
    }
    cmd.push_str("vagrant up");

    let guard = (!config.no_shutdown).then(|| runner.teardown("vagrant halt".to_string(), Some(host_dir.clone())));

    info!(dir = %host_dir.display(), "starting vagrant machine");
    runner.run(&config.inject_env(&cmd)?, Some(&host_dir)).await?;

    Ok(guard)
  }

  async fn exec_build<R: CommandRunner>(&self, config: &StepConfig, runner: &R) -> Result<(), ExecuteError> {
    let host_dir = Self::host_dir(config)?;
    let cmds = config.commands().join("; ");

    let line = if config.target.is_windows() {
      format!("vagrant powershell -c \"Invoke-Command {{ cd $BUILD_CWD; {cmds} }} -ErrorAction Stop\"")
    } else {
      format!("vagrant ssh -c 'cd $BUILD_CWD; {cmds}'")
    };

    runner.run(&config.inject_env(&line)?, Some(&host_dir)).await
  }

  async fn post_build<R: CommandRunner>(&self, config: &StepConfig, runner: &R) -> Result<(), ExecuteError> {
    if config.no_shutdown {
      return Ok(());
    }
    let host_dir = Self::host_dir(config)?;
    runner.run("vagrant halt", Some(&host_dir)).await
  }

  fn post_build_releases(&self) -> bool {
    true
  }
}
