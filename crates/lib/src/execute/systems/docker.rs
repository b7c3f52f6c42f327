use std::path::PathBuf;

use tracing::info;

use crate::config::StepConfig;
use crate::execute::shell::{CommandRunner, Teardown};
use crate::execute::systems::BuildSystem;
use crate::execute::types::ExecuteError;

const IMAGE_NAME: &str = "j2v8-$VENDOR-$PLATFORM";
const CONTAINER_NAME: &str = "j2v8.$VENDOR.$PLATFORM.$ARCH";

/// Runs a step inside a Docker container built from the target's Dockerfile.
#[derive(Debug, Clone, Copy, Default)]
pub struct DockerBuildSystem;

impl DockerBuildSystem {
  fn container(config: &StepConfig) -> Result<String, ExecuteError> {
    Ok(config.inject_env(CONTAINER_NAME)?)
  }

  fn unusable(&self, message: impl Into<String>) -> ExecuteError {
    ExecuteError::HealthCheck {
      system: self.name().to_string(),
      message: message.into(),
    }
  }
}

/// The `OS/Arch` the Docker server reports in `docker version` output.
pub fn docker_server_os(version_output: &str) -> Option<&str> {
  let (_, server) = version_output.split_once("Server:")?;
  server
    .lines()
    .skip(1)
    .take_while(|line| !line.trim().is_empty())
    .find_map(|line| line.trim_start().strip_prefix("OS/Arch:"))
    .map(str::trim)
}

impl BuildSystem for DockerBuildSystem {
  fn name(&self) -> &'static str {
    "docker"
  }

  async fn health_check<R: CommandRunner>(&self, config: &StepConfig, runner: &R) -> Result<(), ExecuteError> {
    runner
      .capture("docker stats --no-stream", None)
      .await
      .map_err(|_| self.unusable("the docker daemon is not running or not reachable"))?;

    let version = runner
      .capture("docker version", None)
      .await
      .map_err(|err| self.unusable(err.to_string()))?;

    let server_os = docker_server_os(&version)
      .ok_or_else(|| self.unusable("unable to determine the docker server OS/Arch"))?
      .to_lowercase();

    let expected = if config.target.is_windows() { "windows" } else { "linux" };
    if !server_os.contains(expected) {
      return Err(self.unusable(format!(
        "the docker server serves '{server_os}' containers, '{expected}' containers are required"
      )));
    }

    Ok(())
  }

  async fn clean<R: CommandRunner>(&self, config: &StepConfig, runner: &R) -> Result<(), ExecuteError> {
    let container = Self::container(config)?;
    runner.run(&format!("docker rm -f -v {container}"), None).await
  }

  async fn pre_build<R: CommandRunner>(
    &self,
    config: &StepConfig,
    runner: &R,
  ) -> Result<Option<Teardown>, ExecuteError> {
    let container = Self::container(config)?;
    let image = config.inject_env(IMAGE_NAME)?;

    // armed before the image build so a failing build still stops the container
    let guard = (!config.no_shutdown).then(|| runner.teardown(format!("docker stop {container}"), None));

    let mut build_args = String::new();
    if let Some(sys_image) = &config.sys_image {
      build_args.push_str(&format!("--build-arg sys_image={sys_image} "));
    }
    if let Some(vendor) = config.vendor() {
      build_args.push_str(&format!("--build-arg vendor={vendor} "));
    }

    let host_cwd = PathBuf::from(config.inject_env("$HOST_CWD")?);
    info!(image = %image, "building docker image");
    runner
      .run(
        &config.inject_env(&format!("docker build {build_args}-f $PLATFORM/Dockerfile -t \"{image}\" ."))?,
        Some(&host_cwd),
      )
      .await?;

    Ok(guard)
  }

  async fn exec_build<R: CommandRunner>(&self, config: &StepConfig, runner: &R) -> Result<(), ExecuteError> {
    let container = Self::container(config)?;
    let image = config.inject_env(IMAGE_NAME)?;

    let (mount, options, shell, separator) = if config.target.is_windows() {
      ("C:/j2v8", "--memory 3g", "cmd /C", "&& ")
    } else {
      ("/j2v8", "--privileged", "/bin/bash -c", "; ")
    };

    let cmds = config.commands().join(separator);
    let line = config.inject_env(&format!(
      "docker run {options} -P -v $CWD:{mount} --name {container} {image} {shell} \"cd $BUILD_CWD{separator}{cmds}\""
    ))?;

    runner.run(&line, None).await
  }
}
