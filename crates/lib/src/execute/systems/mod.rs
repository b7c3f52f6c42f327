//! Build systems: where and how a frozen step's commands run.
//!
//! Every step goes through the same lifecycle, whatever runs it:
//!
//! ```text
//! HealthCheck -> Clean -> PreBuild -> Exec -> PostBuild -> Done
//!      \___________\________\_________\________\________-> Failed
//! ```
//!
//! A failing clean is logged and ignored; any other failing phase ends the
//! step and with it the build.

pub mod docker;
pub mod local;
pub mod vagrant;

use tracing::{debug, warn};

use crate::config::StepConfig;
use crate::execute::shell::{CommandRunner, Teardown};
use crate::execute::types::{ExecuteError, Phase};

pub use docker::DockerBuildSystem;
pub use local::ShellBuildSystem;
pub use vagrant::VagrantBuildSystem;

/// One execution strategy.
#[allow(async_fn_in_trait)]
pub trait BuildSystem {
  fn name(&self) -> &'static str;

  /// Verify the tools this system needs are usable.
  async fn health_check<R: CommandRunner>(&self, config: &StepConfig, runner: &R) -> Result<(), ExecuteError>;

  /// Remove leftovers of an earlier run.
  async fn clean<R: CommandRunner>(&self, _config: &StepConfig, _runner: &R) -> Result<(), ExecuteError> {
    Ok(())
  }

  /// Prepare the environment; the returned guard undoes it.
  async fn pre_build<R: CommandRunner>(
    &self,
    _config: &StepConfig,
    _runner: &R,
  ) -> Result<Option<Teardown>, ExecuteError> {
    Ok(None)
  }

  async fn exec_build<R: CommandRunner>(&self, config: &StepConfig, runner: &R) -> Result<(), ExecuteError>;

  async fn post_build<R: CommandRunner>(&self, _config: &StepConfig, _runner: &R) -> Result<(), ExecuteError> {
    Ok(())
  }

  /// Whether a successful post-build already did what the pre-build guard
  /// would do.
  fn post_build_releases(&self) -> bool {
    false
  }
}

/// Drive `system` through the lifecycle for one frozen step.
///
/// Guards armed in pre-build that outlive the step are moved to `teardowns`;
/// on failure they are dropped, and so fire, before this returns.
pub async fn run_lifecycle<S, R>(
  system: &S,
  config: &StepConfig,
  runner: &R,
  teardowns: &mut Vec<Teardown>,
) -> Result<(), ExecuteError>
where
  S: BuildSystem,
  R: CommandRunner,
{
  let mut phase = Phase::HealthCheck;
  let mut guard = None;

  while !phase.is_terminal() {
    debug!(system = system.name(), step = %config.label, %phase, "entering phase");

    let result = match phase {
      Phase::HealthCheck => system.health_check(config, runner).await,
      Phase::Clean => {
        if let Err(err) = system.clean(config, runner).await {
          warn!(system = system.name(), error = %err, "nothing to clean");
        }
        Ok(())
      }
      Phase::PreBuild => system.pre_build(config, runner).await.map(|armed| guard = armed),
      Phase::Exec => system.exec_build(config, runner).await,
      Phase::PostBuild => system.post_build(config, runner).await,
      Phase::Done | Phase::Failed => Ok(()),
    };

    if let Err(source) = result {
      debug!(system = system.name(), step = %config.label, phase = %Phase::Failed, "step failed");
      return Err(ExecuteError::PhaseFailed {
        phase,
        label: config.label.clone(),
        source: Box::new(source),
      });
    }

    phase = phase.next();
  }

  if let Some(guard) = guard {
    if system.post_build_releases() {
      guard.disarm();
    } else {
      teardowns.push(guard);
    }
  }

  Ok(())
}
