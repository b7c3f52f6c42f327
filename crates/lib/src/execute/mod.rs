//! Build orchestration.
//!
//! [`execute_build`] is the library's entry point. It validates a request into
//! a plan, brings the cached runtime output in line with the requested
//! target, and then either runs the planned steps here or hands the whole plan
//! to a sandbox that runs this program again.
//!
//! Steps run strictly one after the other in canonical order. The first
//! failing step ends the build.

pub mod agent;
pub mod shell;
pub mod systems;
pub mod types;

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::BuildError;
use crate::cache::{ArtifactCache, cache_tag};
use crate::config::StepConfigBuilder;
use crate::params::{BuildParams, BuildPlan};
use crate::platform::{AgentKind, PlatformError, PlatformRegistry, Target};
use crate::settings::Settings;
use crate::steps::StepRegistry;

use agent::{AgentRequest, Quote};
use systems::{DockerBuildSystem, ShellBuildSystem, VagrantBuildSystem, run_lifecycle};

pub use shell::{CommandRunner, ShellRunner, Teardown};
pub use types::{BuildReport, ExecuteError, Phase, SkippedStep};

/// The registries and settings a build runs against.
#[derive(Debug)]
pub struct BuildContext {
  pub settings: Settings,
  pub platforms: PlatformRegistry,
  pub steps: StepRegistry,
}

impl BuildContext {
  pub fn new(settings: Settings) -> Self {
    Self {
      settings,
      platforms: PlatformRegistry::standard(),
      steps: StepRegistry::standard(),
    }
  }
}

/// Validate `params`, then run or delegate the resulting plan.
///
/// Nothing runs when validation fails. Teardowns armed by a sandbox fire
/// before this returns, whatever the outcome.
pub async fn execute_build<R: CommandRunner>(
  params: &BuildParams,
  ctx: &BuildContext,
  runner: &R,
) -> Result<BuildReport, BuildError> {
  let started = Instant::now();
  let plan = params.plan(&ctx.platforms, &ctx.steps)?;
  let target = ctx.platforms.get(plan.target)?;

  info!(
    target = %plan.target,
    arch = %plan.arch,
    vendor = plan.vendor.as_deref().unwrap_or("-"),
    steps = %plan.plan,
    "build plan resolved"
  );

  // Only the instigator owns the host checkout.
  let cache = if params.cross_agent.is_none() {
    let cache = ArtifactCache::for_project(ctx.settings.project_root());
    if cache.is_present() {
      Some(cache.reconcile(Some(&cache_tag(plan.vendor.as_deref(), plan.target, plan.arch)))?)
    } else {
      None
    }
  } else {
    None
  };

  let mut report = BuildReport {
    target: plan.target.to_string(),
    arch: plan.arch.to_string(),
    vendor: plan.vendor.clone(),
    plan: plan.plan.clone(),
    executed: Vec::new(),
    skipped: Vec::new(),
    delegated: None,
    cache,
    elapsed: Default::default(),
  };

  let mut builder = StepConfigBuilder::new(&ctx.settings, target, plan.arch);
  builder
    .vendor(plan.vendor.clone())
    .node_enabled(params.node_enabled)
    .keep_native_libs(params.keep_native_libs)
    .no_shutdown(params.no_shutdown)
    .redirect_stdout(params.redirect_stdout)
    .sys_image(params.sys_image.clone());

  match &plan.delegate {
    Some(agent) => {
      delegate(params, ctx, &plan, agent.kind, &mut builder, runner).await?;
      report.delegated = Some(agent.kind);
    }
    None => run_locally(params, &plan, target, &mut builder, runner, &mut report).await?,
  }

  report.elapsed = started.elapsed();
  info!(elapsed = ?report.elapsed, "build finished");
  Ok(report)
}

/// Run the whole plan inside the sandbox `kind` by invoking this program there.
async fn delegate<R: CommandRunner>(
  params: &BuildParams,
  ctx: &BuildContext,
  plan: &BuildPlan,
  kind: AgentKind,
  builder: &mut StepConfigBuilder,
  runner: &R,
) -> Result<(), BuildError> {
  let agent = plan.delegate.as_ref().ok_or(PlatformError::NoAgent {
    target: plan.target,
    agent: kind,
  })?;

  let request = AgentRequest::new(kind, plan, &params.step_args)
    .node_enabled(params.node_enabled)
    .keep_native_libs(params.keep_native_libs);
  let line = request.to_command_line(&ctx.settings.agent_command, Quote::for_agent(kind, plan.target));

  builder
    .label(format!("cross-compile {kind}"))
    .agent(agent)
    .cross_agent(Some(kind))
    .commands(Arc::new(move |_| vec![line.clone()]));
  let config = builder.freeze();

  info!(agent = %kind, "delegating build to cross-compile agent");

  let mut teardowns = Vec::new();
  match kind {
    AgentKind::Docker => run_lifecycle(&DockerBuildSystem, &config, runner, &mut teardowns).await?,
    AgentKind::Vagrant => run_lifecycle(&VagrantBuildSystem, &config, runner, &mut teardowns).await?,
  }

  Ok(())
}

/// Run each planned step here, skipping the ones the target does not define.
async fn run_locally<R: CommandRunner>(
  params: &BuildParams,
  plan: &BuildPlan,
  target: &Target,
  builder: &mut StepConfigBuilder,
  runner: &R,
  report: &mut BuildReport,
) -> Result<(), BuildError> {
  if let Some(kind) = params.cross_agent {
    let agent = target.agent(kind).ok_or(PlatformError::NoAgent {
      target: target.os,
      agent: kind,
    })?;
    builder.cross_agent(Some(kind)).build_cwd(Some(agent.build_cwd.clone()));
  }

  let mut teardowns = Vec::new();

  for step in plan.plan.iter() {
    let Some(step_fn) = target.step(step) else {
      warn!(step = %step, target = %target.os, "target does not define this build-step, skipping");
      report.skipped.push(SkippedStep {
        step,
        reason: format!("not defined for target '{}'", target.os),
      });
      continue;
    };

    info!(step = %step, "running build-step");
    builder
      .label(step.as_str())
      .step(Some(step))
      .args(params.step_args.get(&step).cloned())
      .commands(Arc::new(step_fn));
    let config = builder.freeze();

    run_lifecycle(&ShellBuildSystem, &config, runner, &mut teardowns).await?;

    builder.completed(step);
    report.executed.push(step);
  }

  Ok(())
}
