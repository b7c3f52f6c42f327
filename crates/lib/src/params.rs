//! The build request and its validation into a plan.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::{AgentConfig, AgentKind, Arch, Os, PlatformError, PlatformRegistry};
use crate::steps::{ResolveError, ResolvedPlan, Step, StepRegistry};

/// Token list used when neither steps nor step arguments are requested.
pub const DEFAULT_STEPS: &[&str] = &["all"];

#[derive(Debug, Error)]
pub enum ParamsError {
  #[error("no target platform given")]
  MissingTarget,

  #[error("no target architecture given")]
  MissingArch,

  #[error("cannot use docker and vagrant at the same time")]
  ConflictingAgents,

  #[error(transparent)]
  Platform(#[from] PlatformError),

  #[error(transparent)]
  Resolve(#[from] ResolveError),
}

/// Everything a caller can ask of one build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildParams {
  pub target: Option<String>,
  pub arch: Option<String>,
  pub vendor: Option<String>,
  /// Step tokens: atomic ids, aliases, composites and `~` anti-steps.
  pub steps: Vec<String>,
  /// Extra arguments per atomic step; a step with arguments is always planned.
  pub step_args: BTreeMap<Step, String>,
  /// Link the Node.js runtime into the native library.
  pub node_enabled: bool,
  /// Do not delete native libraries of other targets before packaging.
  pub keep_native_libs: bool,
  pub docker: bool,
  pub vagrant: bool,
  /// Base image or box passed to the sandbox.
  pub sys_image: Option<String>,
  /// Leave the sandbox running after the build.
  pub no_shutdown: bool,
  /// Pipe child output through this process's stdout.
  pub redirect_stdout: bool,
  /// Set by the instigating build when this process runs inside a sandbox.
  pub cross_agent: Option<AgentKind>,
}

impl BuildParams {
  pub fn new(target: impl Into<String>, arch: impl Into<String>) -> Self {
    Self {
      target: Some(target.into()),
      arch: Some(arch.into()),
      ..Self::default()
    }
  }

  pub fn with_steps<S: Into<String>>(mut self, steps: impl IntoIterator<Item = S>) -> Self {
    self.steps = steps.into_iter().map(Into::into).collect();
    self
  }

  /// The sandbox explicitly asked for with `docker`/`vagrant`.
  pub fn requested_agent(&self) -> Result<Option<AgentKind>, ParamsError> {
    match (self.docker, self.vagrant) {
      (true, true) => Err(ParamsError::ConflictingAgents),
      (true, false) => Ok(Some(AgentKind::Docker)),
      (false, true) => Ok(Some(AgentKind::Vagrant)),
      (false, false) => Ok(None),
    }
  }

  /// Validate the request and resolve its steps.
  ///
  /// Nothing runs before this succeeds; every error here is a configuration
  /// error.
  pub fn plan(&self, platforms: &PlatformRegistry, steps: &StepRegistry) -> Result<BuildPlan, ParamsError> {
    let agent = self.requested_agent()?;

    let target = platforms.lookup(self.target.as_deref().ok_or(ParamsError::MissingTarget)?)?;
    let arch: Arch = self.arch.as_deref().ok_or(ParamsError::MissingArch)?.parse()?;
    target.check_arch(arch)?;

    if let Some(vendor) = self.vendor.as_deref()
      && !target.vendors.contains(&vendor)
    {
      return Err(PlatformError::UnsupportedVendor {
        vendor: vendor.to_string(),
        target: target.os,
      }
      .into());
    }

    // Inside a sandbox the steps run locally, whatever the flags say.
    let delegate = match (agent, self.cross_agent) {
      (Some(kind), None) => Some(target.agent(kind).cloned().ok_or(PlatformError::NoAgent {
        target: target.os,
        agent: kind,
      })?),
      _ => None,
    };

    let tokens: Vec<&str> = if self.steps.is_empty() && self.step_args.is_empty() {
      DEFAULT_STEPS.to_vec()
    } else {
      self.steps.iter().map(String::as_str).collect()
    };
    let plan = steps.resolve_seeded(self.step_args.keys().copied(), &tokens, &Step::ALL)?;

    Ok(BuildPlan {
      target: target.os,
      arch,
      vendor: self.vendor.clone(),
      plan,
      delegate,
    })
  }
}

/// A validated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
  pub target: Os,
  pub arch: Arch,
  pub vendor: Option<String>,
  pub plan: ResolvedPlan,
  /// Sandbox to hand the whole plan to, `None` to run it here.
  pub delegate: Option<AgentConfig>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn plan(params: &BuildParams) -> Result<BuildPlan, ParamsError> {
    params.plan(&PlatformRegistry::standard(), &StepRegistry::standard())
  }

  #[test]
  fn empty_request_builds_everything() {
    let plan = plan(&BuildParams::new("linux", "x64")).unwrap();
    assert_eq!(plan.plan.steps(), &Step::ALL);
    assert_eq!(plan.delegate, None);
  }

  #[test]
  fn step_args_seed_the_plan() {
    let mut params = BuildParams::new("linux", "x64").with_steps(["j2v8java"]);
    params.step_args.insert(Step::J2v8Test, "-Dtest=NodeJSTest".to_string());

    let plan = plan(&params).unwrap();
    assert_eq!(plan.plan.steps(), &[Step::J2v8Java, Step::J2v8Test]);
  }

  #[test]
  fn step_args_alone_replace_the_default() {
    let mut params = BuildParams::new("linux", "x64");
    params.step_args.insert(Step::J2v8Test, "-Dtest=V8Test".to_string());

    let plan = plan(&params).unwrap();
    assert_eq!(plan.plan.steps(), &[Step::J2v8Test]);
  }

  #[test]
  fn missing_target_and_arch_are_reported() {
    assert!(matches!(plan(&BuildParams::default()), Err(ParamsError::MissingTarget)));

    let params = BuildParams {
      target: Some("linux".to_string()),
      ..BuildParams::default()
    };
    assert!(matches!(plan(&params), Err(ParamsError::MissingArch)));
  }

  #[test]
  fn docker_and_vagrant_conflict() {
    let params = BuildParams {
      docker: true,
      vagrant: true,
      ..BuildParams::new("windows", "x64")
    };
    let err = plan(&params).unwrap_err();
    assert!(matches!(err, ParamsError::ConflictingAgents));
    assert_eq!(err.to_string(), "cannot use docker and vagrant at the same time");
  }

  #[test]
  fn unsupported_arch_is_a_platform_error() {
    let err = plan(&BuildParams::new("linux", "arm")).unwrap_err();
    assert!(matches!(
      err,
      ParamsError::Platform(PlatformError::UnsupportedArch { arch: Arch::Arm, target: Os::Linux })
    ));
  }

  #[test]
  fn unknown_vendor_is_rejected() {
    let params = BuildParams {
      vendor: Some("gentoo".to_string()),
      ..BuildParams::new("linux", "x64")
    };
    assert!(matches!(
      plan(&params),
      Err(ParamsError::Platform(PlatformError::UnsupportedVendor { .. }))
    ));
  }

  #[test]
  fn docker_request_selects_agent_config() {
    let params = BuildParams {
      docker: true,
      ..BuildParams::new("linux", "x64")
    };
    let delegate = plan(&params).unwrap().delegate.unwrap();
    assert_eq!(delegate.kind, AgentKind::Docker);
    assert_eq!(delegate.build_cwd, "/j2v8");
  }

  #[test]
  fn target_without_agent_is_rejected() {
    let params = BuildParams {
      docker: true,
      ..BuildParams::new("macos", "x64")
    };
    assert!(matches!(
      plan(&params),
      Err(ParamsError::Platform(PlatformError::NoAgent {
        target: Os::MacOs,
        agent: AgentKind::Docker
      }))
    ));
  }

  #[test]
  fn agent_side_never_delegates_again() {
    let params = BuildParams {
      docker: true,
      cross_agent: Some(AgentKind::Docker),
      ..BuildParams::new("linux", "x64")
    };
    assert_eq!(plan(&params).unwrap().delegate, None);
  }

  #[test]
  fn unknown_step_is_named() {
    let params = BuildParams::new("linux", "x64").with_steps(["bogus-step"]);
    let err = plan(&params).unwrap_err();
    assert!(err.to_string().contains("bogus-step"));
  }

  #[test]
  fn deserializes_with_defaults() {
    let params: BuildParams = serde_json::from_str(
      r#"{ "target": "android", "arch": "arm", "docker": true, "step_args": { "j2v8test": "-x" } }"#,
    )
    .unwrap();

    assert_eq!(params.target.as_deref(), Some("android"));
    assert!(params.docker);
    assert!(!params.node_enabled);
    assert_eq!(params.step_args.get(&Step::J2v8Test).map(String::as_str), Some("-x"));
  }
}
