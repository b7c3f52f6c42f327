//! Static description of the targets the build can produce.
//!
//! A [`Target`] ties an operating system family to the architectures it
//! supports, the atomic steps it knows how to run and the sandboxes it can be
//! cross-compiled in. The registry is assembled once at startup and only read
//! afterwards.

pub mod arch;
pub mod dialect;
pub mod os;
pub mod targets;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::StepConfig;
use crate::steps::Step;

pub use arch::Arch;
pub use dialect::Dialect;
pub use os::Os;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
  #[error("unrecognized target platform: {0}")]
  UnknownTarget(String),

  #[error("unrecognized architecture: {0}")]
  UnknownArch(String),

  #[error("unsupported architecture '{arch}' for target platform '{target}'")]
  UnsupportedArch { arch: Arch, target: Os },

  #[error("vendor '{vendor}' is not available for target platform '{target}'")]
  UnsupportedVendor { vendor: String, target: Os },

  #[error("target '{target}' cannot be cross-compiled with '{agent}'")]
  NoAgent { target: Os, agent: AgentKind },

  #[error("unrecognized cross-compile agent: {0}")]
  UnknownAgent(String),
}

/// Sandboxing technology a build can be delegated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
  Docker,
  Vagrant,
}

impl AgentKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Docker => "docker",
      Self::Vagrant => "vagrant",
    }
  }
}

impl fmt::Display for AgentKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for AgentKind {
  type Err = PlatformError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "docker" => Ok(Self::Docker),
      "vagrant" => Ok(Self::Vagrant),
      _ => Err(PlatformError::UnknownAgent(s.to_string())),
    }
  }
}

/// Where a delegated build lives on each side of the sandbox boundary.
///
/// Both directories are command templates, e.g. `$CWD/docker`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentConfig {
  pub kind: AgentKind,
  /// Host directory the sandbox is prepared from.
  pub host_cwd: String,
  /// Project root as seen from inside the sandbox.
  pub build_cwd: String,
  /// Host command run before the sandbox starts.
  pub pre_build_cmd: Option<String>,
}

impl AgentConfig {
  pub fn new(kind: AgentKind, host_cwd: impl Into<String>, build_cwd: impl Into<String>) -> Self {
    Self {
      kind,
      host_cwd: host_cwd.into(),
      build_cwd: build_cwd.into(),
      pre_build_cmd: None,
    }
  }

  pub fn with_pre_build_cmd(mut self, cmd: impl Into<String>) -> Self {
    self.pre_build_cmd = Some(cmd.into());
    self
  }
}

/// Produces the shell commands of one atomic step for a frozen configuration.
pub type StepFn = fn(&StepConfig) -> Vec<String>;

#[derive(Debug, Clone)]
pub struct Target {
  pub os: Os,
  pub architectures: Vec<Arch>,
  pub vendors: Vec<&'static str>,
  file_abis: BTreeMap<Arch, &'static str>,
  steps: BTreeMap<Step, StepFn>,
  agents: BTreeMap<AgentKind, AgentConfig>,
}

impl Target {
  pub fn new(os: Os, architectures: impl IntoIterator<Item = Arch>) -> Self {
    Self {
      os,
      architectures: architectures.into_iter().collect(),
      vendors: Vec::new(),
      file_abis: BTreeMap::new(),
      steps: BTreeMap::new(),
      agents: BTreeMap::new(),
    }
  }

  pub fn with_vendors(mut self, vendors: impl IntoIterator<Item = &'static str>) -> Self {
    self.vendors = vendors.into_iter().collect();
    self
  }

  pub fn with_file_abi(mut self, arch: Arch, abi: &'static str) -> Self {
    self.file_abis.insert(arch, abi);
    self
  }

  pub fn with_step(mut self, step: Step, build: StepFn) -> Self {
    self.steps.insert(step, build);
    self
  }

  pub fn with_agent(mut self, agent: AgentConfig) -> Self {
    self.agents.insert(agent.kind, agent);
    self
  }

  pub fn name(&self) -> &'static str {
    self.os.as_str()
  }

  pub fn supports(&self, arch: Arch) -> bool {
    self.architectures.contains(&arch)
  }

  /// ABI label used in artifact names; the architecture id when unmapped.
  pub fn file_abi(&self, arch: Arch) -> &'static str {
    self.file_abis.get(&arch).copied().unwrap_or(arch.as_str())
  }

  pub fn step(&self, step: Step) -> Option<StepFn> {
    self.steps.get(&step).copied()
  }

  /// Atomic steps this target defines, in canonical order.
  pub fn steps(&self) -> impl Iterator<Item = Step> + '_ {
    self.steps.keys().copied()
  }

  pub fn agent(&self, kind: AgentKind) -> Option<&AgentConfig> {
    self.agents.get(&kind)
  }

  pub fn agents(&self) -> impl Iterator<Item = &AgentConfig> {
    self.agents.values()
  }

  /// Reject architectures this target does not build for.
  pub fn check_arch(&self, arch: Arch) -> Result<(), PlatformError> {
    if self.supports(arch) {
      Ok(())
    } else {
      Err(PlatformError::UnsupportedArch { arch, target: self.os })
    }
  }
}

/// All known targets, keyed by operating system family.
#[derive(Debug, Clone)]
pub struct PlatformRegistry {
  targets: BTreeMap<Os, Target>,
}

impl PlatformRegistry {
  pub fn empty() -> Self {
    Self {
      targets: BTreeMap::new(),
    }
  }

  /// The android, linux, macos and windows targets.
  pub fn standard() -> Self {
    let mut registry = Self::empty();
    registry.register(targets::android::target());
    registry.register(targets::linux::target());
    registry.register(targets::macos::target());
    registry.register(targets::windows::target());
    registry
  }

  /// Add or replace a target.
  pub fn register(&mut self, target: Target) {
    self.targets.insert(target.os, target);
  }

  pub fn get(&self, os: Os) -> Result<&Target, PlatformError> {
    self
      .targets
      .get(&os)
      .ok_or_else(|| PlatformError::UnknownTarget(os.to_string()))
  }

  /// Look up a target by its command-line id.
  pub fn lookup(&self, id: &str) -> Result<&Target, PlatformError> {
    self.get(id.parse()?)
  }

  pub fn iter(&self) -> impl Iterator<Item = &Target> {
    self.targets.values()
  }
}

impl Default for PlatformRegistry {
  fn default() -> Self {
    Self::standard()
  }
}
