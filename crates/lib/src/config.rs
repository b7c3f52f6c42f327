//! Per-step build configuration.
//!
//! The orchestrator keeps one [`StepConfigBuilder`] per run and adjusts it
//! before each step (which step, its extra arguments, which steps already ran,
//! how to produce its commands). [`StepConfigBuilder::freeze`] then hands the
//! step a [`Frozen`] snapshot that later adjustments cannot reach.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::frozen::{Frozen, freeze};
use crate::placeholder::{self, Resolver, TemplateError, Var};
use crate::platform::{AgentConfig, AgentKind, Arch, Dialect, Os, Target};
use crate::settings::Settings;
use crate::steps::Step;

/// Produces the shell commands a build system executes for a step.
pub type CommandFn = Arc<dyn Fn(&StepConfig) -> Vec<String> + Send + Sync>;

/// Everything a step and its build system may read.
#[derive(Clone)]
pub struct StepConfig {
  /// Human readable name of what runs, used in logs and errors.
  pub label: String,
  /// The atomic step, `None` for a delegated run of a whole plan.
  pub step: Option<Step>,
  pub target: Os,
  pub arch: Arch,
  pub file_abi: String,
  pub vendor: Option<String>,
  pub node_enabled: bool,
  pub keep_native_libs: bool,
  pub no_shutdown: bool,
  pub redirect_stdout: bool,
  pub sys_image: Option<String>,
  /// Set when running inside a sandbox (agent side) or dispatching to one.
  pub cross_agent: Option<AgentKind>,
  pub build_cwd: Option<String>,
  pub host_cwd: Option<String>,
  pub pre_build_cmd: Option<String>,
  /// Extra arguments appended to the step's main tool invocation.
  pub args: Option<String>,
  /// Steps that already ran earlier in this run.
  pub prior_steps: Vec<Step>,
  pub node_version: String,
  pub j2v8_version: String,
  pub j2v8_full_version: String,
  /// Project root on the host, forward slashes.
  pub cwd: String,
  commands: CommandFn,
}

impl StepConfig {
  /// The shell commands for this step.
  pub fn commands(&self) -> Vec<String> {
    (self.commands)(self)
  }

  /// Substitute template tokens in `input`.
  pub fn inject_env(&self, input: &str) -> Result<String, TemplateError> {
    placeholder::substitute(input, self)
  }

  pub fn dialect(&self) -> Dialect {
    Dialect::for_target(self.target)
  }

  pub fn vendor(&self) -> Option<&str> {
    self.vendor.as_deref()
  }

  pub fn ran_before(&self, step: Step) -> bool {
    self.prior_steps.contains(&step)
  }
}

impl fmt::Debug for StepConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("StepConfig")
      .field("label", &self.label)
      .field("step", &self.step)
      .field("target", &self.target)
      .field("arch", &self.arch)
      .field("vendor", &self.vendor)
      .field("cross_agent", &self.cross_agent)
      .field("build_cwd", &self.build_cwd)
      .field("args", &self.args)
      .finish_non_exhaustive()
  }
}

impl Resolver for StepConfig {
  fn resolve_var(&self, var: Var) -> Result<Cow<'_, str>, TemplateError> {
    Ok(match var {
      Var::NodeVersion => Cow::Borrowed(&self.node_version),
      Var::J2v8Version => Cow::Borrowed(&self.j2v8_version),
      Var::J2v8FullVersion => Cow::Borrowed(&self.j2v8_full_version),
      Var::Cwd => Cow::Borrowed(&self.cwd),
      Var::Platform => Cow::Borrowed(self.target.as_str()),
      Var::Arch => Cow::Borrowed(self.arch.as_str()),
      Var::FileAbi => Cow::Borrowed(&self.file_abi),
      Var::LibExt => Cow::Borrowed(self.target.lib_ext()),
      Var::BuildCwd => match &self.build_cwd {
        Some(dir) => Cow::Owned(placeholder::substitute(dir, &Nested(self))?),
        None => Cow::Borrowed(&self.cwd),
      },
      Var::HostCwd => match &self.host_cwd {
        Some(dir) => Cow::Owned(placeholder::substitute(dir, &Nested(self))?),
        None => Cow::Borrowed(""),
      },
    })
  }

  fn resolve_vendor(&self) -> Option<&str> {
    self.vendor()
  }
}

/// Resolves the tokens inside a working-directory template, which may not
/// refer to working directories themselves.
struct Nested<'a>(&'a StepConfig);

impl Resolver for Nested<'_> {
  fn resolve_var(&self, var: Var) -> Result<Cow<'_, str>, TemplateError> {
    match var {
      Var::BuildCwd | Var::HostCwd => Err(TemplateError::Unresolved(var)),
      _ => self.0.resolve_var(var),
    }
  }

  fn resolve_vendor(&self) -> Option<&str> {
    self.0.vendor()
  }
}

/// The mutable original a run's step configurations are frozen from.
#[derive(Clone)]
pub struct StepConfigBuilder {
  config: StepConfig,
}

impl StepConfigBuilder {
  pub fn new(settings: &Settings, target: &Target, arch: Arch) -> Self {
    Self {
      config: StepConfig {
        label: String::new(),
        step: None,
        target: target.os,
        arch,
        file_abi: target.file_abi(arch).to_string(),
        vendor: None,
        node_enabled: false,
        keep_native_libs: false,
        no_shutdown: false,
        redirect_stdout: false,
        sys_image: None,
        cross_agent: None,
        build_cwd: None,
        host_cwd: None,
        pre_build_cmd: None,
        args: None,
        prior_steps: Vec::new(),
        node_version: settings.node_version.clone(),
        j2v8_version: settings.j2v8_version.clone(),
        j2v8_full_version: settings.j2v8_full_version(),
        cwd: settings.root_for_shell(),
        commands: Arc::new(|_| Vec::new()),
      },
    }
  }

  pub fn label(&mut self, label: impl Into<String>) -> &mut Self {
    self.config.label = label.into();
    self
  }

  pub fn step(&mut self, step: Option<Step>) -> &mut Self {
    self.config.step = step;
    self
  }

  pub fn vendor(&mut self, vendor: Option<String>) -> &mut Self {
    self.config.vendor = vendor;
    self
  }

  pub fn node_enabled(&mut self, enabled: bool) -> &mut Self {
    self.config.node_enabled = enabled;
    self
  }

  pub fn keep_native_libs(&mut self, keep: bool) -> &mut Self {
    self.config.keep_native_libs = keep;
    self
  }

  pub fn no_shutdown(&mut self, no_shutdown: bool) -> &mut Self {
    self.config.no_shutdown = no_shutdown;
    self
  }

  pub fn redirect_stdout(&mut self, redirect: bool) -> &mut Self {
    self.config.redirect_stdout = redirect;
    self
  }

  pub fn sys_image(&mut self, image: Option<String>) -> &mut Self {
    self.config.sys_image = image;
    self
  }

  pub fn cross_agent(&mut self, agent: Option<AgentKind>) -> &mut Self {
    self.config.cross_agent = agent;
    self
  }

  /// Take working directories and the pre-build command from a sandbox.
  pub fn agent(&mut self, agent: &AgentConfig) -> &mut Self {
    self.config.host_cwd = Some(agent.host_cwd.clone());
    self.config.build_cwd = Some(agent.build_cwd.clone());
    self.config.pre_build_cmd = agent.pre_build_cmd.clone();
    self
  }

  pub fn build_cwd(&mut self, dir: Option<String>) -> &mut Self {
    self.config.build_cwd = dir;
    self
  }

  pub fn args(&mut self, args: Option<String>) -> &mut Self {
    self.config.args = args;
    self
  }

  pub fn completed(&mut self, step: Step) -> &mut Self {
    self.config.prior_steps.push(step);
    self
  }

  pub fn commands(&mut self, commands: CommandFn) -> &mut Self {
    self.config.commands = commands;
    self
  }

  /// Snapshot the current state.
  pub fn freeze(&self) -> Frozen<StepConfig> {
    freeze(self.config.clone())
  }
}
