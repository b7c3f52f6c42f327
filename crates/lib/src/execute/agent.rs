//! The request an instigating build hands to the orchestrator inside a sandbox.
//!
//! It stays structured until the process boundary and is only rendered into
//! command-line arguments when the sandbox's command is assembled.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::params::BuildPlan;
use crate::platform::{AgentKind, Arch, Os};
use crate::steps::Step;

/// Quote style of the shell the rendered command line is embedded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
  Single,
  Double,
}

impl Quote {
  /// Docker wraps the agent command in `"..."` for posix containers; every
  /// other wrapper needs double quotes inside.
  pub fn for_agent(kind: AgentKind, target: Os) -> Self {
    match kind {
      AgentKind::Docker if !target.is_windows() => Quote::Single,
      _ => Quote::Double,
    }
  }

  fn quote(self, value: &str) -> String {
    match self {
      Quote::Single => format!("'{}'", value.replace('\'', r"'\''")),
      Quote::Double => format!("\"{}\"", value.replace('"', "\\\"")),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRequest {
  pub agent: AgentKind,
  pub target: Os,
  pub arch: Arch,
  pub vendor: Option<String>,
  pub node_enabled: bool,
  pub keep_native_libs: bool,
  /// Resolved atomic steps; the agent does not resolve tokens again.
  pub steps: Vec<Step>,
  pub step_args: BTreeMap<Step, String>,
}

impl AgentRequest {
  pub fn new(agent: AgentKind, plan: &BuildPlan, step_args: &BTreeMap<Step, String>) -> Self {
    Self {
      agent,
      target: plan.target,
      arch: plan.arch,
      vendor: plan.vendor.clone(),
      node_enabled: false,
      keep_native_libs: false,
      steps: plan.plan.steps().to_vec(),
      step_args: step_args
        .iter()
        .filter(|(step, _)| plan.plan.contains(**step))
        .map(|(step, args)| (*step, args.clone()))
        .collect(),
    }
  }

  pub fn node_enabled(mut self, enabled: bool) -> Self {
    self.node_enabled = enabled;
    self
  }

  pub fn keep_native_libs(mut self, keep: bool) -> Self {
    self.keep_native_libs = keep;
    self
  }

  /// Arguments of the `build` subcommand that reproduce this request.
  pub fn to_cli_args(&self, quote: Quote) -> Vec<String> {
    let mut args = vec![
      "build".to_string(),
      "--cross-agent".to_string(),
      self.agent.to_string(),
      "-t".to_string(),
      self.target.to_string(),
      "-a".to_string(),
      self.arch.to_string(),
    ];

    if let Some(vendor) = &self.vendor {
      args.push("-V".to_string());
      args.push(vendor.clone());
    }
    if self.node_enabled {
      args.push("--node-enabled".to_string());
    }
    if self.keep_native_libs {
      args.push("--keep-native-libs".to_string());
    }

    args.extend(self.steps.iter().map(|step| step.to_string()));
    args.extend(
      self
        .step_args
        .iter()
        .map(|(step, value)| format!("--{step}={}", quote.quote(value))),
    );

    args
  }

  /// The full shell command line, `program` followed by the arguments.
  pub fn to_command_line(&self, program: &str, quote: Quote) -> String {
    let mut line = program.trim_end().to_string();
    for arg in self.to_cli_args(quote) {
      line.push(' ');
      line.push_str(&arg);
    }
    line
  }
}
