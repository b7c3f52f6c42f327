//! Types for running build steps.
//!
//! This module defines the error type, the lifecycle phases every step goes
//! through and the report a finished build returns.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::cache::CacheOutcome;
use crate::placeholder::TemplateError;
use crate::platform::AgentKind;
use crate::steps::{ResolvedPlan, Step};

/// Errors that can occur while a step runs.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// Command exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {cmd}")]
  CmdFailed { cmd: String, code: Option<i32> },

  /// Command could not be started.
  #[error("failed to spawn '{cmd}': {source}")]
  Spawn {
    cmd: String,
    #[source]
    source: std::io::Error,
  },

  /// A build system's prerequisite tool is missing or misconfigured.
  #[error("{system} is not usable: {message}")]
  HealthCheck { system: String, message: String },

  /// A command template could not be resolved.
  #[error("template error: {0}")]
  Template(#[from] TemplateError),

  /// I/O error during execution.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// A lifecycle phase of a step failed.
  #[error("{phase} failed for {label}: {source}")]
  PhaseFailed {
    phase: Phase,
    label: String,
    #[source]
    source: Box<ExecuteError>,
  },
}

impl ExecuteError {
  /// The innermost error, past any phase wrappers.
  pub fn root(&self) -> &ExecuteError {
    match self {
      ExecuteError::PhaseFailed { source, .. } => source.root(),
      other => other,
    }
  }

  pub fn is_health_check(&self) -> bool {
    matches!(self.root(), ExecuteError::HealthCheck { .. })
  }
}

/// Lifecycle states of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
  HealthCheck,
  Clean,
  PreBuild,
  Exec,
  PostBuild,
  Done,
  Failed,
}

impl Phase {
  /// Successor after a successful phase; terminal states stay put.
  pub fn next(self) -> Phase {
    match self {
      Phase::HealthCheck => Phase::Clean,
      Phase::Clean => Phase::PreBuild,
      Phase::PreBuild => Phase::Exec,
      Phase::Exec => Phase::PostBuild,
      Phase::PostBuild => Phase::Done,
      Phase::Done => Phase::Done,
      Phase::Failed => Phase::Failed,
    }
  }

  pub fn is_terminal(self) -> bool {
    matches!(self, Phase::Done | Phase::Failed)
  }
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Phase::HealthCheck => "health check",
      Phase::Clean => "clean",
      Phase::PreBuild => "pre-build",
      Phase::Exec => "exec",
      Phase::PostBuild => "post-build",
      Phase::Done => "done",
      Phase::Failed => "failed",
    };
    write!(f, "{name}")
  }
}

/// A planned step the target has no definition for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedStep {
  pub step: Step,
  pub reason: String,
}

/// Outcome of a finished build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
  pub target: String,
  pub arch: String,
  pub vendor: Option<String>,
  pub plan: ResolvedPlan,
  /// Steps that ran in this process; empty when the plan was delegated,
  /// since the agent reports its own runs and skips.
  pub executed: Vec<Step>,
  pub skipped: Vec<SkippedStep>,
  /// Sandbox the whole plan was handed to, if any.
  pub delegated: Option<AgentKind>,
  /// Result of the runtime output reconciliation, if it ran.
  pub cache: Option<CacheOutcome>,
  #[serde(serialize_with = "serialize_duration")]
  pub elapsed: Duration,
}

fn serialize_duration<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.serialize_f64(duration.as_secs_f64())
}
