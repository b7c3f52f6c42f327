//! Version strings and invocation settings consumed by the build.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::consts::{
  DEFAULT_AGENT_COMMAND, DEFAULT_J2V8_VERSION, DEFAULT_NODE_VERSION, ENV_AGENT_COMMAND, ENV_BUILD_ROOT,
  ENV_J2V8_VERSION, ENV_NODE_VERSION, J2V8_VERSION_SUFFIX,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
  pub node_version: String,
  pub j2v8_version: String,
  pub j2v8_version_suffix: String,
  /// Project root on the host; `$CWD` in command templates.
  pub project_root: PathBuf,
  /// Program (plus leading arguments) that runs this orchestrator inside a sandbox.
  pub agent_command: String,
}

impl Settings {
  /// Compiled-in defaults rooted at `project_root`.
  pub fn new(project_root: impl Into<PathBuf>) -> Self {
    Self {
      node_version: DEFAULT_NODE_VERSION.to_string(),
      j2v8_version: DEFAULT_J2V8_VERSION.to_string(),
      j2v8_version_suffix: J2V8_VERSION_SUFFIX.to_string(),
      project_root: project_root.into(),
      agent_command: DEFAULT_AGENT_COMMAND.to_string(),
    }
  }

  /// Defaults overridden by `J2V8_BUILD_ROOT`, `J2V8_BUILD_AGENT_COMMAND`,
  /// `J2V8_NODE_VERSION` and `J2V8_VERSION`.
  ///
  /// The project root falls back to the current directory.
  pub fn from_env() -> io::Result<Self> {
    let root = match std::env::var_os(ENV_BUILD_ROOT) {
      Some(root) => PathBuf::from(root),
      None => std::env::current_dir()?,
    };
    let root = dunce::canonicalize(&root).unwrap_or(root);

    let mut settings = Self::new(root);

    if let Ok(command) = std::env::var(ENV_AGENT_COMMAND) {
      settings.agent_command = command;
    }
    if let Ok(version) = std::env::var(ENV_NODE_VERSION) {
      settings.node_version = version;
    }
    if let Ok(version) = std::env::var(ENV_J2V8_VERSION) {
      settings.j2v8_version = version;
    }

    Ok(settings)
  }

  pub fn j2v8_full_version(&self) -> String {
    format!("{}{}", self.j2v8_version, self.j2v8_version_suffix)
  }

  pub fn project_root(&self) -> &Path {
    &self.project_root
  }

  /// Project root with forward slashes, as it appears in shell commands.
  pub fn root_for_shell(&self) -> String {
    self.project_root.to_string_lossy().replace('\\', "/")
  }
}
