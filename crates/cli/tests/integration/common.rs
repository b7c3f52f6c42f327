//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Isolated project checkout.
///
/// Each test gets its own temporary project root; the binary finds it through
/// `J2V8_BUILD_ROOT`.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// A project root without a Node.js checkout.
  pub fn empty() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// A project root with an (unbuilt) Node.js checkout.
  pub fn with_node() -> Self {
    let env = Self::empty();
    std::fs::create_dir_all(env.root().join("node")).unwrap();
    env
  }

  pub fn root(&self) -> PathBuf {
    let p = self.temp.path().to_path_buf();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  /// Write a file relative to the project root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.root().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn read_file(&self, relative_path: &str) -> String {
    std::fs::read_to_string(self.root().join(relative_path)).unwrap()
  }

  pub fn exists(&self, relative_path: &str) -> bool {
    self.root().join(relative_path).exists()
  }

  /// Modification time of a file relative to the project root.
  pub fn modified(&self, relative_path: &str) -> std::time::SystemTime {
    std::fs::metadata(self.root().join(relative_path))
      .and_then(|m| m.modified())
      .unwrap()
  }

  /// Get a pre-configured Command for the j2v8-build binary.
  pub fn build_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("j2v8-build");
    cmd.env("J2V8_BUILD_ROOT", self.root());
    cmd.env_remove("RUST_LOG");
    cmd
  }
}

/// Path of the live tag marker below a project root.
pub const NODE_TAG: &str = "node/out/j2v8.node.out";

/// Cache directory of `tag` below a project root.
pub fn cache_entry(root: &Path, tag: &str) -> PathBuf {
  root.join("node.out").join(tag)
}
