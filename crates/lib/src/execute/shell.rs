//! Spawning shell commands.
//!
//! Build systems never start processes themselves; they go through a
//! [`CommandRunner`], so the exact command lines they issue can be observed
//! without the sandboxing tools installed.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::execute::types::ExecuteError;

pub trait CommandRunner: Send + Sync {
  /// Run `cmd` in the host shell, failing on a non-zero exit.
  fn run(&self, cmd: &str, cwd: Option<&Path>) -> impl Future<Output = Result<(), ExecuteError>> + Send;

  /// Run `cmd` and return its trimmed stdout.
  fn capture(&self, cmd: &str, cwd: Option<&Path>) -> impl Future<Output = Result<String, ExecuteError>> + Send;

  /// A best-effort command to run when the returned guard is dropped.
  fn teardown(&self, cmd: String, cwd: Option<PathBuf>) -> Teardown;
}

/// Runs its action once, when dropped, unless disarmed.
///
/// The guard lives as long as the build that armed it, so the action also runs
/// when the build fails, panics or is cancelled.
#[must_use = "the teardown runs as soon as the guard is dropped"]
pub struct Teardown {
  action: Option<Box<dyn FnOnce() + Send>>,
}

impl Teardown {
  pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
    Self {
      action: Some(Box::new(action)),
    }
  }

  /// Cancel the action.
  pub fn disarm(mut self) {
    self.action = None;
  }
}

impl Drop for Teardown {
  fn drop(&mut self) {
    if let Some(action) = self.action.take() {
      action();
    }
  }
}

impl std::fmt::Debug for Teardown {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Teardown").field("armed", &self.action.is_some()).finish()
  }
}

/// Runs commands through the system shell.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
  /// Forward child output line by line through our stdout.
  stream: bool,
}

impl ShellRunner {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn streaming(stream: bool) -> Self {
    Self { stream }
  }

  fn command(cmd: &str, cwd: Option<&Path>) -> Command {
    let (shell, flag) = get_shell();
    let mut command = Command::new(shell);
    command.arg(flag).arg(cmd).kill_on_drop(true);
    if let Some(dir) = cwd {
      command.current_dir(dir);
    }
    command
  }
}

impl CommandRunner for ShellRunner {
  async fn run(&self, cmd: &str, cwd: Option<&Path>) -> Result<(), ExecuteError> {
    info!(cmd = %cmd, "executing command");
    debug!(working_dir = ?cwd, stream = self.stream, "spawning process");

    let mut command = Self::command(cmd, cwd);

    let status = if self.stream {
      command.stdout(Stdio::piped()).stderr(Stdio::piped());
      let mut child = command.spawn().map_err(|source| spawn_error(cmd, source))?;

      tokio::join!(forward_lines(child.stdout.take()), forward_lines(child.stderr.take()));
      child.wait().await?
    } else {
      let mut child = command.spawn().map_err(|source| spawn_error(cmd, source))?;
      child.wait().await?
    };

    if !status.success() {
      return Err(ExecuteError::CmdFailed {
        cmd: cmd.to_string(),
        code: status.code(),
      });
    }

    Ok(())
  }

  async fn capture(&self, cmd: &str, cwd: Option<&Path>) -> Result<String, ExecuteError> {
    debug!(cmd = %cmd, "capturing command output");

    let output = Self::command(cmd, cwd)
      .stdin(Stdio::null())
      .output()
      .await
      .map_err(|source| spawn_error(cmd, source))?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if !stderr.is_empty() {
        debug!(stderr = %stderr, "command stderr");
      }
      return Err(ExecuteError::CmdFailed {
        cmd: cmd.to_string(),
        code: output.status.code(),
      });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  fn teardown(&self, cmd: String, cwd: Option<PathBuf>) -> Teardown {
    Teardown::new(move || {
      info!(cmd = %cmd, "running teardown");
      let (shell, flag) = get_shell();
      let mut command = std::process::Command::new(shell);
      command.arg(flag).arg(&cmd);
      if let Some(dir) = &cwd {
        command.current_dir(dir);
      }
      match command.status() {
        Ok(status) if status.success() => {}
        Ok(status) => warn!(cmd = %cmd, code = ?status.code(), "teardown command failed"),
        Err(err) => warn!(cmd = %cmd, error = %err, "teardown command could not be started"),
      }
    })
  }
}

fn spawn_error(cmd: &str, source: std::io::Error) -> ExecuteError {
  ExecuteError::Spawn {
    cmd: cmd.to_string(),
    source,
  }
}

/// Echo every line of a child stream to our stdout as it arrives.
async fn forward_lines<R: AsyncRead + Unpin>(stream: Option<R>) {
  let Some(stream) = stream else {
    return;
  };
  let mut lines = BufReader::new(stream).lines();
  while let Ok(Some(line)) = lines.next_line().await {
    println!("{line}");
  }
}

/// Get the shell command and arguments for the host.
///
/// Step commands chain with `&&` and `cd`, which both `sh` and `cmd.exe`
/// understand.
fn get_shell() -> (&'static str, &'static str) {
  #[cfg(unix)]
  {
    ("/bin/sh", "-c")
  }

  #[cfg(windows)]
  {
    ("cmd.exe", "/C")
  }
}
