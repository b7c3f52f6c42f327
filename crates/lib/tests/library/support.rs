use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use j2v8build_lib::execute::{CommandRunner, ExecuteError, Teardown};

/// Records every command and succeeds, unless the command starts with a
/// prefix registered through [`Recorder::failing`].
#[derive(Debug, Clone, Default)]
pub struct Recorder {
  commands: Arc<Mutex<Vec<String>>>,
  failing: Vec<String>,
}

impl Recorder {
  pub fn failing(prefix: &str) -> Self {
    Self {
      failing: vec![prefix.to_string()],
      ..Self::default()
    }
  }

  pub fn commands(&self) -> Vec<String> {
    self.commands.lock().unwrap().clone()
  }

  fn record(&self, cmd: &str) -> Result<(), ExecuteError> {
    self.commands.lock().unwrap().push(cmd.to_string());
    if self.failing.iter().any(|prefix| cmd.starts_with(prefix.as_str())) {
      return Err(ExecuteError::CmdFailed {
        cmd: cmd.to_string(),
        code: Some(2),
      });
    }
    Ok(())
  }
}

impl CommandRunner for Recorder {
  async fn run(&self, cmd: &str, _cwd: Option<&Path>) -> Result<(), ExecuteError> {
    self.record(cmd)
  }

  async fn capture(&self, cmd: &str, _cwd: Option<&Path>) -> Result<String, ExecuteError> {
    self.record(cmd).map(|()| String::new())
  }

  fn teardown(&self, cmd: String, _cwd: Option<PathBuf>) -> Teardown {
    let commands = Arc::clone(&self.commands);
    Teardown::new(move || commands.lock().unwrap().push(format!("teardown: {cmd}")))
  }
}
