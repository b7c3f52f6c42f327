//! Shell command spellings for the two command interpreters a step can run in.

use super::Os;

/// Command interpreter flavour of the build shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
  /// `sh`/`bash`
  Posix,
  /// `cmd.exe`
  Windows,
}

impl Dialect {
  pub fn for_target(os: Os) -> Self {
    if os.is_windows() { Self::Windows } else { Self::Posix }
  }

  /// Create a directory and its parents, succeeding if it exists.
  pub fn mkdir(&self, path: &str) -> String {
    match self {
      Self::Posix => format!("mkdir -p {path}"),
      Self::Windows => {
        let path = native_path(path);
        format!("if not exist \"{path}\" mkdir \"{path}\"")
      }
    }
  }

  /// Remove files or directories, ignoring the ones that do not exist.
  pub fn rm(&self, paths: &[&str]) -> String {
    match self {
      Self::Posix => format!("rm -rf {}", paths.join(" ")),
      Self::Windows => paths
        .iter()
        .map(|path| {
          let is_dir = path.ends_with('/');
          let path = native_path(path);
          if is_dir {
            format!("if exist \"{path}\" rmdir /S /Q \"{path}\"")
          } else {
            format!("if exist \"{path}\" del /F /Q \"{path}\"")
          }
        })
        .collect::<Vec<_>>()
        .join(" && "),
    }
  }

  pub fn cp(&self, from: &str, to: &str) -> String {
    match self {
      Self::Posix => format!("cp {from} {to}"),
      Self::Windows => format!("copy /Y \"{}\" \"{}\"", native_path(from), native_path(to)),
    }
  }

  pub fn set_env(&self, name: &str, value: &str) -> String {
    match self {
      Self::Posix => format!("export {name}=\"{value}\""),
      Self::Windows => format!("set \"{name}={value}\""),
    }
  }
}

/// Backslash separators without a trailing one, which `cmd.exe` would read as
/// an escaped closing quote.
fn native_path(path: &str) -> String {
  path.replace('/', "\\").trim_end_matches('\\').to_string()
}
