use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::PlatformError;

/// Operating system families the build can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
  Android,
  Linux,
  MacOs,
  Windows,
}

impl Os {
  pub const ALL: [Os; 4] = [Os::Android, Os::Linux, Os::MacOs, Os::Windows];

  /// Detect the host operating system at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "android" => Some(Self::Android),
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::MacOs),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  /// Returns the lowercase identifier, also used as `$PLATFORM`
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Android => "android",
      Self::Linux => "linux",
      Self::MacOs => "macos",
      Self::Windows => "windows",
    }
  }

  /// File extension of native shared libraries, used as `$LIB_EXT`
  pub fn lib_ext(&self) -> &'static str {
    match self {
      Self::Windows => "dll",
      Self::MacOs => "dylib",
      Self::Android | Self::Linux => "so",
    }
  }

  pub fn is_windows(&self) -> bool {
    matches!(self, Self::Windows)
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Os {
  type Err = PlatformError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "android" => Ok(Self::Android),
      "linux" => Ok(Self::Linux),
      "macos" => Ok(Self::MacOs),
      "windows" | "win32" => Ok(Self::Windows),
      _ => Err(PlatformError::UnknownTarget(s.to_string())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn win32_is_accepted_as_windows() {
    assert_eq!("win32".parse::<Os>().unwrap(), Os::Windows);
    assert_eq!(Os::Windows.as_str(), "windows");
  }

  #[test]
  fn lib_ext_per_family() {
    assert_eq!(Os::Linux.lib_ext(), "so");
    assert_eq!(Os::Android.lib_ext(), "so");
    assert_eq!(Os::MacOs.lib_ext(), "dylib");
    assert_eq!(Os::Windows.lib_ext(), "dll");
  }

  #[test]
  fn unknown_target_is_named() {
    let err = "solaris".parse::<Os>().unwrap_err();
    assert_eq!(err.to_string(), "unrecognized target platform: solaris");
  }
}
