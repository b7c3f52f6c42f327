use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::PlatformError;

/// Target CPU architecture identifiers accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
  X86,
  X64,
  X86_64,
  Arm,
  Arm64,
}

impl Arch {
  pub const ALL: [Arch; 5] = [Arch::X86, Arch::X64, Arch::X86_64, Arch::Arm, Arch::Arm64];

  /// Returns the identifier used in commands and cache tags
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::X86 => "x86",
      Self::X64 => "x64",
      Self::X86_64 => "x86_64",
      Self::Arm => "arm",
      Self::Arm64 => "arm64",
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Arch {
  type Err = PlatformError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Arch::ALL
      .into_iter()
      .find(|arch| arch.as_str() == s)
      .ok_or_else(|| PlatformError::UnknownArch(s.to_string()))
  }
}
