//! Atomic build steps and their canonical order.
//!
//! The declaration order of [`Step`] is the master sequence every plan is
//! filtered into: the runtime is built before the bridge code that links
//! against it, and packaging runs after the native library exists.

pub mod resolve;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use resolve::{CatalogEntry, ResolveError, ResolvedPlan, StepKind, StepRegistry};

/// An indivisible build action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
  NodeJs,
  J2v8Cmake,
  J2v8Jni,
  J2v8Cpp,
  J2v8Optimize,
  J2v8Java,
  J2v8Test,
}

impl Step {
  /// Canonical execution order.
  pub const ALL: [Step; 7] = [
    Step::NodeJs,
    Step::J2v8Cmake,
    Step::J2v8Jni,
    Step::J2v8Cpp,
    Step::J2v8Optimize,
    Step::J2v8Java,
    Step::J2v8Test,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Step::NodeJs => "nodejs",
      Step::J2v8Cmake => "j2v8cmake",
      Step::J2v8Jni => "j2v8jni",
      Step::J2v8Cpp => "j2v8cpp",
      Step::J2v8Optimize => "j2v8optimize",
      Step::J2v8Java => "j2v8java",
      Step::J2v8Test => "j2v8test",
    }
  }

  pub fn help(&self) -> &'static str {
    match self {
      Step::NodeJs => "Builds the Node.js runtime as a static library",
      Step::J2v8Cmake => "Uses CMake to generate the native J2V8 build files",
      Step::J2v8Jni => "Generates the JNI headers from the compiled Java classes",
      Step::J2v8Cpp => "Compiles the native J2V8 library",
      Step::J2v8Optimize => "Strips and hardens the native J2V8 library",
      Step::J2v8Java => "Packages the native library into the Java artifact",
      Step::J2v8Test => "Runs the Java test suite against the packaged artifact",
    }
  }

  /// Position in the canonical order.
  pub fn index(&self) -> usize {
    *self as usize
  }
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Step {
  type Err = ResolveError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Step::ALL
      .into_iter()
      .find(|step| step.as_str() == s)
      .ok_or_else(|| ResolveError::UnknownStep(s.to_string()))
  }
}
