//! Environment template parsing and substitution for build command strings.
//!
//! Step definitions and agent configurations describe commands and paths with
//! `$NAME` tokens that are only known once a step's configuration is frozen
//! (platform, architecture, working directories, versions). This module parses
//! such strings into segments and substitutes resolved values.
//!
//! # Tokens
//!
//! - `$NODE_VERSION`, `$J2V8_VERSION`, `$J2V8_FULL_VERSION` - version strings
//! - `$BUILD_CWD` - working directory the build runs in (host or sandbox)
//! - `$HOST_CWD` - host-side working directory of a delegated build
//! - `$CWD` - project root on the host
//! - `$PLATFORM`, `$ARCH`, `$FILE_ABI`, `$LIB_EXT` - target description
//! - `$VENDOR` - optional vendor, see below
//!
//! Tokens match by longest known name, so `$PLATFORM_$FILE_ABI` expands both.
//!
//! # Shell Variables
//!
//! Any `$NAME` that is not a known token passes through unchanged, so shell
//! variables like `$PATH` and `$JAVA_HOME` keep working.
//!
//! # Vendor Separators
//!
//! The vendor is optional. A `.` or `-` directly before `$VENDOR` (or, when
//! there is none, directly after it) belongs to the vendor and disappears
//! together with it:
//!
//! ```
//! use j2v8build_lib::placeholder::{parse, Segment, VendorForm, Var};
//!
//! let segments = parse("libj2v8-$VENDOR-$PLATFORM.so");
//! assert_eq!(segments, vec![
//!     Segment::Literal("libj2v8".to_string()),
//!     Segment::Vendor(VendorForm::Leading('-')),
//!     Segment::Literal("-".to_string()),
//!     Segment::Var(Var::Platform),
//!     Segment::Literal(".so".to_string()),
//! ]);
//! ```

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

/// A known template token other than the vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Var {
  NodeVersion,
  J2v8Version,
  J2v8FullVersion,
  BuildCwd,
  HostCwd,
  Cwd,
  Platform,
  Arch,
  FileAbi,
  LibExt,
}

impl Var {
  pub const ALL: [Var; 10] = [
    Var::NodeVersion,
    Var::J2v8Version,
    Var::J2v8FullVersion,
    Var::BuildCwd,
    Var::HostCwd,
    Var::Cwd,
    Var::Platform,
    Var::Arch,
    Var::FileAbi,
    Var::LibExt,
  ];

  /// Token name without the leading `$`.
  pub fn name(self) -> &'static str {
    match self {
      Var::NodeVersion => "NODE_VERSION",
      Var::J2v8Version => "J2V8_VERSION",
      Var::J2v8FullVersion => "J2V8_FULL_VERSION",
      Var::BuildCwd => "BUILD_CWD",
      Var::HostCwd => "HOST_CWD",
      Var::Cwd => "CWD",
      Var::Platform => "PLATFORM",
      Var::Arch => "ARCH",
      Var::FileAbi => "FILE_ABI",
      Var::LibExt => "LIB_EXT",
    }
  }

  /// Longest known token that `text` starts with.
  fn longest_prefix(text: &str) -> Option<Var> {
    Var::ALL
      .into_iter()
      .filter(|var| text.starts_with(var.name()))
      .max_by_key(|var| var.name().len())
  }
}

impl fmt::Display for Var {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "${}", self.name())
  }
}

const VENDOR_TOKEN: &str = "$VENDOR";

/// How a `$VENDOR` occurrence carries its separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorForm {
  /// `$VENDOR` with no adjacent separator.
  Bare,
  /// `.$VENDOR` or `-$VENDOR`
  Leading(char),
  /// `$VENDOR.` or `$VENDOR-`
  Trailing(char),
}

/// A segment of parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// Literal text, including unknown `$NAME` shell variables.
  Literal(String),

  /// A known token to be resolved.
  Var(Var),

  /// The optional vendor and its separator.
  Vendor(VendorForm),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
  #[error("template token {0} has no value in this context")]
  Unresolved(Var),
}

/// Trait for resolving token values from a build configuration.
pub trait Resolver {
  /// Resolve a known token.
  fn resolve_var(&self, var: Var) -> Result<Cow<'_, str>, TemplateError>;

  /// The vendor, if the build has one.
  fn resolve_vendor(&self) -> Option<&str>;
}

fn vendor_separator(ch: char) -> Option<char> {
  matches!(ch, '.' | '-').then_some(ch)
}

/// Parse a command string into segments.
///
/// Parsing never fails: anything that is not a known token is literal text.
pub fn parse(input: &str) -> Vec<Segment> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut rest = input;

  let flush = |literal: &mut String, segments: &mut Vec<Segment>| {
    if !literal.is_empty() {
      segments.push(Segment::Literal(std::mem::take(literal)));
    }
  };

  while let Some(ch) = rest.chars().next() {
    // Leading separators bind first: `-$VENDOR-x` keeps the trailing `-` literal.
    if let Some(sep) = vendor_separator(ch) {
      if rest[1..].starts_with(VENDOR_TOKEN) {
        flush(&mut literal, &mut segments);
        segments.push(Segment::Vendor(VendorForm::Leading(sep)));
        rest = &rest[1 + VENDOR_TOKEN.len()..];
        continue;
      }
    }

    if ch == '$' {
      if let Some(after) = rest.strip_prefix(VENDOR_TOKEN) {
        flush(&mut literal, &mut segments);
        match after.chars().next().and_then(vendor_separator) {
          Some(sep) => {
            segments.push(Segment::Vendor(VendorForm::Trailing(sep)));
            rest = &after[1..];
          }
          None => {
            segments.push(Segment::Vendor(VendorForm::Bare));
            rest = after;
          }
        }
        continue;
      }

      if let Some(var) = Var::longest_prefix(&rest[1..]) {
        flush(&mut literal, &mut segments);
        segments.push(Segment::Var(var));
        rest = &rest[1 + var.name().len()..];
        continue;
      }
    }

    literal.push(ch);
    rest = &rest[ch.len_utf8()..];
  }

  flush(&mut literal, &mut segments);
  segments
}

/// Substitute all tokens in a string using the provided resolver.
///
/// # Errors
///
/// Returns an error if a token has no value for this resolver.
pub fn substitute(input: &str, resolver: &impl Resolver) -> Result<String, TemplateError> {
  substitute_segments(&parse(input), resolver)
}

/// Substitute tokens in pre-parsed segments.
pub fn substitute_segments(segments: &[Segment], resolver: &impl Resolver) -> Result<String, TemplateError> {
  let mut result = String::new();

  for segment in segments {
    match segment {
      Segment::Literal(s) => result.push_str(s),
      Segment::Var(var) => result.push_str(&resolver.resolve_var(*var)?),
      Segment::Vendor(form) => {
        if let Some(vendor) = resolver.resolve_vendor() {
          match form {
            VendorForm::Bare => result.push_str(vendor),
            VendorForm::Leading(sep) => {
              result.push(*sep);
              result.push_str(vendor);
            }
            VendorForm::Trailing(sep) => {
              result.push_str(vendor);
              result.push(*sep);
            }
          }
        }
      }
    }
  }

  Ok(result)
}
