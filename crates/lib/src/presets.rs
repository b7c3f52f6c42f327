//! Predefined build configurations.

use serde::Deserialize;
use thiserror::Error;

use crate::params::BuildParams;

/// Presets shipped with the crate, in listing order.
const PRESETS_JSON: &str = include_str!("presets.json");

#[derive(Debug, Error)]
pub enum PresetError {
  #[error("invalid preset definitions: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("no preset named or numbered '{0}', see `presets` for the list")]
  NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Preset {
  pub name: String,
  pub params: BuildParams,
}

/// All presets, indexed from 0.
pub fn presets() -> Result<Vec<Preset>, PresetError> {
  Ok(serde_json::from_str(PRESETS_JSON)?)
}

/// Find a preset by index or by exact name.
pub fn find(selector: &str) -> Result<Preset, PresetError> {
  let mut all = presets()?;

  let index = match selector.parse::<usize>() {
    Ok(index) if index < all.len() => Some(index),
    _ => all.iter().position(|preset| preset.name == selector),
  };

  index
    .map(|index| all.swap_remove(index))
    .ok_or_else(|| PresetError::NotFound(selector.to_string()))
}

impl Preset {
  /// The preset's request, with its steps replaced when `steps` is not empty.
  pub fn into_params(self, steps: &[String]) -> BuildParams {
    if steps.is_empty() {
      self.params
    } else {
      self.params.with_steps(steps.iter().cloned())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::platform::PlatformRegistry;
  use crate::steps::{Step, StepRegistry};

  #[test]
  fn every_preset_plans() {
    let platforms = PlatformRegistry::standard();
    let steps = StepRegistry::standard();

    let all = presets().unwrap();
    assert_eq!(all.len(), 12);
    for preset in all {
      assert!(preset.params.node_enabled, "{}", preset.name);
      let plan = preset.params.plan(&platforms, &steps).unwrap();
      assert_eq!(plan.plan.steps(), &Step::ALL, "{}", preset.name);
    }
  }

  #[test]
  fn find_by_index_or_name() {
    let alpine = find("2").unwrap();
    assert_eq!(alpine.name, "alpine-linux-x64 @ Docker");
    assert_eq!(alpine.params.vendor.as_deref(), Some("alpine"));
    assert_eq!(alpine.params.sys_image.as_deref(), Some("openjdk:8u131-alpine"));

    let vagrant = find("windows-x64 @ Vagrant").unwrap();
    assert!(vagrant.params.vagrant);

    assert!(matches!(find("12"), Err(PresetError::NotFound(_))));
    assert!(matches!(find("freebsd-x64"), Err(PresetError::NotFound(_))));
  }

  #[test]
  fn steps_override() {
    let preset = find("linux-x64").unwrap();
    assert!(preset.clone().into_params(&[]).steps.is_empty());

    let params = preset.into_params(&["j2v8java".to_string(), "~j2v8test".to_string()]);
    assert_eq!(params.steps, vec!["j2v8java", "~j2v8test"]);
    assert_eq!(params.target.as_deref(), Some("linux"));
  }
}
