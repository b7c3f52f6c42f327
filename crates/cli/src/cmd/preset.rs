//! Predefined build configurations.

use anyhow::Result;

use j2v8build_lib::presets;

use crate::cmd::build::run_build;
use crate::output::{OutputFormat, print_info, print_json, symbols};

pub fn cmd_presets(output: OutputFormat) -> Result<()> {
  let all = presets::presets()?;

  if output.is_json() {
    let listing: Vec<_> = all
      .iter()
      .enumerate()
      .map(|(index, preset)| serde_json::json!({ "index": index, "name": preset.name, "params": preset.params }))
      .collect();
    return print_json(&listing);
  }

  for (index, preset) in all.iter().enumerate() {
    println!("[{index}] {}", preset.name);
  }
  Ok(())
}

/// Run the preset picked by `selector`, optionally with other steps.
pub fn cmd_preset(selector: &str, steps: &[String], output: OutputFormat) -> Result<()> {
  let preset = presets::find(selector)?;
  print_info(&format!("Building: {}", preset.name));
  if !steps.is_empty() {
    println!("  {} steps: {}", symbols::ARROW, steps.join(" "));
  }

  run_build(&preset.into_params(steps), output)
}
