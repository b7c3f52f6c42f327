use anyhow::Result;
use owo_colors::{OwoColorize, Stream};

use j2v8build_lib::consts::ANTI_STEP_PREFIX;
use j2v8build_lib::steps::{StepKind, StepRegistry};

use crate::output::{OutputFormat, print_json, symbols};

/// List atomic steps in execution order, then aliases and composites.
pub fn cmd_steps(output: OutputFormat) -> Result<()> {
  let registry = StepRegistry::standard();

  if output.is_json() {
    let catalog: Vec<_> = registry.catalog().collect();
    return print_json(&catalog);
  }

  println!("Build-steps (in execution order):");
  for entry in registry.catalog().filter(|e| e.kind == StepKind::Atomic) {
    println!(
      "  {} {}",
      format!("{:<14}", entry.token).if_supports_color(Stream::Stdout, |s| s.bold()),
      entry.help
    );
  }

  println!();
  println!("Aliases and composites:");
  for entry in registry.catalog().filter(|e| e.kind != StepKind::Atomic) {
    let detail = match entry.kind {
      StepKind::Alias(step) => format!("{} {step}", symbols::ARROW),
      _ => entry.help.to_string(),
    };
    println!(
      "  {} {}",
      format!("{:<14}", entry.token).if_supports_color(Stream::Stdout, |s| s.bold()),
      detail
    );
  }

  println!();
  println!(
    "Prefix any step with '{ANTI_STEP_PREFIX}' to remove it from the build, e.g. all {ANTI_STEP_PREFIX}j2v8test"
  );

  Ok(())
}
