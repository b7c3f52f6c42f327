mod cmd;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::BuildArgs;
use output::{OutputFormat, print_error};

/// j2v8-build - cross-platform build orchestration for J2V8
#[derive(Parser)]
#[command(name = "j2v8-build")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run build-steps for a target platform
  Build(BuildArgs),

  /// List the available build-steps
  Steps {
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// List the predefined build configurations
  Presets {
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Run a predefined build configuration
  Preset {
    /// Index or name of the preset (see `presets`)
    selector: String,

    /// Build-steps to run instead of the preset's own
    steps: Vec<String>,

    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Move the live Node.js build output into the cache
  FlushCache,
}

fn main() {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_target(false)
    .without_time()
    .init();

  if let Err(err) = run(cli.command) {
    print_error(&format!("{err:#}"));
    std::process::exit(1);
  }
}

fn run(command: Commands) -> Result<()> {
  match command {
    Commands::Build(args) => cmd::cmd_build(args),
    Commands::Steps { output } => cmd::cmd_steps(output),
    Commands::Presets { output } => cmd::cmd_presets(output),
    Commands::Preset {
      selector,
      steps,
      output,
    } => cmd::cmd_preset(&selector, &steps, output),
    Commands::FlushCache => cmd::cmd_flush_cache(),
  }
}
