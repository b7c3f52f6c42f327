//! Implementation of the `j2v8-build build` command.
//!
//! Parses the request, runs it through the library orchestrator and prints a
//! summary of what ran, what was skipped and where.

use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use tracing::warn;

use j2v8build_lib::cache::CacheOutcome;
use j2v8build_lib::execute::{BuildContext, BuildReport, ShellRunner, execute_build};
use j2v8build_lib::params::BuildParams;
use j2v8build_lib::platform::AgentKind;
use j2v8build_lib::settings::Settings;
use j2v8build_lib::steps::Step;
use j2v8build_lib::{BuildError, ErrorKind};

use crate::output::{OutputFormat, format_duration, print_info, print_json, print_stat, print_success};

#[derive(Debug, Args)]
pub struct BuildArgs {
  /// Target platform (android, linux, macos, windows)
  #[arg(short, long)]
  pub target: Option<String>,

  /// Target architecture (x86, x64, x86_64, arm, arm64)
  #[arg(short, long)]
  pub arch: Option<String>,

  /// Vendor of the target platform, e.g. alpine
  #[arg(short = 'V', long)]
  pub vendor: Option<String>,

  /// Link the Node.js runtime into the native library
  #[arg(long)]
  pub node_enabled: bool,

  /// Keep native libraries of earlier builds when packaging
  #[arg(long)]
  pub keep_native_libs: bool,

  /// Run the build inside a Docker container
  #[arg(long)]
  pub docker: bool,

  /// Run the build inside a Vagrant machine
  #[arg(long)]
  pub vagrant: bool,

  /// Base image or box for the container or machine
  #[arg(long)]
  pub sys_image: Option<String>,

  /// Leave the container or machine running after the build
  #[arg(long)]
  pub no_shutdown: bool,

  /// Forward the output of build commands line by line
  #[arg(long)]
  pub redirect_stdout: bool,

  /// Set when running inside a container or machine on behalf of a host build
  #[arg(long, hide = true)]
  pub cross_agent: Option<AgentKind>,

  #[command(flatten)]
  pub step_args: StepArgs,

  /// Build-steps to run: step ids, aliases, composites and ~anti-steps (default: all)
  pub steps: Vec<String>,

  #[arg(short, long, value_enum, default_value_t)]
  pub output: OutputFormat,
}

/// Extra arguments passed to the main tool of a single build-step.
#[derive(Debug, Default, Args)]
#[command(next_help_heading = "Build-step arguments")]
pub struct StepArgs {
  /// Extra arguments for the Node.js configure step
  #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
  pub nodejs: Option<String>,

  /// Extra arguments for CMake
  #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
  pub j2v8cmake: Option<String>,

  /// Extra arguments for the JNI header generation
  #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
  pub j2v8jni: Option<String>,

  /// Extra arguments for the native compile
  #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
  pub j2v8cpp: Option<String>,

  /// Extra arguments for the native library optimization
  #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
  pub j2v8optimize: Option<String>,

  /// Extra arguments for the Java packaging, e.g. "-Dmaven.test.skip"
  #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
  pub j2v8java: Option<String>,

  /// Extra arguments for the Java tests, e.g. "-Dtest=NodeJSTest"
  #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
  pub j2v8test: Option<String>,
}

impl StepArgs {
  fn into_map(self) -> BTreeMap<Step, String> {
    [
      (Step::NodeJs, self.nodejs),
      (Step::J2v8Cmake, self.j2v8cmake),
      (Step::J2v8Jni, self.j2v8jni),
      (Step::J2v8Cpp, self.j2v8cpp),
      (Step::J2v8Optimize, self.j2v8optimize),
      (Step::J2v8Java, self.j2v8java),
      (Step::J2v8Test, self.j2v8test),
    ]
    .into_iter()
    .filter_map(|(step, args)| args.map(|args| (step, args)))
    .collect()
  }
}

impl BuildArgs {
  pub fn into_params(self) -> BuildParams {
    BuildParams {
      target: self.target,
      arch: self.arch,
      vendor: self.vendor,
      steps: self.steps,
      step_args: self.step_args.into_map(),
      node_enabled: self.node_enabled,
      keep_native_libs: self.keep_native_libs,
      docker: self.docker,
      vagrant: self.vagrant,
      sys_image: self.sys_image,
      no_shutdown: self.no_shutdown,
      redirect_stdout: self.redirect_stdout,
      cross_agent: self.cross_agent,
    }
  }
}

/// Execute the build command.
pub fn cmd_build(args: BuildArgs) -> Result<()> {
  let output = args.output;
  run_build(&args.into_params(), output)
}

/// Run `params` against the project in the current directory (or `J2V8_BUILD_ROOT`).
///
/// Ctrl-C cancels the build; teardowns of a running container or machine
/// still fire.
pub fn run_build(params: &BuildParams, output: OutputFormat) -> Result<()> {
  let settings = Settings::from_env().context("Failed to determine the project root")?;
  let ctx = BuildContext::new(settings);
  let runner = ShellRunner::streaming(params.redirect_stdout);

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let result = rt.block_on(async {
    tokio::select! {
      result = execute_build(params, &ctx, &runner) => Some(result),
      _ = tokio::signal::ctrl_c() => None,
    }
  });

  let report = match result {
    Some(Ok(report)) => report,
    Some(Err(err)) => return Err(describe(err)),
    None => {
      warn!("interrupted, shutting down");
      bail!("Build interrupted");
    }
  };

  if output.is_json() {
    print_json(&report)?;
  } else {
    print_summary(&report);
  }

  Ok(())
}

/// One line per failure; configuration errors need no prefix.
fn describe(err: BuildError) -> anyhow::Error {
  let message = anyhow!("{err}");
  match err.kind() {
    ErrorKind::Configuration => message,
    ErrorKind::Environment => message.context("Build environment is not usable"),
    ErrorKind::Execution => message.context("Build failed"),
    ErrorKind::Cache => message.context("Failed to update the Node.js output cache"),
  }
}

fn print_summary(report: &BuildReport) {
  println!();
  match report.delegated {
    Some(agent) => print_success(&format!("Build complete! (delegated to {agent})")),
    None => print_success("Build complete!"),
  }

  let target = match &report.vendor {
    Some(vendor) => format!("{vendor}-{}.{}", report.target, report.arch),
    None => format!("{}.{}", report.target, report.arch),
  };
  print_stat("Target", &target);
  print_stat("Planned", &report.plan.to_string());
  if report.delegated.is_none() {
    let executed: Vec<&str> = report.executed.iter().map(Step::as_str).collect();
    print_stat("Executed", &executed.join(", "));
  }
  if let Some(outcome) = report.cache {
    print_stat("Node.js output", cache_label(outcome));
  }
  print_stat("Duration", &format_duration(report.elapsed));

  if !report.skipped.is_empty() {
    println!();
    for skipped in &report.skipped {
      print_info(&format!("Skipped {}: {}", skipped.step, skipped.reason));
    }
  }
  if report.executed.is_empty() && report.delegated.is_none() {
    print_info("Nothing was executed for this target");
  }
}

fn cache_label(outcome: CacheOutcome) -> &'static str {
  match outcome {
    CacheOutcome::Hit => "reused",
    CacheOutcome::Restored => "restored from cache",
    CacheOutcome::Prepared => "prepared for a fresh build",
    CacheOutcome::Flushed => "moved into cache",
  }
}
