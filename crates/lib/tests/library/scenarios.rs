use std::fs;

use tempfile::TempDir;

use j2v8build_lib::ErrorKind;
use j2v8build_lib::cache::{ArtifactCache, CacheOutcome};
use j2v8build_lib::execute::{BuildContext, execute_build};
use j2v8build_lib::params::BuildParams;
use j2v8build_lib::settings::Settings;
use j2v8build_lib::steps::Step;

use crate::support::Recorder;

fn project() -> (TempDir, BuildContext) {
  let temp = TempDir::new().unwrap();
  let ctx = BuildContext::new(Settings::new(temp.path()));
  (temp, ctx)
}

// =============================================================================
// Planning
// =============================================================================

#[tokio::test]
async fn all_runs_the_full_sequence_on_linux() {
  let (_temp, ctx) = project();
  let runner = Recorder::default();

  let report = execute_build(&BuildParams::new("linux", "x64").with_steps(["all"]), &ctx, &runner)
    .await
    .unwrap();

  assert_eq!(report.plan.steps(), &Step::ALL);
  assert_eq!(report.executed, Step::ALL.to_vec());
  assert!(report.skipped.is_empty());
}

#[tokio::test]
async fn single_java_step_skips_native_work() {
  let (_temp, ctx) = project();
  let runner = Recorder::default();

  let report = execute_build(
    &BuildParams::new("windows", "x64").with_steps(["j2v8java"]),
    &ctx,
    &runner,
  )
  .await
  .unwrap();

  assert_eq!(report.plan.steps(), &[Step::J2v8Java]);
  assert_eq!(report.executed, vec![Step::J2v8Java]);
  assert!(runner.commands().iter().all(|cmd| !cmd.contains("configure")));
}

#[tokio::test]
async fn anti_step_drops_the_runtime_build() {
  let (_temp, ctx) = project();
  let runner = Recorder::default();

  let report = execute_build(
    &BuildParams::new("linux", "x64").with_steps(["all", "~nodejs"]),
    &ctx,
    &runner,
  )
  .await
  .unwrap();

  assert_eq!(report.plan.steps(), &Step::ALL[1..]);
  assert!(runner.commands().iter().all(|cmd| !cmd.contains("./node")));
}

#[tokio::test]
async fn unknown_token_is_a_configuration_error() {
  let (_temp, ctx) = project();
  let runner = Recorder::default();

  let err = execute_build(
    &BuildParams::new("linux", "x64").with_steps(["all", "bogus-step"]),
    &ctx,
    &runner,
  )
  .await
  .unwrap_err();

  assert_eq!(err.kind(), ErrorKind::Configuration);
  assert!(err.to_string().contains("bogus-step"));
  assert!(runner.commands().is_empty());
}

// =============================================================================
// Execution
// =============================================================================

#[tokio::test]
async fn missing_shell_is_an_environment_error() {
  let (_temp, ctx) = project();
  let runner = Recorder::failing("bash");

  let err = execute_build(&BuildParams::new("linux", "x64").with_steps(["j2v8cpp"]), &ctx, &runner)
    .await
    .unwrap_err();

  assert_eq!(err.kind(), ErrorKind::Environment);
  assert_eq!(runner.commands(), vec!["bash --version"]);
}

#[tokio::test]
async fn failing_step_is_an_execution_error() {
  let (_temp, ctx) = project();
  let runner = Recorder::failing("cd ");

  let err = execute_build(
    &BuildParams::new("linux", "x64").with_steps(["j2v8cpp", "j2v8java"]),
    &ctx,
    &runner,
  )
  .await
  .unwrap_err();

  assert_eq!(err.kind(), ErrorKind::Execution);
  assert!(err.to_string().contains("j2v8cpp"));
  assert_eq!(runner.commands().len(), 2);
}

#[tokio::test]
async fn docker_needs_a_known_server_os() {
  let (_temp, ctx) = project();
  let runner = Recorder::default();
  let params = BuildParams {
    docker: true,
    ..BuildParams::new("android", "arm").with_steps(["j2v8cpp"])
  };

  let err = execute_build(&params, &ctx, &runner).await.unwrap_err();

  assert_eq!(err.kind(), ErrorKind::Environment);
  assert_eq!(runner.commands(), vec!["docker stats --no-stream", "docker version"]);
}

// =============================================================================
// Runtime output cache
// =============================================================================

#[tokio::test]
async fn identical_builds_reuse_the_runtime_output() {
  let (temp, ctx) = project();
  fs::create_dir_all(temp.path().join("node")).unwrap();
  let params = BuildParams::new("windows", "x64").with_steps(["j2v8optimize"]);

  let first = execute_build(&params, &ctx, &Recorder::default()).await.unwrap();
  assert_eq!(first.cache, Some(CacheOutcome::Prepared));

  let cache = ArtifactCache::for_project(temp.path());
  let marker = cache.live_dir().join("j2v8.node.out");
  fs::write(cache.live_dir().join("libnode.a"), "objects").unwrap();
  let stamp = fs::metadata(&marker).unwrap().modified().unwrap();

  let second = execute_build(&params, &ctx, &Recorder::default()).await.unwrap();

  assert_eq!(second.cache, Some(CacheOutcome::Hit));
  assert_eq!(cache.current_tag().unwrap().as_deref(), Some("windows.x64"));
  assert_eq!(fs::metadata(&marker).unwrap().modified().unwrap(), stamp);
  assert_eq!(fs::read_to_string(cache.live_dir().join("libnode.a")).unwrap(), "objects");
  assert!(!temp.path().join("node.out").exists());
}

#[tokio::test]
async fn vendor_builds_use_their_own_cache_entry() {
  let (temp, ctx) = project();
  fs::create_dir_all(temp.path().join("node")).unwrap();
  let cache = ArtifactCache::for_project(temp.path());

  let plain = BuildParams::new("macos", "x64").with_steps(["j2v8optimize"]);
  execute_build(&plain, &ctx, &Recorder::default()).await.unwrap();
  fs::write(cache.live_dir().join("libnode.a"), "darwin").unwrap();

  let alpine = BuildParams {
    vendor: Some("alpine".to_string()),
    ..BuildParams::new("linux", "x64").with_steps(["j2v8optimize"])
  };
  let report = execute_build(&alpine, &ctx, &Recorder::default()).await.unwrap();
  assert_eq!(report.cache, Some(CacheOutcome::Prepared));
  assert_eq!(cache.current_tag().unwrap().as_deref(), Some("alpine-linux.x64"));
  assert!(cache.entry_dir("macos.x64").join("out").join("libnode.a").is_file());
  assert!(!cache.live_dir().join("libnode.a").exists());

  let report = execute_build(&plain, &ctx, &Recorder::default()).await.unwrap();
  assert_eq!(report.cache, Some(CacheOutcome::Restored));
  assert_eq!(fs::read_to_string(cache.live_dir().join("libnode.a")).unwrap(), "darwin");
}
