use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn undefined_step_is_skipped_not_failed() {
  let env = TestEnv::empty();

  env
    .build_cmd()
    .args(["build", "-t", "windows", "-a", "x64", "j2v8optimize"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Build complete!"))
    .stdout(predicate::str::contains("Skipped j2v8optimize"))
    .stderr(predicate::str::contains("Skipped").not());
}

#[test]
fn step_arguments_imply_their_step() {
  let env = TestEnv::empty();

  env
    .build_cmd()
    .args(["build", "-t", "macos", "-a", "x64", "--j2v8optimize=-x"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Planned: j2v8optimize"));
}

#[test]
fn json_report_lists_plan_and_skips() {
  let env = TestEnv::empty();

  let assert = env
    .build_cmd()
    .env("RUST_LOG", "off")
    .args(["build", "-t", "android", "-a", "arm", "j2v8optimize", "-o", "json"])
    .assert()
    .success();

  let report: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
  assert_eq!(report["target"], "android");
  assert_eq!(report["plan"], serde_json::json!(["j2v8optimize"]));
  assert_eq!(report["executed"], serde_json::json!([]));
  assert_eq!(report["skipped"][0]["step"], "j2v8optimize");
  assert!(report["delegated"].is_null());
}

#[test]
fn anti_steps_can_empty_the_plan() {
  let env = TestEnv::empty();

  env
    .build_cmd()
    .args(["build", "-t", "linux", "-a", "x64", "native", "~native"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("no build-steps to be done"));
}

#[cfg(unix)]
#[test]
fn failing_step_ends_the_build() {
  let env = TestEnv::empty();

  env
    .build_cmd()
    .args(["build", "-t", "linux", "-a", "x64", "j2v8cpp", "j2v8java"])
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains("j2v8cpp"))
    .stderr(predicate::str::contains("j2v8java").not());
}
