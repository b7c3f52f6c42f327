use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn preset_steps_can_be_overridden() {
  let env = TestEnv::empty();

  env
    .build_cmd()
    .args(["preset", "9", "j2v8optimize"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Building: windows-x64"))
    .stdout(predicate::str::contains("Skipped j2v8optimize"));
}

#[test]
fn preset_by_name() {
  let env = TestEnv::empty();

  env
    .build_cmd()
    .args(["preset", "macosx-x64", "j2v8optimize"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Target: macos.x64"));
}

#[test]
fn presets_json_carries_params() {
  let env = TestEnv::empty();

  let assert = env.build_cmd().args(["presets", "-o", "json"]).assert().success();

  let presets: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
  assert_eq!(presets[2]["params"]["vendor"], "alpine");
  assert_eq!(presets[7]["params"]["vagrant"], true);
}
