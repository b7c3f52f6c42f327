use predicates::prelude::*;

use super::common::{NODE_TAG, TestEnv, cache_entry};

fn skip_only_build(env: &TestEnv, target: &str, arch: &str) {
  env
    .build_cmd()
    .args(["build", "-t", target, "-a", arch, "j2v8optimize"])
    .assert()
    .success();
}

#[test]
fn same_target_twice_leaves_output_alone() {
  let env = TestEnv::with_node();

  skip_only_build(&env, "windows", "x64");
  assert_eq!(env.read_file(NODE_TAG), "windows.x64");
  let first = env.modified(NODE_TAG);

  skip_only_build(&env, "windows", "x64");
  assert_eq!(env.read_file(NODE_TAG), "windows.x64");
  assert_eq!(env.modified(NODE_TAG), first);
  assert!(!env.exists("node.out"));
}

#[test]
fn switching_targets_stashes_and_restores() {
  let env = TestEnv::with_node();
  env.write_file(NODE_TAG, "android.arm");
  env.write_file("node/out/Release/libnode.a", "arm objects");
  env.write_file("node/Release/node.exp", "exports");

  skip_only_build(&env, "windows", "x64");
  assert_eq!(env.read_file(NODE_TAG), "windows.x64");
  let stashed = cache_entry(&env.root(), "android.arm");
  assert!(stashed.join("out/Release/libnode.a").is_file());
  assert!(stashed.join("Release/node.exp").is_file());
  assert!(!env.exists("node/Release"));

  skip_only_build(&env, "android", "arm");
  assert_eq!(env.read_file(NODE_TAG), "android.arm");
  assert_eq!(env.read_file("node/out/Release/libnode.a"), "arm objects");
  assert_eq!(env.read_file("node/Release/node.exp"), "exports");
  assert!(cache_entry(&env.root(), "windows.x64").join("out").is_dir());
}

#[test]
fn flush_cache_moves_live_output_away() {
  let env = TestEnv::with_node();
  env.write_file(NODE_TAG, "linux.x64");
  env.write_file("node/out/Release/libnode.a", "x64 objects");

  env
    .build_cmd()
    .arg("flush-cache")
    .assert()
    .success()
    .stdout(predicate::str::contains("Cached Node.js output for linux.x64"));

  assert!(!env.exists(NODE_TAG));
  assert!(cache_entry(&env.root(), "linux.x64").join("out/Release/libnode.a").is_file());
}
