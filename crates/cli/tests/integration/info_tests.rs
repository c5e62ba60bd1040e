use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn info_lists_builds() {
  let env = TestEnv::from_fixture("dev_release.toml");

  env
    .jsbuild_cmd()
    .arg("info")
    .assert()
    .success()
    .stdout(predicate::str::contains("dev"))
    .stdout(predicate::str::contains("release"))
    .stdout(predicate::str::contains("advanced"));
}

#[test]
fn info_json_is_valid() {
  let env = TestEnv::from_fixture("dev_release.toml");

  let output = env.jsbuild_cmd().args(["info", "-o", "json"]).output().unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["watch_debounce_ms"], 100);
  assert_eq!(json["builds"][0]["id"], "dev");
  assert_eq!(json["builds"][1]["optimizations"], "advanced");
}
