use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn clean_removes_artifacts_and_maps() {
  let env = TestEnv::from_fixture("dev_release.toml");
  env.jsbuild_cmd().arg("once").assert().success();

  env
    .jsbuild_cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Removed 3 path(s)"));

  assert!(!env.path("out/dev.js").exists());
  assert!(!env.path("out/release.js").exists());
  assert!(!env.path("out/release.js.map").exists());
  assert!(env.path("src/app.js").exists());
}

#[test]
fn clean_with_nothing_built() {
  let env = TestEnv::from_fixture("dev_release.toml");

  env
    .jsbuild_cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Nothing to clean"));
}
