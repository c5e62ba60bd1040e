use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn named_test_command_runs_after_build() {
  let env = TestEnv::from_fixture("with_tests.toml");

  env
    .jsbuild_cmd()
    .args(["test", "artifact-exists"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Test artifact-exists passed"));
}

#[test]
fn failing_test_command_fails_invocation() {
  let env = TestEnv::from_fixture("with_tests.toml");

  env
    .jsbuild_cmd()
    .arg("test")
    .assert()
    .failure()
    .stdout(predicate::str::contains("Test artifact-exists passed"))
    .stderr(predicate::str::contains("1 of 2 test commands failed"));
}

#[test]
fn unknown_test_command_fails() {
  let env = TestEnv::from_fixture("with_tests.toml");

  env
    .jsbuild_cmd()
    .args(["test", "nope"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("unknown test command"));
}
