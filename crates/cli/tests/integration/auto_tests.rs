use std::time::Duration;

use predicates::prelude::*;

use super::common::{APP_SOURCE, TestEnv};

#[test]
fn auto_unknown_id_fails() {
  let env = TestEnv::from_fixture("dev_release.toml");

  env
    .jsbuild_cmd()
    .args(["auto", "staging"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("no build with id"));
}

#[test]
fn auto_missing_source_path_fails_fast() {
  let env = TestEnv::with_config(
    r#"
[[builds]]
id = "dev"
source-paths = ["missing"]
output-to = "out/dev.js"
"#,
  );

  env
    .jsbuild_cmd()
    .args(["auto", "dev"])
    .timeout(std::time::Duration::from_secs(30))
    .assert()
    .failure()
    .stderr(predicate::str::contains("source not found"));
}

#[test]
fn auto_rebuilds_after_a_source_edit() {
  let env = TestEnv::from_fixture("dev_release.toml");
  let _jsbuild = env.spawn_jsbuild(&["auto", "dev"]);

  assert!(
    env.wait_for_file("out/dev.js", Duration::from_secs(30), |content| content == APP_SOURCE),
    "initial pass never wrote the artifact"
  );

  env.write_file("src/app.js", "var edited = true;\n");
  assert!(
    env.wait_for_file("out/dev.js", Duration::from_secs(30), |content| content
      == "var edited = true;\n"),
    "artifact not rebuilt after the edit: {:?}",
    std::fs::read_to_string(env.path("out/dev.js"))
  );
}
