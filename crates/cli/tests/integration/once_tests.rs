use predicates::prelude::*;

use super::common::{APP_SOURCE, TestEnv};

#[test]
fn once_dev_produces_exactly_one_artifact() {
  let env = TestEnv::from_fixture("dev_release.toml");

  env
    .jsbuild_cmd()
    .args(["once", "dev"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Successfully compiled"));

  assert_eq!(env.read("out/dev.js"), APP_SOURCE);
  let entries: Vec<_> = std::fs::read_dir(env.path("out")).unwrap().collect();
  assert_eq!(entries.len(), 1);
}

#[test]
fn once_release_renames_unprotected_calls() {
  let env = TestEnv::from_fixture("dev_release.toml");

  env.jsbuild_cmd().args(["once", "release"]).assert().success();

  let artifact = env.read("out/release.js");
  assert!(!artifact.contains("ajax"), "{}", artifact);
  assert!(!artifact.contains("fetchUsers"), "{}", artifact);
  assert!(artifact.contains("function startApp("), "{}", artifact);
  assert!(artifact.contains("console.log("), "{}", artifact);
  assert!(artifact.ends_with("//# sourceMappingURL=release.js.map\n"));
  assert!(env.path("out/release.js.map").exists());
}

#[test]
fn once_release_with_externs_keeps_external_names() {
  let env = TestEnv::from_fixture("with_externs.toml");
  env.write_file("externs/jquery.js", "var $ = {};\n$.ajax = function(settings) {};\n");

  env.jsbuild_cmd().args(["once", "release"]).assert().success();

  let artifact = env.read("out/release.js");
  assert!(artifact.contains("$.ajax("), "{}", artifact);
  assert!(!artifact.contains("fetchUsers"), "{}", artifact);
}

#[test]
fn once_without_ids_builds_everything() {
  let env = TestEnv::from_fixture("dev_release.toml");

  env.jsbuild_cmd().arg("once").assert().success();

  assert!(env.path("out/dev.js").exists());
  assert!(env.path("out/release.js").exists());
}

#[test]
fn once_json_reports_each_build() {
  let env = TestEnv::from_fixture("dev_release.toml");

  let output = env
    .jsbuild_cmd()
    .args(["once", "dev", "-o", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["builds"][0]["id"], "dev");
  assert_eq!(json["builds"][0]["ok"], true);
  assert_eq!(json["builds"][0]["report"]["stats"]["files_compiled"], 1);
}

#[test]
fn once_unknown_id_fails() {
  let env = TestEnv::from_fixture("dev_release.toml");

  env
    .jsbuild_cmd()
    .args(["once", "staging"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("no build with id \"staging\""));

  assert!(!env.path("out").exists());
}

#[test]
fn once_missing_source_path_fails() {
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
    .args(["once", "dev"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("source not found"));
}

#[test]
fn once_syntax_error_reports_location() {
  let env = TestEnv::with_config(
    r#"
[[builds]]
id = "dev"
source-paths = ["src"]
output-to = "out/dev.js"
"#,
  );
  env.write_file("src/app.js", "var ok = 1;\nvar broken = 'unterminated;\n");

  env
    .jsbuild_cmd()
    .args(["once", "dev"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("app.js:2:"));
}

#[test]
fn one_failing_build_does_not_stop_the_others() {
  let env = TestEnv::with_config(
    r#"
[[builds]]
id = "broken"
source-paths = ["missing"]
output-to = "out/broken.js"

[[builds]]
id = "dev"
source-paths = ["src"]
output-to = "out/dev.js"
"#,
  );
  env.write_file("src/app.js", APP_SOURCE);

  env
    .jsbuild_cmd()
    .arg("once")
    .assert()
    .failure()
    .stderr(predicate::str::contains("1 of 2 builds failed"));

  assert!(env.path("out/dev.js").exists());
}

#[test]
fn warnings_are_printed_but_not_fatal() {
  let env = TestEnv::with_config(
    r#"
[[builds]]
id = "dev"
source-paths = ["src", "empty"]
output-to = "out/dev.js"
"#,
  );
  env.write_file("src/app.js", APP_SOURCE);
  std::fs::create_dir_all(env.path("empty")).unwrap();

  env
    .jsbuild_cmd()
    .args(["once", "dev"])
    .assert()
    .success()
    .stderr(predicate::str::contains("empty-source-path"));
}
