use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn missing_description_fails() {
  let env = TestEnv::empty();

  env
    .jsbuild_cmd()
    .arg("once")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load build description"));
}

#[test]
fn malformed_description_fails_before_compiling() {
  let env = TestEnv::with_config(
    r#"
[[builds]]
id = "dev"
source-paths = ["src"]
output-to = "out/dev.js"
optimizations = "simple"
"#,
  );
  env.write_file("src/app.js", "var a = 1;\n");

  env.jsbuild_cmd().arg("once").assert().failure();

  assert!(!env.path("out").exists());
}

#[test]
fn duplicate_ids_are_rejected() {
  let env = TestEnv::with_config(
    r#"
[[builds]]
id = "dev"
source-paths = ["src"]
output-to = "out/a.js"

[[builds]]
id = "dev"
source-paths = ["src"]
output-to = "out/b.js"
"#,
  );

  env.jsbuild_cmd().arg("info").assert().failure();
}

#[test]
fn config_flag_overrides_default() {
  let env = TestEnv::empty();
  env.write_file(
    "build/custom.toml",
    "[[builds]]\nid = \"custom\"\nsource-paths = [\"../src\"]\noutput-to = \"../out/custom.js\"\n",
  );
  env.write_file("src/app.js", "var a = 1;\n");

  env
    .jsbuild_cmd()
    .args(["--config", "build/custom.toml", "once", "custom"])
    .assert()
    .success();

  assert!(env.path("out/custom.js").exists());
}

#[test]
fn config_env_var_is_used() {
  let env = TestEnv::empty();
  env.write_file(
    "alt.toml",
    "[[builds]]\nid = \"alt\"\nsource-paths = [\"src\"]\noutput-to = \"out/alt.js\"\n",
  );
  env.write_file("src/app.js", "var a = 1;\n");

  env
    .jsbuild_cmd()
    .env("JSBUILD_CONFIG", env.path("alt.toml"))
    .args(["once", "alt"])
    .assert()
    .success();

  assert!(env.path("out/alt.js").exists());
}
