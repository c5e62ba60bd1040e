//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;
use std::process::{Child, Stdio};
use std::time::{Duration, Instant};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Sources used by most tests: one call through an unprotected global.
pub const APP_SOURCE: &str = r#"// Loads users through jQuery.
function fetchUsers(callback) {
  return $.ajax({ url: '/users', success: callback });
}

/** @export */
function startApp() {
  fetchUsers(function(users) { console.log(users); });
}
"#;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Isolated project directory with a `jsbuild.toml`.
pub struct TestEnv {
  pub temp: TempDir,
  pub config_path: PathBuf,
}

impl TestEnv {
  /// Copy a fixture to `jsbuild.toml` and write the default app source.
  pub fn from_fixture(name: &str) -> Self {
    let env = Self::empty();
    std::fs::write(&env.config_path, fixture_content(name)).unwrap();
    env.write_file("src/app.js", APP_SOURCE);
    env
  }

  /// A project with a description given inline.
  pub fn with_config(content: &str) -> Self {
    let env = Self::empty();
    std::fs::write(&env.config_path, content).unwrap();
    env
  }

  /// An empty project directory without a description.
  pub fn empty() -> Self {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("jsbuild.toml");
    Self { temp, config_path }
  }

  /// Write a file relative to the project directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn path(&self, relative_path: &str) -> PathBuf {
    self.temp.path().join(relative_path)
  }

  pub fn read(&self, relative_path: &str) -> String {
    std::fs::read_to_string(self.path(relative_path))
      .unwrap_or_else(|e| panic!("Failed to read {}: {}", relative_path, e))
  }

  /// Command for the jsbuild binary, run from the project directory.
  pub fn jsbuild_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("jsbuild");
    cmd.current_dir(self.temp.path());
    cmd.env_remove("JSBUILD_CONFIG");
    cmd.env_remove("RUST_LOG");
    cmd
  }

  /// Start the jsbuild binary in the background, from the project directory.
  /// The process is killed when the handle drops.
  pub fn spawn_jsbuild(&self, args: &[&str]) -> Running {
    let child = std::process::Command::new(env!("CARGO_BIN_EXE_jsbuild"))
      .args(args)
      .current_dir(self.temp.path())
      .env_remove("JSBUILD_CONFIG")
      .env_remove("RUST_LOG")
      .stdout(Stdio::null())
      .stderr(Stdio::null())
      .spawn()
      .unwrap();
    Running(child)
  }

  /// Poll a project file until `check` accepts its content.
  pub fn wait_for_file(&self, relative_path: &str, timeout: Duration, check: impl Fn(&str) -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
      if let Ok(content) = std::fs::read_to_string(self.path(relative_path))
        && check(&content)
      {
        return true;
      }
      std::thread::sleep(Duration::from_millis(50));
    }
    false
  }
}

/// A background jsbuild process.
pub struct Running(Child);

impl Drop for Running {
  fn drop(&mut self) {
    let _ = self.0.kill();
    let _ = self.0.wait();
  }
}
