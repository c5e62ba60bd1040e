//! Test utilities for jsbuild-lib.
//!
//! Fixture writers for source trees and cross-platform argv builders for
//! hook and notify tests.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{BuildTarget, Optimizations};

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
  let path = root.join(relative);
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(&path, content).unwrap();
  path
}

/// A target compiling `root/src` into `root/out/app.js`.
pub fn target_in(root: &Path, id: &str, optimizations: Optimizations) -> BuildTarget {
  BuildTarget::new(id, vec![root.join("src")], root.join("out").join("app.js")).with_optimizations(optimizations)
}

/// Argv running a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> Vec<String> {
  vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()]
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> Vec<String> {
  vec!["cmd.exe".to_string(), "/C".to_string(), script.to_string()]
}

/// Argv that appends its trailing arguments to `file`, one line per call.
#[cfg(unix)]
pub fn append_args_to(file: &Path) -> Vec<String> {
  vec![
    "/bin/sh".to_string(),
    "-c".to_string(),
    format!("echo \"$@\" >> '{}'", file.display()),
    "sh".to_string(),
  ]
}

#[cfg(windows)]
pub fn append_args_to(file: &Path) -> Vec<String> {
  vec![
    "powershell.exe".to_string(),
    "-NoProfile".to_string(),
    "-Command".to_string(),
    format!("$args -join ' ' | Add-Content -Path '{}'", file.display()),
  ]
}

/// Argv that exits with a non-zero status.
#[cfg(unix)]
pub fn failing_cmd() -> Vec<String> {
  vec!["/bin/sh".to_string(), "-c".to_string(), "exit 3".to_string()]
}

#[cfg(windows)]
pub fn failing_cmd() -> Vec<String> {
  vec!["cmd.exe".to_string(), "/C".to_string(), "exit 3".to_string()]
}
