//! External commands: build hooks, pass notifications, and test commands.
//!
//! Commands are argv lists run directly, without a shell, in the directory
//! of the build description.

use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::build::BuildReport;
use crate::config::{BuildDescription, BuildTarget, HookStage};
use crate::error::BuildError;

#[derive(Debug, Error)]
pub enum HookError {
  #[error("empty command")]
  Empty,

  #[error("failed to run {cmd}: {source}")]
  Spawn {
    cmd: String,
    #[source]
    source: std::io::Error,
  },

  #[error("command failed with exit code {code:?}: {cmd}")]
  Failed { cmd: String, code: Option<i32> },

  #[error("unknown test command: {0}")]
  UnknownTest(String),
}

/// Run one command and return its trimmed stdout.
pub async fn run_command(argv: &[String], cwd: &Path) -> Result<String, HookError> {
  let (program, args) = argv.split_first().ok_or(HookError::Empty)?;
  let cmd = argv.join(" ");
  info!(cmd = %cmd, "running command");

  let output = Command::new(program)
    .args(args)
    .current_dir(cwd)
    .output()
    .await
    .map_err(|source| HookError::Spawn {
      cmd: cmd.clone(),
      source,
    })?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
      debug!(stderr = %stderr, "command stderr");
    }
    return Err(HookError::Failed {
      cmd,
      code: output.status.code(),
    });
  }

  let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
  if !stdout.is_empty() {
    debug!(stdout = %stdout, "command output");
  }
  Ok(stdout)
}

/// Run every hook registered for `stage`, in order. Stops at the first failure.
pub async fn run_hooks(desc: &BuildDescription, stage: HookStage) -> Result<usize, HookError> {
  let mut count = 0;
  for hook in desc.hooks(stage) {
    run_command(&hook.command, &desc.root).await?;
    count += 1;
  }
  Ok(count)
}

/// Status line passed to `notify-command` after a compile pass.
pub fn pass_message(target: &BuildTarget, result: &Result<BuildReport, BuildError>) -> String {
  let output = target.output_to.display();
  match result {
    Ok(report) => {
      let elapsed = Duration::from_millis(report.elapsed.as_millis() as u64);
      format!(
        "Successfully compiled \"{}\" in {}.",
        output,
        humantime::format_duration(elapsed)
      )
    }
    Err(_) => format!("Compiling \"{}\" failed.", output),
  }
}

/// Run the target's `notify-command`, if any, with `message` appended.
///
/// Failures are logged and otherwise ignored.
pub async fn notify(target: &BuildTarget, message: &str) {
  let Some(command) = &target.notify_command else {
    return;
  };
  let mut argv = command.clone();
  argv.push(message.to_string());

  let cwd = target.output_to.parent().filter(|p| p.exists()).unwrap_or(Path::new("."));
  if let Err(err) = run_command(&argv, cwd).await {
    warn!(target = %target.id, error = %err, "notify command failed");
  }
}

/// Run named test commands, or all of them when `names` is empty.
///
/// Every selected command runs; the returned list holds each name with its
/// outcome.
pub async fn run_test_commands(
  desc: &BuildDescription,
  names: &[String],
) -> Result<Vec<(String, Result<String, HookError>)>, HookError> {
  let tests = desc.test_commands();
  let selected: Vec<&String> = if names.is_empty() {
    tests.keys().collect()
  } else {
    for name in names {
      if !tests.contains_key(name) {
        return Err(HookError::UnknownTest(name.clone()));
      }
    }
    names.iter().collect()
  };

  let mut results = Vec::with_capacity(selected.len());
  for name in selected {
    let result = run_command(&tests[name], &desc.root).await;
    results.push((name.clone(), result));
  }
  Ok(results)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Optimizations;
  use crate::util::testutil::{append_args_to, failing_cmd, shell_cmd, target_in};
  use std::fs;
  use tempfile::TempDir;

  fn description(root: &Path, toml: &str) -> BuildDescription {
    BuildDescription::parse(toml, root).unwrap()
  }

  fn quoted(argv: &[String]) -> String {
    argv
      .iter()
      .map(|arg| format!("{:?}", arg))
      .collect::<Vec<_>>()
      .join(", ")
  }

  #[tokio::test]
  async fn run_command_returns_stdout() {
    let temp = TempDir::new().unwrap();
    let out = run_command(&shell_cmd("echo hello"), temp.path()).await.unwrap();
    assert_eq!(out, "hello");
  }

  #[tokio::test]
  async fn run_command_reports_exit_code() {
    let temp = TempDir::new().unwrap();
    let err = run_command(&failing_cmd(), temp.path()).await.unwrap_err();
    assert!(matches!(err, HookError::Failed { code: Some(3), .. }));
  }

  #[tokio::test]
  async fn run_command_rejects_empty_argv() {
    let err = run_command(&[], Path::new(".")).await.unwrap_err();
    assert!(matches!(err, HookError::Empty));
  }

  #[tokio::test]
  async fn missing_program_is_spawn_error() {
    let argv = vec!["jsbuild-no-such-program".to_string()];
    let err = run_command(&argv, Path::new(".")).await.unwrap_err();
    assert!(matches!(err, HookError::Spawn { .. }));
  }

  #[tokio::test]
  async fn hooks_run_in_description_root_by_stage() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("hooks.log");
    let toml = format!(
      "[[hooks]]\nstage = \"pre-build\"\ncommand = [{}]\n\n[[hooks]]\nstage = \"post-build\"\ncommand = [{}]\n",
      quoted(&[append_args_to(&log), vec!["pre".to_string()]].concat()),
      quoted(&[append_args_to(&log), vec!["post".to_string()]].concat()),
    );
    let desc = description(temp.path(), &toml);

    assert_eq!(run_hooks(&desc, HookStage::PreBuild).await.unwrap(), 1);
    assert_eq!(fs::read_to_string(&log).unwrap().trim(), "pre");
  }

  #[tokio::test]
  async fn notify_appends_message() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("notify.log");
    let mut target = target_in(temp.path(), "dev", Optimizations::None);
    target.notify_command = Some(append_args_to(&log));

    notify(&target, "Compiling \"app.js\" failed.").await;

    assert_eq!(fs::read_to_string(&log).unwrap().trim(), "Compiling \"app.js\" failed.");
  }

  #[tokio::test]
  async fn notify_failure_is_not_fatal() {
    let temp = TempDir::new().unwrap();
    let mut target = target_in(temp.path(), "dev", Optimizations::None);
    target.notify_command = Some(failing_cmd());

    notify(&target, "message").await;
  }

  #[test]
  fn failure_message_names_output() {
    let temp = TempDir::new().unwrap();
    let target = target_in(temp.path(), "dev", Optimizations::None);
    let result = Err(BuildError::NotFound { id: "dev".to_string() });

    assert_eq!(
      pass_message(&target, &result),
      format!("Compiling \"{}\" failed.", target.output_to.display())
    );
  }

  #[tokio::test]
  async fn test_commands_report_each_outcome() {
    let temp = TempDir::new().unwrap();
    let toml = format!(
      "[test-commands]\nok = [{}]\nbroken = [{}]\n",
      quoted(&shell_cmd("echo fine")),
      quoted(&failing_cmd()),
    );
    let desc = description(temp.path(), &toml);

    let all = run_test_commands(&desc, &[]).await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|(name, r)| name == "broken" && r.is_err()));
    assert!(all.iter().any(|(name, r)| name == "ok" && r.as_deref().ok() == Some("fine")));

    let one = run_test_commands(&desc, &["ok".to_string()]).await.unwrap();
    assert_eq!(one.len(), 1);
  }

  #[tokio::test]
  async fn unknown_test_command_is_error() {
    let temp = TempDir::new().unwrap();
    let desc = description(temp.path(), "");

    let err = run_test_commands(&desc, &["missing".to_string()]).await.unwrap_err();
    assert!(matches!(err, HookError::UnknownTest(name) if name == "missing"));
  }
}
