//! Build passes: compile a target and write its outputs.
//!
//! [`TargetBuilder`] wraps a [`Compiler`] and owns the write side of a pass:
//! the artifact at `output-to`, its source map, and per-source files under
//! `output-dir`. [`compile`] is the entry point for both invocation modes.

use std::fs;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::compile::{CompileStats, Compiler, HostBindingTable, Warning};
use crate::config::BuildTarget;
use crate::error::BuildError;
use crate::externs::ExternDeclaration;
use crate::hooks;
use crate::watch::{SessionStatus, WatchSession};

/// How [`compile`] runs a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileMode {
  /// One full compilation, then return.
  Once,
  /// Observe the sources and recompile on change until shut down.
  Watch,
}

/// What a finished [`compile`] call produced.
#[derive(Debug)]
pub enum CompileOutcome {
  Once(BuildReport),
  Watched(SessionStatus),
}

/// Summary of one successful build pass.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
  pub target: String,
  pub artifact: PathBuf,
  /// Size of the artifact in bytes.
  pub size: u64,
  /// Whether the artifact content changed on disk.
  pub artifact_written: bool,
  /// Files rewritten under `output-dir`.
  pub intermediates_written: usize,
  pub stats: CompileStats,
  pub warnings: Vec<Warning>,
  #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
  pub elapsed: Duration,
  pub host_bindings: HostBindingTable,
}

fn as_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.serialize_u64(elapsed.as_millis() as u64)
}

/// Runs build passes for one target, keeping the compiler cache between them.
#[derive(Debug)]
pub struct TargetBuilder {
  compiler: Compiler,
}

impl TargetBuilder {
  pub fn new(target: BuildTarget) -> Self {
    Self {
      compiler: Compiler::new(target),
    }
  }

  pub fn target(&self) -> &BuildTarget {
    self.compiler.target()
  }

  pub fn apply_externs(&mut self, decls: impl IntoIterator<Item = ExternDeclaration>) {
    self.compiler.apply_externs(decls);
  }

  /// Compile and write outputs.
  ///
  /// Nothing is written when compilation fails, so a broken pass leaves the
  /// previous artifact in place.
  pub fn pass(&mut self) -> Result<BuildReport, BuildError> {
    let start = Instant::now();
    let id = self.target().id.clone();

    let output = self
      .compiler
      .compile()
      .map_err(|err| BuildError::from_compile(&id, err))?;
    let target = self.compiler.target();

    let artifact_written = write_output(&id, &target.output_to, &output.artifact)?;
    if let Some(map) = &output.source_map {
      write_output(&id, &target.source_map_path(), map)?;
    }

    let mut intermediates_written = 0;
    if let Some(dir) = &target.output_dir {
      for unit in &output.units {
        if write_output(&id, &dir.join(&unit.relative), &unit.code)? {
          intermediates_written += 1;
        }
      }
    }

    for warning in &output.warnings {
      warn!(target = %id, category = warning.category.as_str(), "{}", warning.message);
    }

    let elapsed = start.elapsed();
    info!(
      target = %id,
      artifact = %target.output_to.display(),
      compiled = output.stats.files_compiled,
      reused = output.stats.files_reused,
      renamed = output.stats.renamed,
      elapsed_ms = elapsed.as_millis() as u64,
      "build finished"
    );

    Ok(BuildReport {
      target: id,
      artifact: target.output_to.clone(),
      size: output.artifact.len() as u64,
      artifact_written,
      intermediates_written,
      stats: output.stats,
      warnings: output.warnings,
      elapsed,
      host_bindings: output.host_bindings,
    })
  }
}

/// Compile a target once with a fresh compiler.
pub fn run_once(target: &BuildTarget) -> Result<BuildReport, BuildError> {
  TargetBuilder::new(target.clone()).pass()
}

/// Compile `target` in the given mode.
///
/// `Once` runs a single pass on the blocking pool and notifies. `Watch` starts
/// a [`WatchSession`], waits for `shutdown`, then stops the session and
/// returns its final status. Watch-mode compile failures are reported per pass
/// and never end the session.
pub async fn compile(
  target: &BuildTarget,
  mode: CompileMode,
  debounce: Duration,
  shutdown: impl Future<Output = ()>,
) -> Result<CompileOutcome, BuildError> {
  match mode {
    CompileMode::Once => {
      let owned = target.clone();
      let result = tokio::task::spawn_blocking(move || run_once(&owned))
        .await
        .map_err(|source| BuildError::Task {
          target: target.id.clone(),
          source,
        })
        .and_then(|result| result);
      hooks::notify(target, &hooks::pass_message(target, &result)).await;
      result.map(CompileOutcome::Once)
    }
    CompileMode::Watch => {
      let session = WatchSession::start(target.clone(), debounce)?;
      shutdown.await;
      let status = session.stop().await.map_err(|source| BuildError::Watch {
        target: target.id.clone(),
        source,
      })?;
      Ok(CompileOutcome::Watched(status))
    }
  }
}

/// Write `content` to `path` unless it already holds exactly that content.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// watcher or browser never sees a half-written artifact.
fn write_output(target: &str, path: &Path, content: &str) -> Result<bool, BuildError> {
  let io_err = |source: io::Error| BuildError::Write {
    target: target.to_string(),
    path: path.to_path_buf(),
    source,
  };

  if fs::read(path).is_ok_and(|existing| existing == content.as_bytes()) {
    debug!(path = %path.display(), "output unchanged");
    return Ok(false);
  }

  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).map_err(io_err)?;
  }
  let mut temp = path.as_os_str().to_owned();
  temp.push(".tmp");
  let temp = PathBuf::from(temp);

  fs::write(&temp, content).map_err(io_err)?;
  fs::rename(&temp, path).map_err(io_err)?;
  debug!(path = %path.display(), bytes = content.len(), "wrote output");
  Ok(true)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Optimizations;
  use crate::util::testutil::{append_args_to, target_in, write_file};
  use tempfile::TempDir;
  use tracing_test::traced_test;

  #[test]
  fn once_writes_exactly_one_artifact() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "src/main.js", "var a = 1;\n");
    let target = target_in(temp.path(), "dev", Optimizations::None);

    let report = run_once(&target).unwrap();

    assert_eq!(report.target, "dev");
    assert!(report.artifact_written);
    assert_eq!(fs::read_to_string(&target.output_to).unwrap(), "var a = 1;\n");
    let entries: Vec<_> = fs::read_dir(temp.path().join("out")).unwrap().collect();
    assert_eq!(entries.len(), 1);
  }

  #[test]
  fn unchanged_artifact_is_not_rewritten() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "src/main.js", "var a = 1;\n");
    let mut builder = TargetBuilder::new(target_in(temp.path(), "dev", Optimizations::None));

    assert!(builder.pass().unwrap().artifact_written);
    let second = builder.pass().unwrap();

    assert!(!second.artifact_written);
    assert_eq!(second.stats.files_reused, 1);
  }

  #[test]
  fn writes_source_map_and_intermediates() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "src/a.js", "var a = 1;\n");
    write_file(temp.path(), "src/lib/b.js", "var b = 2;\n");
    let target = target_in(temp.path(), "dev", Optimizations::None)
      .with_source_map(true)
      .with_output_dir(temp.path().join("out").join("parts"));

    let report = run_once(&target).unwrap();

    assert_eq!(report.intermediates_written, 2);
    assert!(target.source_map_path().exists());
    let part = temp.path().join("out").join("parts").join("src").join("lib").join("b.js");
    assert_eq!(fs::read_to_string(part).unwrap(), "var b = 2;\n");
  }

  #[test]
  fn failed_pass_keeps_previous_artifact() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "src/main.js", "var a = 1;\n");
    let mut builder = TargetBuilder::new(target_in(temp.path(), "dev", Optimizations::None));
    builder.pass().unwrap();

    write_file(temp.path(), "src/main.js", "var a = 'broken;\n");
    let err = builder.pass().unwrap_err();

    assert!(matches!(err, BuildError::Compile { ref target, .. } if target == "dev"));
    assert_eq!(
      fs::read_to_string(&builder.target().output_to).unwrap(),
      "var a = 1;\n"
    );
  }

  #[test]
  fn missing_source_is_source_not_found() {
    let temp = TempDir::new().unwrap();
    let err = run_once(&target_in(temp.path(), "dev", Optimizations::None)).unwrap_err();
    assert!(matches!(err, BuildError::SourceNotFound { .. }));
  }

  #[test]
  #[traced_test]
  fn pass_logs_warnings() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "src/main.js", "var a = 1;\n");
    write_file(temp.path(), "vendor/README", "not a source\n");
    let mut target = target_in(temp.path(), "dev", Optimizations::None);
    target.source_paths.push(temp.path().join("vendor"));

    let report = run_once(&target).unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert!(logs_contain("empty-source-path"));
    assert!(logs_contain("build finished"));
  }

  #[test]
  fn report_serializes_elapsed_as_millis() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "src/main.js", "var a = 1;\n");

    let report = run_once(&target_in(temp.path(), "dev", Optimizations::None)).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert!(json["elapsed_ms"].is_u64());
    assert_eq!(json["stats"]["files_compiled"], 1);
  }

  #[tokio::test]
  async fn compile_once_notifies() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "src/main.js", "var a = 1;\n");
    let log = temp.path().join("notify.log");
    let mut target = target_in(temp.path(), "dev", Optimizations::None);
    target.notify_command = Some(append_args_to(&log));

    let outcome = compile(&target, CompileMode::Once, Duration::from_millis(10), async {})
      .await
      .unwrap();

    assert!(matches!(outcome, CompileOutcome::Once(_)));
    let message = fs::read_to_string(&log).unwrap();
    assert!(message.starts_with("Successfully compiled"), "{}", message);
  }

  #[tokio::test]
  async fn compile_watch_runs_until_shutdown() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "src/main.js", "var a = 1;\n");
    let target = target_in(temp.path(), "dev", Optimizations::None);
    let output = target.output_to.clone();

    let outcome = compile(&target, CompileMode::Watch, Duration::from_millis(10), async move {
      for _ in 0..200 {
        if output.exists() {
          break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
      }
    })
    .await
    .unwrap();

    match outcome {
      CompileOutcome::Watched(status) => assert!(status.passes >= 1),
      other => panic!("unexpected outcome: {:?}", other),
    }
  }
}
