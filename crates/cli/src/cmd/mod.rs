mod auto;
mod clean;
mod info;
mod once;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use jsbuild_lib::build::{BuildReport, CompileMode, CompileOutcome, compile};
use jsbuild_lib::config::{BuildDescription, BuildTarget};
use jsbuild_lib::error::BuildError;

use crate::output::{print_build, print_error};

pub use auto::cmd_auto;
pub use clean::cmd_clean;
pub use info::cmd_info;
pub use once::cmd_once;
pub use test::cmd_test;

fn load_description(config: &Path) -> Result<BuildDescription> {
  BuildDescription::load(config).with_context(|| format!("Failed to load build description {}", config.display()))
}

fn runtime() -> Result<tokio::runtime::Runtime> {
  tokio::runtime::Runtime::new().context("Failed to create async runtime")
}

/// Compile each target once, in order. Every target is attempted.
async fn compile_targets(targets: &[&BuildTarget]) -> Vec<(String, Result<BuildReport, BuildError>)> {
  let mut results = Vec::with_capacity(targets.len());
  for target in targets {
    let result = match compile(target, CompileMode::Once, Duration::ZERO, std::future::ready(())).await {
      Ok(CompileOutcome::Once(report)) => Ok(report),
      // Only produced in watch mode.
      Ok(CompileOutcome::Watched(_)) => continue,
      Err(err) => Err(err),
    };
    results.push((target.id.clone(), result));
  }
  results
}

/// Print per-target results and count failures.
fn print_results(results: &[(String, Result<BuildReport, BuildError>)]) -> usize {
  let mut failed = 0;
  for (id, result) in results {
    match result {
      Ok(report) => print_build(report),
      Err(err) => {
        failed += 1;
        print_error(&format!("Build {} failed: {}", id, err));
      }
    }
  }
  failed
}

fn results_json(results: &[(String, Result<BuildReport, BuildError>)]) -> serde_json::Value {
  let builds: Vec<_> = results
    .iter()
    .map(|(id, result)| match result {
      Ok(report) => serde_json::json!({ "id": id, "ok": true, "report": report }),
      Err(err) => serde_json::json!({ "id": id, "ok": false, "error": err.to_string() }),
    })
    .collect();
  serde_json::json!({ "builds": builds })
}
