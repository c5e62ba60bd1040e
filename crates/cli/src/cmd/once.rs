//! Implementation of the `jsbuild once` command.

use std::path::Path;

use anyhow::{Context, Result, bail};

use jsbuild_lib::config::HookStage;
use jsbuild_lib::hooks::run_hooks;

use super::{compile_targets, load_description, print_results, results_json, runtime};
use crate::output::{OutputFormat, print_json};

/// Compile the selected builds once.
///
/// Pre-build hooks run first. Every selected build is attempted even when an
/// earlier one fails; post-build hooks run only when all of them succeed.
pub fn cmd_once(config: &Path, ids: &[String], output: OutputFormat) -> Result<()> {
  let desc = load_description(config)?;
  let targets = desc.select_targets(ids)?;

  let rt = runtime()?;
  let results = rt.block_on(async {
    run_hooks(&desc, HookStage::PreBuild).await.context("pre-build hook failed")?;
    anyhow::Ok(compile_targets(&targets).await)
  })?;

  let failed = if output.is_json() {
    print_json(&results_json(&results))?;
    results.iter().filter(|(_, r)| r.is_err()).count()
  } else {
    print_results(&results)
  };

  if failed > 0 {
    bail!("{} of {} builds failed", failed, results.len());
  }

  rt.block_on(run_hooks(&desc, HookStage::PostBuild))
    .context("post-build hook failed")?;
  Ok(())
}
