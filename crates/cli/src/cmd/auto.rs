//! Implementation of the `jsbuild auto` command.
//!
//! Starts one watch session per selected build and keeps them running until
//! Ctrl-C. Compile failures are reported per pass and never end a session.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tokio::sync::watch;
use tokio::task::JoinSet;

use jsbuild_lib::build::{CompileMode, CompileOutcome, compile};
use jsbuild_lib::config::{BuildTarget, HookStage};
use jsbuild_lib::error::BuildError;
use jsbuild_lib::hooks::run_hooks;
use jsbuild_lib::watch::SessionStatus;

use super::{load_description, runtime};
use crate::output::{OutputFormat, print_error, print_info, print_json, print_session};

type SessionResult = (String, Result<CompileOutcome, BuildError>);

pub fn cmd_auto(config: &Path, ids: &[String], output: OutputFormat) -> Result<()> {
  let desc = load_description(config)?;
  let targets: Vec<BuildTarget> = desc.select_targets(ids)?.into_iter().cloned().collect();
  if targets.is_empty() {
    bail!("No builds to watch in {}", config.display());
  }
  let debounce = desc.watch_debounce();

  let rt = runtime()?;
  let results = rt.block_on(async {
    run_hooks(&desc, HookStage::PreBuild).await.context("pre-build hook failed")?;

    let (shutdown, _) = watch::channel(false);
    let mut sessions: JoinSet<SessionResult> = JoinSet::new();
    for target in targets {
      let mut stopped = shutdown.subscribe();
      sessions.spawn(async move {
        let signal = async move {
          let _ = stopped.wait_for(|stop| *stop).await;
        };
        let result = compile(&target, CompileMode::Watch, debounce, signal).await;
        (target.id, result)
      });
    }

    if !output.is_json() {
      print_info("Watching for changes. Press Ctrl-C to stop.");
    }

    let mut results = Vec::new();
    tokio::select! {
      signal = tokio::signal::ctrl_c() => signal.context("Failed to listen for Ctrl-C")?,
      // A session only ends on its own when it could not start.
      Some(joined) = sessions.join_next() => results.push(joined.context("watch task panicked")?),
    }

    let _ = shutdown.send(true);
    while let Some(joined) = sessions.join_next().await {
      results.push(joined.context("watch task panicked")?);
    }
    anyhow::Ok(results)
  })?;

  let mut failed = 0;
  let mut statuses: Vec<&SessionStatus> = Vec::new();
  for (id, result) in &results {
    match result {
      Ok(CompileOutcome::Watched(status)) => statuses.push(status),
      Ok(CompileOutcome::Once(_)) => {}
      Err(err) => {
        failed += 1;
        if !output.is_json() {
          print_error(&format!("Build {} could not be watched: {}", id, err));
        }
      }
    }
  }

  if output.is_json() {
    print_json(&serde_json::json!({ "sessions": statuses }))?;
  } else {
    for status in &statuses {
      print_session(status);
    }
  }

  if failed > 0 {
    bail!("{} of {} watch sessions failed", failed, results.len());
  }
  Ok(())
}
