//! Watch sessions: recompile a target whenever its sources change.
//!
//! Each target gets its own [`WatchSession`] with lifecycle
//! `Starting -> Observing -> (Recompiling -> Observing)* -> Stopped`.
//! File-system events are forwarded from `notify` into a tokio channel and
//! consumed by a single task, so at most one pass runs at a time. After the
//! first relevant event the task waits for a quiet debounce window, draining
//! further events, then runs one pass. Events that arrive while a pass is
//! running stay queued and coalesce into the next pass.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::build::{BuildReport, TargetBuilder};
use crate::config::BuildTarget;
use crate::consts::SOURCE_EXTENSION;
use crate::error::BuildError;
use crate::hooks;

type EventResult = notify::Result<Event>;

#[derive(Debug, Error)]
pub enum WatchError {
  #[error("failed to watch {path}: {source}")]
  Notify {
    path: PathBuf,
    #[source]
    source: notify::Error,
  },

  #[error("watch task failed: {0}")]
  Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
  Starting,
  Observing,
  Recompiling,
  Stopped,
}

/// Snapshot of a session, published after every state change.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
  pub target: String,
  pub state: SessionState,
  /// Completed passes, including the initial one.
  pub passes: usize,
  /// Passes that ended in an error.
  pub failures: usize,
  /// Error of the most recent pass, cleared by a successful pass.
  pub last_error: Option<String>,
  #[serde(skip)]
  pub last_report: Option<BuildReport>,
}

impl SessionStatus {
  fn new(target: &str) -> Self {
    Self {
      target: target.to_string(),
      state: SessionState::Starting,
      passes: 0,
      failures: 0,
      last_error: None,
      last_report: None,
    }
  }
}

/// A running watch session for one target.
///
/// Dropping the session without [`WatchSession::stop`] also ends the task
/// once its current pass finishes.
pub struct WatchSession {
  target: String,
  watcher: Option<RecommendedWatcher>,
  stop: Option<oneshot::Sender<()>>,
  status: watch::Receiver<SessionStatus>,
  task: JoinHandle<()>,
}

impl WatchSession {
  /// Start observing the target's source paths. Runs an initial pass right
  /// away. Must be called inside a tokio runtime.
  pub fn start(target: BuildTarget, debounce: Duration) -> Result<Self, BuildError> {
    for root in &target.source_paths {
      if !root.exists() {
        return Err(BuildError::SourceNotFound {
          target: target.id.clone(),
          path: root.clone(),
        });
      }
    }

    let (tx, rx) = mpsc::unbounded_channel::<EventResult>();
    let notify_err = |path: &Path, source: notify::Error| BuildError::Watch {
      target: target.id.clone(),
      source: WatchError::Notify {
        path: path.to_path_buf(),
        source,
      },
    };

    let mut watcher = notify::recommended_watcher(move |res| {
      let _ = tx.send(res);
    })
    .map_err(|source| notify_err(Path::new("."), source))?;

    for root in &target.source_paths {
      watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|source| notify_err(root, source))?;
      debug!(target = %target.id, path = %root.display(), "watching");
    }

    let mut session = Self::spawn(target, debounce, rx);
    session.watcher = Some(watcher);
    Ok(session)
  }

  /// Start a session fed by an existing event channel.
  pub(crate) fn spawn(target: BuildTarget, debounce: Duration, events: mpsc::UnboundedReceiver<EventResult>) -> Self {
    let id = target.id.clone();
    let (stop_tx, stop_rx) = oneshot::channel();
    let (status_tx, status_rx) = watch::channel(SessionStatus::new(&id));

    info!(target = %id, debounce_ms = debounce.as_millis() as u64, "watch session starting");
    let task = tokio::spawn(run(TargetBuilder::new(target), debounce, events, stop_rx, status_tx));

    Self {
      target: id,
      watcher: None,
      stop: Some(stop_tx),
      status: status_rx,
      task,
    }
  }

  pub fn target(&self) -> &str {
    &self.target
  }

  pub fn status(&self) -> SessionStatus {
    self.status.borrow().clone()
  }

  /// Receiver notified on every status change.
  pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
    self.status.clone()
  }

  /// Stop observing, let any in-flight pass finish, and return the final status.
  pub async fn stop(mut self) -> Result<SessionStatus, WatchError> {
    drop(self.watcher.take());
    if let Some(stop) = self.stop.take() {
      let _ = stop.send(());
    }
    (&mut self.task).await?;
    info!(target = %self.target, "watch session stopped");
    Ok(self.status.borrow().clone())
  }
}

async fn run(
  mut builder: TargetBuilder,
  debounce: Duration,
  mut events: mpsc::UnboundedReceiver<EventResult>,
  mut stop: oneshot::Receiver<()>,
  status: watch::Sender<SessionStatus>,
) {
  builder = run_pass(builder, &status).await;

  'session: loop {
    status.send_modify(|s| s.state = SessionState::Observing);

    let first = tokio::select! {
      biased;
      _ = &mut stop => break,
      event = events.recv() => event,
    };
    match first {
      None => break,
      Some(event) if !is_relevant(builder.target(), &event) => continue,
      Some(_) => {}
    }

    // Only relevant events restart the quiet window.
    let mut coalesced = 1usize;
    let quiet = tokio::time::sleep(debounce);
    tokio::pin!(quiet);
    loop {
      tokio::select! {
        biased;
        _ = &mut stop => break 'session,
        _ = &mut quiet => break,
        event = events.recv() => match event {
          None => break,
          Some(event) if is_relevant(builder.target(), &event) => {
            coalesced += 1;
            quiet.as_mut().reset(tokio::time::Instant::now() + debounce);
          }
          Some(_) => {}
        },
      }
    }
    debug!(target = %builder.target().id, events = coalesced, "sources changed");

    builder = run_pass(builder, &status).await;
  }

  status.send_modify(|s| s.state = SessionState::Stopped);
}

/// Run one pass on the blocking pool and publish its outcome.
async fn run_pass(builder: TargetBuilder, status: &watch::Sender<SessionStatus>) -> TargetBuilder {
  status.send_modify(|s| s.state = SessionState::Recompiling);
  let target = builder.target().clone();

  let joined = tokio::task::spawn_blocking(move || {
    let mut builder = builder;
    let result = builder.pass();
    (builder, result)
  })
  .await;

  let (builder, result) = match joined {
    Ok(pair) => pair,
    Err(source) => (
      TargetBuilder::new(target.clone()),
      Err(BuildError::Task {
        target: target.id.clone(),
        source,
      }),
    ),
  };

  if let Err(err) = &result {
    error!(target = %target.id, error = %err, "compile pass failed");
  }
  hooks::notify(&target, &hooks::pass_message(&target, &result)).await;

  status.send_modify(|s| {
    s.passes += 1;
    match result {
      Ok(report) => {
        s.last_error = None;
        s.last_report = Some(report);
      }
      Err(err) => {
        s.failures += 1;
        s.last_error = Some(err.to_string());
      }
    }
  });

  builder
}

/// Whether an event should trigger a pass: a non-access change to a source
/// file that is not one of the target's own outputs.
pub(crate) fn is_relevant(target: &BuildTarget, event: &EventResult) -> bool {
  let event = match event {
    Ok(event) => event,
    Err(err) => {
      warn!(target = %target.id, error = %err, "watch error");
      return false;
    }
  };
  if matches!(event.kind, EventKind::Access(_)) {
    return false;
  }
  event.paths.iter().any(|path| {
    path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) && !target.is_output(path)
  })
}
