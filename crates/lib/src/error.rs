//! Top-level error type for build invocations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::compile::CompileError;
use crate::config::ConfigError;
use crate::watch::WatchError;

/// Errors reported for a build invocation.
///
/// Configuration and lookup errors abort before any compilation. Compile
/// errors abort a single `once` pass; watch sessions report them per pass
/// and keep observing.
#[derive(Debug, Error)]
pub enum BuildError {
  /// The build description is missing or malformed.
  #[error(transparent)]
  Config(#[from] ConfigError),

  /// No target carries the requested id.
  #[error("no build with id {id:?}")]
  NotFound { id: String },

  /// A configured source path or extern file does not exist.
  #[error("build {target}: source not found: {path}")]
  SourceNotFound { target: String, path: PathBuf },

  /// Compilation failed with a diagnostic.
  #[error("build {target} failed: {source}")]
  Compile {
    target: String,
    #[source]
    source: CompileError,
  },

  /// A watch session could not observe its sources.
  #[error("build {target}: {source}")]
  Watch {
    target: String,
    #[source]
    source: WatchError,
  },

  /// A compile pass panicked on the blocking pool.
  #[error("build {target}: compile task failed: {source}")]
  Task {
    target: String,
    #[source]
    source: tokio::task::JoinError,
  },

  /// An output could not be written.
  #[error("build {target}: failed to write {path}: {source}")]
  Write {
    target: String,
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

impl BuildError {
  /// Attach a target id to a compiler error.
  pub fn from_compile(target: &str, err: CompileError) -> Self {
    match err {
      CompileError::SourceNotFound { path } => BuildError::SourceNotFound {
        target: target.to_string(),
        path,
      },
      source => BuildError::Compile {
        target: target.to_string(),
        source,
      },
    }
  }
}
