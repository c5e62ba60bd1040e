//! Removal of build outputs.

use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::BuildTarget;

/// Remove a target's artifact, source map, and `output-dir`.
///
/// Returns the paths that existed and were removed. Missing outputs are not
/// an error.
pub fn clean_target(target: &BuildTarget) -> io::Result<Vec<PathBuf>> {
  let mut removed = Vec::new();

  for file in [target.output_to.clone(), target.source_map_path()] {
    match fs::remove_file(&file) {
      Ok(()) => removed.push(file),
      Err(err) if err.kind() == io::ErrorKind::NotFound => {}
      Err(err) => return Err(err),
    }
  }

  if let Some(dir) = &target.output_dir
    && dir.exists()
  {
    fs::remove_dir_all(dir)?;
    removed.push(dir.clone());
  }

  debug!(target = %target.id, removed = removed.len(), "cleaned");
  Ok(removed)
}

/// Clean every target, returning all removed paths.
pub fn clean_all<'a>(targets: impl IntoIterator<Item = &'a BuildTarget>) -> io::Result<Vec<PathBuf>> {
  let mut removed = Vec::new();
  for target in targets {
    removed.extend(clean_target(target)?);
  }
  info!(removed = removed.len(), "removed build outputs");
  Ok(removed)
}
