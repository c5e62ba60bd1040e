//! Implementation of the `jsbuild clean` command.

use std::path::Path;

use anyhow::{Context, Result};

use jsbuild_lib::clean::clean_all;

use super::load_description;
use crate::output::{OutputFormat, print_info, print_json, print_item, print_success};

pub fn cmd_clean(config: &Path, output: OutputFormat) -> Result<()> {
  let desc = load_description(config)?;
  let removed = clean_all(&desc.builds).context("Failed to remove build outputs")?;

  if output.is_json() {
    print_json(&serde_json::json!({ "removed": removed }))?;
  } else if removed.is_empty() {
    print_info("Nothing to clean");
  } else {
    print_success(&format!("Removed {} path(s)", removed.len()));
    for path in &removed {
      print_item(&path.display().to_string());
    }
  }

  Ok(())
}
