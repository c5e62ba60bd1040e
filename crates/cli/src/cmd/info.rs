//! Implementation of the `jsbuild info` command.

use std::path::Path;

use anyhow::Result;

use super::load_description;
use crate::output::{OutputFormat, format_elapsed, print_field, print_info, print_json};

pub fn cmd_info(config: &Path, output: OutputFormat) -> Result<()> {
  let desc = load_description(config)?;

  if output.is_json() {
    let tests: Vec<_> = desc.test_commands().keys().collect();
    print_json(&serde_json::json!({
      "config": config,
      "root": desc.root,
      "plugins": desc.settings.plugins,
      "watch_debounce_ms": desc.watch_debounce().as_millis() as u64,
      "test_commands": tests,
      "builds": desc.builds,
    }))?;
    return Ok(());
  }

  print_info(&format!("Build description: {}", config.display()));
  print_field("Watch debounce", &format_elapsed(desc.watch_debounce()));
  if !desc.settings.plugins.is_empty() {
    print_field("Plugins", &desc.settings.plugins.join(", "));
  }

  for target in &desc.builds {
    println!();
    println!("{}", target.id);
    print_field("Optimizations", target.optimizations.as_str());
    print_field("Output", &target.output_to.display().to_string());
    for source in &target.source_paths {
      print_field("Source", &source.display().to_string());
    }
    if !target.externs.is_empty() {
      print_field("Externs", &target.externs.len().to_string());
    }
  }

  Ok(())
}
