//! Terminal output for build reports, warnings, and watch sessions.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use jsbuild_lib::build::BuildReport;
use jsbuild_lib::compile::Warning;
use jsbuild_lib::watch::SessionStatus;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

const SUCCESS: &str = "✓";
const ERROR: &str = "✗";
const WARNING: &str = "⚠";
const INFO: &str = "•";

/// Artifact size, in the largest unit that keeps it at one or more.
pub fn format_size(bytes: u64) -> String {
  const KB: u64 = 1024;
  const MB: u64 = KB * 1024;

  if bytes >= MB {
    format!("{:.1} MB", bytes as f64 / MB as f64)
  } else if bytes >= KB {
    format!("{:.1} KB", bytes as f64 / KB as f64)
  } else {
    format!("{} B", bytes)
  }
}

/// Pass duration: milliseconds below one second.
pub fn format_elapsed(elapsed: Duration) -> String {
  if elapsed < Duration::from_secs(1) {
    format!("{}ms", elapsed.as_millis())
  } else {
    format!("{:.2}s", elapsed.as_secs_f64())
  }
}

/// One-line summary of what a build produced.
pub fn build_summary(report: &BuildReport) -> String {
  let stats = &report.stats;
  let files = stats.files_compiled + stats.files_reused;
  let mut summary = format!(
    "{}: {} from {} {}",
    report.target,
    format_size(report.size),
    files,
    if files == 1 { "file" } else { "files" }
  );
  if stats.files_reused > 0 {
    summary.push_str(&format!(" ({} reused)", stats.files_reused));
  }
  if stats.renamed > 0 {
    summary.push_str(&format!(", {} renamed", stats.renamed));
  }
  if !report.host_bindings.is_empty() {
    summary.push_str(&format!(", {} host bindings", report.host_bindings.len()));
  }
  if !report.artifact_written {
    summary.push_str(", artifact unchanged");
  }
  summary
}

pub fn warning_line(warning: &Warning) -> String {
  format!("warning[{}]: {}", warning.category.as_str(), warning.message)
}

/// Final line for a stopped watch session.
pub fn session_summary(status: &SessionStatus) -> String {
  let passes = if status.passes == 1 { "pass" } else { "passes" };
  match status.failures {
    0 => format!("Stopped watching {} after {} {}", status.target, status.passes, passes),
    failed => format!(
      "Stopped watching {} after {} {} ({} failed)",
      status.target, status.passes, passes, failed
    ),
  }
}

pub fn print_build(report: &BuildReport) {
  print_success(&format!(
    "Successfully compiled \"{}\" in {}",
    report.artifact.display(),
    format_elapsed(report.elapsed)
  ));
  println!("  {}", build_summary(report).if_supports_color(Stream::Stdout, |s| s.dimmed()));
  for warning in &report.warnings {
    eprintln!(
      "  {} {}",
      WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
      warning_line(warning).if_supports_color(Stream::Stderr, |s| s.yellow())
    );
  }
}

pub fn print_session(status: &SessionStatus) {
  if status.failures == 0 {
    print_success(&session_summary(status));
  } else {
    print_error(&session_summary(status));
  }
  if let Some(err) = &status.last_error {
    eprintln!("  last error: {}", err);
  }
}

pub fn print_success(message: &str) {
  println!("{} {}", SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()), message);
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_info(message: &str) {
  println!("{} {}", INFO.if_supports_color(Stream::Stdout, |s| s.blue()), message);
}

/// An indented `label: value` line under a heading.
pub fn print_field(label: &str, value: &str) {
  println!("  {}: {}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()), value);
}

pub fn print_item(item: &str) {
  println!("  - {}", item.if_supports_color(Stream::Stdout, |s| s.dimmed()));
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
  println!("{}", json);
  Ok(())
}
