use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_WATCH_DEBOUNCE_MS, SOURCE_MAP_EXTENSION};

/// How aggressively a target is optimized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Optimizations {
  /// Sources are concatenated as written; no identifier is ever renamed.
  #[default]
  None,
  /// Unprotected identifiers are renamed and whitespace is minimized.
  Advanced,
}

impl Optimizations {
  pub fn as_str(self) -> &'static str {
    match self {
      Optimizations::None => "none",
      Optimizations::Advanced => "advanced",
    }
  }
}

impl std::fmt::Display for Optimizations {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Diagnostic categories that `closure-warnings` can switch on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningCategory {
  /// The same symbol path is declared by more than one extern.
  DuplicateExterns,
  /// A source root contains no compilable files.
  EmptySourcePath,
  /// An `@export` marker names a symbol that externs already protect.
  RedundantExport,
}

impl WarningCategory {
  pub fn as_str(self) -> &'static str {
    match self {
      WarningCategory::DuplicateExterns => "duplicate-externs",
      WarningCategory::EmptySourcePath => "empty-source-path",
      WarningCategory::RedundantExport => "redundant-export",
    }
  }
}

impl std::fmt::Display for WarningCategory {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningLevel {
  On,
  Off,
}

/// When a hook runs relative to an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookStage {
  PreBuild,
  PostBuild,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Hook {
  pub stage: HookStage,
  pub command: Vec<String>,
}

/// A named build configuration producing one artifact from one set of sources.
///
/// All paths are absolute once the target has been loaded through
/// [`BuildDescription`](super::BuildDescription).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BuildTarget {
  pub id: String,
  pub source_paths: Vec<PathBuf>,
  pub output_to: PathBuf,
  #[serde(default)]
  pub output_dir: Option<PathBuf>,
  #[serde(default)]
  pub optimizations: Optimizations,
  #[serde(default)]
  pub pretty_print: bool,
  #[serde(default)]
  pub source_map: bool,
  #[serde(default)]
  pub externs: Vec<PathBuf>,
  #[serde(default)]
  pub closure_warnings: BTreeMap<WarningCategory, WarningLevel>,
  /// Run after every compile pass with a status message appended.
  #[serde(default)]
  pub notify_command: Option<Vec<String>>,
  /// Keep `js/` host references out of renaming.
  #[serde(default = "default_true")]
  pub protect_host_refs: bool,
}

fn default_true() -> bool {
  true
}

impl BuildTarget {
  /// Create a target with default flags.
  pub fn new(id: impl Into<String>, source_paths: Vec<PathBuf>, output_to: impl Into<PathBuf>) -> Self {
    Self {
      id: id.into(),
      source_paths,
      output_to: output_to.into(),
      output_dir: None,
      optimizations: Optimizations::None,
      pretty_print: false,
      source_map: false,
      externs: Vec::new(),
      closure_warnings: BTreeMap::new(),
      notify_command: None,
      protect_host_refs: true,
    }
  }

  pub fn with_optimizations(mut self, optimizations: Optimizations) -> Self {
    self.optimizations = optimizations;
    self
  }

  pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.output_dir = Some(dir.into());
    self
  }

  pub fn with_externs(mut self, externs: Vec<PathBuf>) -> Self {
    self.externs = externs;
    self
  }

  pub fn with_source_map(mut self, enabled: bool) -> Self {
    self.source_map = enabled;
    self
  }

  pub fn with_pretty_print(mut self, enabled: bool) -> Self {
    self.pretty_print = enabled;
    self
  }

  /// Whether a warning category is reported. Every category defaults to on.
  pub fn warning_enabled(&self, category: WarningCategory) -> bool {
    !matches!(self.closure_warnings.get(&category), Some(WarningLevel::Off))
  }

  /// Path of the source map written next to the artifact.
  pub fn source_map_path(&self) -> PathBuf {
    let mut name = self.output_to.as_os_str().to_owned();
    name.push(".");
    name.push(SOURCE_MAP_EXTENSION);
    PathBuf::from(name)
  }

  /// Whether `path` is one of the files or directories this target writes.
  pub fn is_output(&self, path: &Path) -> bool {
    if path == self.output_to || path == self.source_map_path() {
      return true;
    }
    self.output_dir.as_deref().is_some_and(|dir| path.starts_with(dir))
  }
}

/// Global settings shared by every target of a description.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
  pub plugins: Vec<String>,
  pub hooks: Vec<Hook>,
  pub watch_debounce: Duration,
  pub test_commands: BTreeMap<String, Vec<String>>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      plugins: Vec::new(),
      hooks: Vec::new(),
      watch_debounce: Duration::from_millis(DEFAULT_WATCH_DEBOUNCE_MS),
      test_commands: BTreeMap::new(),
    }
  }
}

/// On-disk shape of a build description, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub(crate) struct DescriptionFile {
  #[serde(default)]
  pub plugins: Vec<String>,
  #[serde(default)]
  pub hooks: Vec<Hook>,
  #[serde(default)]
  pub watch_debounce: Option<String>,
  #[serde(default)]
  pub test_commands: BTreeMap<String, Vec<String>>,
  #[serde(default)]
  pub builds: Vec<BuildTarget>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn warnings_default_to_on() {
    let mut target = BuildTarget::new("dev", vec![PathBuf::from("src")], "out/main.js");
    assert!(target.warning_enabled(WarningCategory::DuplicateExterns));

    target
      .closure_warnings
      .insert(WarningCategory::DuplicateExterns, WarningLevel::Off);
    assert!(!target.warning_enabled(WarningCategory::DuplicateExterns));
    assert!(target.warning_enabled(WarningCategory::EmptySourcePath));
  }

  #[test]
  fn source_map_sits_next_to_artifact() {
    let target = BuildTarget::new("dev", vec![], "/p/out/main.js");
    assert_eq!(target.source_map_path(), PathBuf::from("/p/out/main.js.map"));
  }

  #[test]
  fn outputs_include_map_and_output_dir() {
    let target = BuildTarget::new("dev", vec![], "/p/out/main.js").with_output_dir("/p/out/dev");

    assert!(target.is_output(Path::new("/p/out/main.js")));
    assert!(target.is_output(Path::new("/p/out/main.js.map")));
    assert!(target.is_output(Path::new("/p/out/dev/app/core.js")));
    assert!(!target.is_output(Path::new("/p/src/app/core.js")));
  }
}
