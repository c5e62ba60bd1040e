//! Build description loading and validation.
//!
//! A build description is a TOML file listing named targets plus global
//! settings:
//!
//! ```toml
//! plugins = ["jsbuild"]
//! watch-debounce = "150ms"
//!
//! [[hooks]]
//! stage = "pre-build"
//! command = ["npm", "run", "vendor"]
//!
//! [[builds]]
//! id = "release"
//! source-paths = ["src"]
//! output-to = "public/js/main.js"
//! output-dir = "target/release"
//! optimizations = "advanced"
//! externs = ["externs/jquery.js"]
//! closure-warnings = { duplicate-externs = "off" }
//! ```
//!
//! Validation runs before any compilation so a malformed description fails
//! fast with a [`ConfigError`]. Relative paths are resolved against the
//! directory holding the description.

mod types;

pub use types::*;

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::consts::{CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE};
use crate::error::BuildError;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read build description {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse build description {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("build #{index} has an empty id")]
  EmptyId { index: usize },

  #[error("duplicate build id: {0}")]
  DuplicateId(String),

  #[error("build {0} declares no source-paths")]
  NoSourcePaths(String),

  #[error("build {id} has an unusable output-to: {reason}")]
  InvalidOutput { id: String, reason: String },

  #[error("builds {first} and {second} both write {path}")]
  SharedOutput {
    path: PathBuf,
    first: String,
    second: String,
  },

  #[error("invalid watch-debounce {value:?}: {source}")]
  InvalidDuration {
    value: String,
    #[source]
    source: humantime::DurationError,
  },

  #[error("{context} has an empty command")]
  EmptyCommand { context: String },

  #[error("plugin listed twice: {0}")]
  DuplicatePlugin(String),
}

/// An ordered collection of build targets plus global settings.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildDescription {
  /// Directory relative paths were resolved against.
  pub root: PathBuf,
  pub settings: Settings,
  pub builds: Vec<BuildTarget>,
}

impl BuildDescription {
  /// Read and validate a description file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let root = path
      .parent()
      .filter(|p| !p.as_os_str().is_empty())
      .map(Path::to_path_buf)
      .unwrap_or_else(|| PathBuf::from("."));
    let root = dunce::canonicalize(&root).unwrap_or(root);

    Self::parse(&content, &root).map_err(|err| match err {
      ConfigError::Parse { source, .. } => ConfigError::Parse {
        path: path.to_path_buf(),
        source,
      },
      other => other,
    })
  }

  /// Parse and validate description text, resolving paths against `root`.
  pub fn parse(content: &str, root: &Path) -> Result<Self, ConfigError> {
    let file: DescriptionFile = toml::from_str(content).map_err(|source| ConfigError::Parse {
      path: root.to_path_buf(),
      source,
    })?;
    Self::from_file(file, root)
  }

  fn from_file(file: DescriptionFile, root: &Path) -> Result<Self, ConfigError> {
    let watch_debounce = match file.watch_debounce {
      Some(value) => humantime::parse_duration(&value).map_err(|source| ConfigError::InvalidDuration { value, source })?,
      None => Settings::default().watch_debounce,
    };

    let mut plugins = HashSet::new();
    for plugin in &file.plugins {
      if !plugins.insert(plugin.as_str()) {
        return Err(ConfigError::DuplicatePlugin(plugin.clone()));
      }
    }

    for (index, hook) in file.hooks.iter().enumerate() {
      if hook.command.is_empty() {
        return Err(ConfigError::EmptyCommand {
          context: format!("hook #{}", index),
        });
      }
    }

    for (name, command) in &file.test_commands {
      if command.is_empty() {
        return Err(ConfigError::EmptyCommand {
          context: format!("test command {}", name),
        });
      }
    }

    let builds = file
      .builds
      .into_iter()
      .map(|target| resolve_paths(target, root))
      .collect::<Vec<_>>();
    validate_builds(&builds)?;

    debug!(root = %root.display(), builds = builds.len(), "loaded build description");

    Ok(Self {
      root: root.to_path_buf(),
      settings: Settings {
        plugins: file.plugins,
        hooks: file.hooks,
        watch_debounce,
        test_commands: file.test_commands,
      },
      builds,
    })
  }

  /// Look up a target by id.
  pub fn resolve_target(&self, id: &str) -> Result<&BuildTarget, BuildError> {
    self
      .builds
      .iter()
      .find(|target| target.id == id)
      .ok_or_else(|| BuildError::NotFound { id: id.to_string() })
  }

  /// Resolve a list of ids, or every target when the list is empty.
  pub fn select_targets(&self, ids: &[String]) -> Result<Vec<&BuildTarget>, BuildError> {
    if ids.is_empty() {
      return Ok(self.builds.iter().collect());
    }
    ids.iter().map(|id| self.resolve_target(id)).collect()
  }

  pub fn hooks(&self, stage: HookStage) -> impl Iterator<Item = &Hook> {
    self.settings.hooks.iter().filter(move |hook| hook.stage == stage)
  }

  pub fn watch_debounce(&self) -> Duration {
    self.settings.watch_debounce
  }

  pub fn test_commands(&self) -> &BTreeMap<String, Vec<String>> {
    &self.settings.test_commands
  }
}

/// Pick the description path: explicit flag, then `JSBUILD_CONFIG`, then
/// `jsbuild.toml` in the working directory.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
  if let Some(path) = explicit {
    return path.to_path_buf();
  }
  match std::env::var(CONFIG_ENV_VAR) {
    Ok(value) if !value.is_empty() => PathBuf::from(value),
    _ => PathBuf::from(DEFAULT_CONFIG_FILE),
  }
}

fn resolve_paths(mut target: BuildTarget, root: &Path) -> BuildTarget {
  let absolute = |p: &PathBuf| if p.is_absolute() { p.clone() } else { root.join(p) };
  target.source_paths = target.source_paths.iter().map(absolute).collect();
  target.output_to = absolute(&target.output_to);
  target.output_dir = target.output_dir.as_ref().map(absolute);
  target.externs = target.externs.iter().map(absolute).collect();
  target
}

fn validate_builds(builds: &[BuildTarget]) -> Result<(), ConfigError> {
  let mut ids = HashSet::new();
  let mut outputs: Vec<(&Path, &str)> = Vec::new();

  for (index, target) in builds.iter().enumerate() {
    if target.id.trim().is_empty() {
      return Err(ConfigError::EmptyId { index });
    }
    if !ids.insert(target.id.as_str()) {
      return Err(ConfigError::DuplicateId(target.id.clone()));
    }
    if target.source_paths.is_empty() {
      return Err(ConfigError::NoSourcePaths(target.id.clone()));
    }
    if target.output_to.file_name().is_none() {
      return Err(ConfigError::InvalidOutput {
        id: target.id.clone(),
        reason: "path has no file name".to_string(),
      });
    }
    if target.output_to.is_dir() {
      return Err(ConfigError::InvalidOutput {
        id: target.id.clone(),
        reason: format!("{} is a directory", target.output_to.display()),
      });
    }
    if target.source_paths.iter().any(|src| target.output_to == *src) {
      return Err(ConfigError::InvalidOutput {
        id: target.id.clone(),
        reason: "output-to is also a source path".to_string(),
      });
    }
    if target.notify_command.as_ref().is_some_and(Vec::is_empty) {
      return Err(ConfigError::EmptyCommand {
        context: format!("notify-command of build {}", target.id),
      });
    }

    if let Some((_, first)) = outputs.iter().find(|(path, _)| *path == target.output_to) {
      return Err(ConfigError::SharedOutput {
        path: target.output_to.clone(),
        first: first.to_string(),
        second: target.id.clone(),
      });
    }
    outputs.push((&target.output_to, &target.id));
  }

  Ok(())
}
