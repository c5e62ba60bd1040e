//! JavaScript compiler built on swc.
//!
//! A [`Compiler`] owns one target and an incremental cache of parsed sources.
//! Each call to [`Compiler::compile`] re-reads the target's sources, re-parses
//! only files whose content hash changed, and produces the artifact text:
//!
//! - `none`: sources concatenated as written, with the `js/` prefix stripped
//! - `advanced`: unprotected identifiers renamed, comments dropped, whitespace
//!   minimized unless `pretty-print` is set
//!
//! Writing the artifact is left to the caller (see [`crate::build`]).

mod analyze;
mod bridge;
mod codegen;
mod parse;
mod rename;

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

pub use bridge::{HostBinding, HostBindingKind, HostBindingTable};
pub use parse::ParseError;
pub use rename::RenameMap;

pub(crate) use parse::{ParsedScript, parse_script};

use crate::config::{BuildTarget, Optimizations, WarningCategory};
use crate::consts::SOURCE_EXTENSION;
use crate::externs::{ExternDeclaration, ExternSet, ExternsError, load_extern_file};
use crate::util::hash::{ContentHash, hash_bytes};

use analyze::{Prepared, prepare};
use codegen::{emit_advanced, emit_verbatim};

#[derive(Debug, Error)]
pub enum CompileError {
  #[error("not found: {path}")]
  SourceNotFound { path: PathBuf },

  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to scan {path}: {source}")]
  Walk {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  #[error("{path} is not valid UTF-8")]
  Encoding { path: PathBuf },

  #[error("{path}:{source}")]
  Syntax {
    path: PathBuf,
    #[source]
    source: ParseError,
  },

  #[error("failed to generate output: {0}")]
  Codegen(#[source] io::Error),

  #[error(transparent)]
  Externs(ExternsError),
}

impl From<ExternsError> for CompileError {
  fn from(err: ExternsError) -> Self {
    match err {
      ExternsError::NotFound(path) => CompileError::SourceNotFound { path },
      other => CompileError::Externs(other),
    }
  }
}

/// A non-fatal diagnostic from one compile pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
  pub category: WarningCategory,
  pub message: String,
}

impl std::fmt::Display for Warning {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "[{}] {}", self.category.as_str(), self.message)
  }
}

/// Per-source output, written to `output-dir` when configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledUnit {
  /// Path of the source relative to the parent of its source root.
  pub relative: PathBuf,
  pub code: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompileStats {
  /// Files parsed in this pass.
  pub files_compiled: usize,
  /// Files whose cached syntax tree was reused.
  pub files_reused: usize,
  /// Distinct identifiers renamed.
  pub renamed: usize,
}

#[derive(Debug, Clone)]
pub struct CompileOutput {
  pub artifact: String,
  pub units: Vec<CompiledUnit>,
  pub source_map: Option<String>,
  pub warnings: Vec<Warning>,
  pub stats: CompileStats,
  pub host_bindings: HostBindingTable,
  pub renames: RenameMap,
}

/// A parsed and analyzed source file.
#[derive(Debug, Clone)]
struct SourceUnit {
  relative: PathBuf,
  hash: ContentHash,
  text: String,
  prepared: Prepared,
}

/// Compiles one target, caching parsed sources across passes.
#[derive(Debug)]
pub struct Compiler {
  target: BuildTarget,
  cache: HashMap<PathBuf, SourceUnit>,
  extra_externs: Vec<ExternDeclaration>,
}

impl Compiler {
  pub fn new(target: BuildTarget) -> Self {
    Self {
      target,
      cache: HashMap::new(),
      extra_externs: Vec::new(),
    }
  }

  pub fn target(&self) -> &BuildTarget {
    &self.target
  }

  /// Add extern declarations on top of the target's extern files.
  ///
  /// They only take effect under `advanced`: with `none` nothing is renamed,
  /// so externs cannot change the output.
  pub fn apply_externs(&mut self, decls: impl IntoIterator<Item = ExternDeclaration>) {
    let before = self.extra_externs.len();
    self.extra_externs.extend(decls);
    if self.target.optimizations == Optimizations::None {
      debug!(
        target = %self.target.id,
        count = self.extra_externs.len() - before,
        "externs recorded; no effect without advanced optimizations"
      );
    }
  }

  /// Run one full compilation pass.
  pub fn compile(&mut self) -> Result<CompileOutput, CompileError> {
    let advanced = self.target.optimizations == Optimizations::Advanced;
    let mut warnings = Vec::new();

    let sources = self.collect_sources(&mut warnings)?;
    let (units, stats) = self.load_units(sources)?;

    let mut host_bindings = HostBindingTable::new();
    for (path, unit) in &units {
      host_bindings.record(path, &unit.prepared.analysis.host_refs);
    }

    let artifact_name = self.artifact_name();
    let map_file = self.target.source_map.then_some(artifact_name.as_str());
    let sources: Vec<&SourceUnit> = units.iter().map(|(_, unit)| unit).collect();
    let emitted = if advanced {
      let protected = self.protected_names(&units, &host_bindings, &mut warnings)?;
      emit_advanced(&sources, &protected, self.target.pretty_print, map_file)?
    } else {
      emit_verbatim(&sources, map_file)?
    };
    let renames = emitted.renames;

    let stats = CompileStats {
      renamed: renames.len(),
      ..stats
    };
    debug!(
      target = %self.target.id,
      compiled = stats.files_compiled,
      reused = stats.files_reused,
      renamed = stats.renamed,
      "compile pass finished"
    );

    self.cache = units.into_iter().collect();

    Ok(CompileOutput {
      artifact: emitted.artifact,
      units: emitted.units,
      source_map: emitted.source_map,
      warnings,
      stats,
      host_bindings,
      renames,
    })
  }

  fn artifact_name(&self) -> String {
    self
      .target
      .output_to
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_default()
  }

  /// Every `.js` file under the source roots, roots in declared order and
  /// files sorted within each root.
  fn collect_sources(&self, warnings: &mut Vec<Warning>) -> Result<Vec<(PathBuf, PathBuf)>, CompileError> {
    let mut seen = HashSet::new();
    let mut sources = Vec::new();

    for root in &self.target.source_paths {
      if !root.exists() {
        return Err(CompileError::SourceNotFound { path: root.clone() });
      }
      let base = root.parent().unwrap_or(root);
      let mut found = 0usize;

      for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| CompileError::Walk {
          path: root.clone(),
          source,
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_source_file(path) || self.target.is_output(path) {
          continue;
        }
        found += 1;
        if seen.insert(path.to_path_buf()) {
          let relative = path.strip_prefix(base).unwrap_or(path).to_path_buf();
          sources.push((path.to_path_buf(), relative));
        }
      }

      if found == 0 && self.target.warning_enabled(WarningCategory::EmptySourcePath) {
        warnings.push(Warning {
          category: WarningCategory::EmptySourcePath,
          message: format!("no .{} files under {}", SOURCE_EXTENSION, root.display()),
        });
      }
    }

    Ok(sources)
  }

  fn load_units(
    &self,
    sources: Vec<(PathBuf, PathBuf)>,
  ) -> Result<(Vec<(PathBuf, SourceUnit)>, CompileStats), CompileError> {
    let mut stats = CompileStats::default();
    let mut units = Vec::with_capacity(sources.len());

    for (path, relative) in sources {
      let bytes = fs::read(&path).map_err(|source| CompileError::Read {
        path: path.clone(),
        source,
      })?;
      let hash = hash_bytes(&bytes);

      let cached = self.cache.get(&path).filter(|unit| unit.hash == hash);
      let unit = match cached {
        Some(unit) => {
          stats.files_reused += 1;
          unit.clone()
        }
        None => {
          stats.files_compiled += 1;
          debug!(file = %path.display(), "parsing");
          parse_unit(&path, relative, hash, bytes)?
        }
      };
      units.push((path, unit));
    }

    Ok((units, stats))
  }

  /// Names excluded from renaming, reporting extern and export warnings.
  fn protected_names(
    &self,
    units: &[(PathBuf, SourceUnit)],
    host_bindings: &HostBindingTable,
    warnings: &mut Vec<Warning>,
  ) -> Result<HashSet<String>, CompileError> {
    let mut externs = ExternSet::with_defaults();
    let mut duplicates = Vec::new();
    for path in &self.target.externs {
      duplicates.extend(externs.merge(load_extern_file(path)?));
    }
    duplicates.extend(externs.merge(self.extra_externs.iter().cloned()));

    if self.target.warning_enabled(WarningCategory::DuplicateExterns) {
      warnings.extend(duplicates.into_iter().map(|path| Warning {
        category: WarningCategory::DuplicateExterns,
        message: format!("{} is declared more than once", path),
      }));
    }

    let mut protected: HashSet<String> = externs.names().map(str::to_string).collect();

    for (path, unit) in units {
      for export in &unit.prepared.analysis.exports {
        if externs.covers(export) && self.target.warning_enabled(WarningCategory::RedundantExport) {
          warnings.push(Warning {
            category: WarningCategory::RedundantExport,
            message: format!("{}: {} is already protected by externs", path.display(), export),
          });
        }
        protected.extend(export.segments().iter().cloned());
      }
    }

    if self.target.protect_host_refs {
      protected.extend(host_bindings.names().map(str::to_string));
    }

    Ok(protected)
  }
}

fn parse_unit(path: &Path, relative: PathBuf, hash: ContentHash, bytes: Vec<u8>) -> Result<SourceUnit, CompileError> {
  let text = String::from_utf8(bytes).map_err(|_| CompileError::Encoding {
    path: path.to_path_buf(),
  })?;
  let prepared = prepare(&text).map_err(|source| CompileError::Syntax {
    path: path.to_path_buf(),
    source,
  })?;
  Ok(SourceUnit {
    relative,
    hash,
    text,
    prepared,
  })
}

fn is_source_file(path: &Path) -> bool {
  path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
}

/// Forward-slash form of a relative path, as used in source maps.
fn display_path(path: &Path) -> String {
  path
    .components()
    .map(|c| c.as_os_str().to_string_lossy())
    .collect::<Vec<_>>()
    .join("/")
}
