//! Artifact generation.
//!
//! `none` output is the stripped source text, mapped line by line.
//! `advanced` output is the renamed syntax tree printed by
//! `swc_ecma_codegen`, which records a mapping for every token it writes.
//! Both feed one `SourceMap` holding the original sources, so the map is
//! built by `swc_common` and its columns count UTF-16 code units.

use std::collections::HashSet;
use std::path::PathBuf;

use swc_common::source_map::SourceMapGenConfig;
use swc_common::sync::Lrc;
use swc_common::{BytePos, FileName, GLOBALS, Globals, LineCol, Mark, SourceMap, Span};
use swc_ecma_ast::{EsVersion, Pass, Program, Script};
use swc_ecma_codegen::{Emitter, text_writer::JsWriter};
use swc_ecma_transforms_base::resolver;
use swc_ecma_visit::{VisitMut, VisitMutWith};

use super::rename::{self, RenameMap};
use super::{CompileError, CompiledUnit, SourceUnit, display_path};

type Mappings = Vec<(BytePos, LineCol)>;

#[derive(Debug, Default)]
pub(super) struct Emitted {
  pub artifact: String,
  pub units: Vec<CompiledUnit>,
  pub source_map: Option<String>,
  pub renames: RenameMap,
}

/// Concatenate the stripped sources. `map_file` names the artifact when a
/// source map is wanted.
pub(super) fn emit_verbatim(units: &[&SourceUnit], map_file: Option<&str>) -> Result<Emitted, CompileError> {
  let cm: Lrc<SourceMap> = Default::default();
  let mut out = Output::default();

  for unit in units {
    if map_file.is_some() {
      let fm = cm.new_source_file(FileName::Real(unit.relative.clone()).into(), unit.text.clone());
      out
        .mappings
        .extend(line_mappings(&unit.text, fm.start_pos, out.line_count()));
    }
    out.push(unit.relative.clone(), unit.prepared.stripped.clone());
  }

  out.finish(&cm, map_file, RenameMap::default())
}

/// Rename across all sources as one program and print each source's share
/// of it. Statements keep their order, so every unit maps back to the file
/// it came from.
pub(super) fn emit_advanced(
  units: &[&SourceUnit],
  protected: &HashSet<String>,
  pretty: bool,
  map_file: Option<&str>,
) -> Result<Emitted, CompileError> {
  GLOBALS.set(&Globals::new(), || {
    let cm: Lrc<SourceMap> = Default::default();
    let mut combined: Option<Script> = None;
    let mut counts = Vec::with_capacity(units.len());

    for unit in units {
      let fm = cm.new_source_file(FileName::Real(unit.relative.clone()).into(), unit.text.clone());
      let mut script = unit.prepared.script.clone();
      script.visit_mut_with(&mut Relocate {
        from: unit.prepared.start,
        to: fm.start_pos,
        len: unit.text.len() as u32,
      });
      counts.push(script.body.len());
      match combined.as_mut() {
        Some(all) => all.body.extend(script.body),
        None => combined = Some(script),
      }
    }

    let Some(script) = combined else {
      return Ok(Emitted::default());
    };

    let unresolved_mark = Mark::new();
    let top_level_mark = Mark::new();
    let mut program = Program::Script(script);
    let mut pass = resolver(unresolved_mark, top_level_mark, false);
    pass.process(&mut program);

    let (program, renames) = rename::mangle(program, cm.clone(), unresolved_mark, top_level_mark, protected);
    let Program::Script(mut script) = program else {
      return Err(CompileError::Codegen(std::io::Error::other("optimizer returned a module")));
    };

    let mut body = std::mem::take(&mut script.body).into_iter();
    let mut out = Output::default();
    for (unit, count) in units.iter().zip(counts) {
      let mut part = script.clone();
      part.body = body.by_ref().take(count).collect();

      let first_line = out.line_count();
      let mut unit_mappings = Mappings::new();
      let code = print(&cm, &part, !pretty, map_file.is_some().then_some(&mut unit_mappings))?;
      out.mappings.extend(unit_mappings.into_iter().map(|(pos, at)| {
        (
          pos,
          LineCol {
            line: at.line + first_line,
            col: at.col,
          },
        )
      }));
      out.push(unit.relative.clone(), code);
    }

    out.finish(&cm, map_file, renames)
  })
}

#[derive(Default)]
struct Output {
  artifact: String,
  units: Vec<CompiledUnit>,
  mappings: Mappings,
}

impl Output {
  fn line_count(&self) -> u32 {
    self.artifact.matches('\n').count() as u32
  }

  /// Append one unit. A unit that does not end a line gets a newline, so the
  /// next one starts on a line of its own.
  fn push(&mut self, relative: PathBuf, mut code: String) {
    if !code.is_empty() && !code.ends_with('\n') {
      code.push('\n');
    }
    self.artifact.push_str(&code);
    self.units.push(CompiledUnit { relative, code });
  }

  fn finish(mut self, cm: &SourceMap, map_file: Option<&str>, renames: RenameMap) -> Result<Emitted, CompileError> {
    let source_map = match map_file {
      Some(file) => {
        let map = build_source_map(cm, &self.mappings, file)?;
        self
          .artifact
          .push_str(&format!("//# sourceMappingURL={}.map\n", file));
        Some(map)
      }
      None => None,
    };
    Ok(Emitted {
      artifact: self.artifact,
      units: self.units,
      source_map,
      renames,
    })
  }
}

fn print(cm: &Lrc<SourceMap>, script: &Script, minify: bool, mappings: Option<&mut Mappings>) -> Result<String, CompileError> {
  let mut buf = Vec::new();
  {
    let mut cfg = swc_ecma_codegen::Config::default();
    cfg.minify = minify;
    cfg.target = EsVersion::Es2022;
    let mut emitter = Emitter {
      cfg,
      comments: None,
      cm: cm.clone(),
      wr: JsWriter::new(cm.clone(), "\n", &mut buf, mappings),
    };
    emitter.emit_script(script).map_err(CompileError::Codegen)?;
  }
  Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Map the start of every line of `text` to column zero of the matching
/// output line, starting at `first_line`.
fn line_mappings(text: &str, start: BytePos, first_line: u32) -> Mappings {
  std::iter::once(0)
    .chain(text.match_indices('\n').map(|(i, _)| i + 1))
    .filter(|&offset| offset < text.len())
    .enumerate()
    .map(|(line, offset)| {
      (
        BytePos(start.0 + offset as u32),
        LineCol {
          line: first_line + line as u32,
          col: 0,
        },
      )
    })
    .collect()
}

struct MapConfig;

impl SourceMapGenConfig for MapConfig {
  fn file_name_to_source(&self, f: &FileName) -> String {
    match f {
      FileName::Real(path) => display_path(path),
      other => other.to_string(),
    }
  }

  fn inline_sources_content(&self, _: &FileName) -> bool {
    true
  }
}

fn build_source_map(cm: &SourceMap, mappings: &[(BytePos, LineCol)], file: &str) -> Result<String, CompileError> {
  let map = cm.build_source_map(mappings, None, MapConfig);
  let mut buf = Vec::new();
  map
    .to_writer(&mut buf)
    .map_err(|err| CompileError::Codegen(std::io::Error::other(err.to_string())))?;

  let mut json: serde_json::Value =
    serde_json::from_slice(&buf).map_err(|err| CompileError::Codegen(std::io::Error::other(err)))?;
  if let Some(fields) = json.as_object_mut() {
    fields.insert("file".to_string(), serde_json::Value::String(file.to_string()));
  }
  Ok(json.to_string())
}

/// Moves a cached tree from the positions of its own parse to those of the
/// pass's shared `SourceMap`.
struct Relocate {
  from: BytePos,
  to: BytePos,
  len: u32,
}

impl Relocate {
  fn moved(&self, pos: BytePos) -> BytePos {
    if pos.0 >= self.from.0 && pos.0 <= self.from.0 + self.len {
      BytePos(pos.0 - self.from.0 + self.to.0)
    } else {
      pos
    }
  }
}

impl VisitMut for Relocate {
  fn visit_mut_span(&mut self, span: &mut Span) {
    span.lo = self.moved(span.lo);
    span.hi = self.moved(span.hi);
  }
}
