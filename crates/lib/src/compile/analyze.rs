//! Per-file preparation: parse, resolve `js/` host references, and collect
//! export markers.

use std::collections::HashSet;

use swc_common::comments::{Comments, SingleThreadedComments};
use swc_common::{BytePos, Spanned};
use swc_ecma_ast::{
  AssignOp, AssignTarget, CallExpr, Callee, Decl, Expr, Ident, MemberExpr, MemberProp, Pat, Script,
  SimpleAssignTarget, Stmt,
};
use swc_ecma_visit::{Visit, VisitMut, VisitMutWith, VisitWith};

use crate::consts::EXPORT_MARKER;
use crate::externs::SymbolPath;

use super::bridge::{self, HostBindingKind, HostRef, MASKED_PREFIX};
use super::parse::{ParseError, ParsedScript, line_column, parse_script};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Analysis {
  pub exports: Vec<SymbolPath>,
  pub host_refs: Vec<HostRef>,
}

/// A parsed source with its host prefixes resolved.
#[derive(Debug, Clone)]
pub(crate) struct Prepared {
  /// Syntax tree with `js/` removed from host identifiers.
  pub script: Script,
  /// Position of the first byte of the source in `script`'s spans.
  pub start: BytePos,
  /// The source text with `js/` removed, as emitted without optimizations.
  pub stripped: String,
  pub analysis: Analysis,
}

pub(crate) fn prepare(text: &str) -> Result<Prepared, ParseError> {
  let candidates = bridge::prefix_candidates(text);
  let parsed = match parse_script(&bridge::mask_prefixes(text, &candidates)) {
    Ok(parsed) => parsed,
    Err(err) if candidates.is_empty() => return Err(err),
    // Masking broke the file, so none of the candidates was a host reference.
    Err(_) => return Ok(finish(text, parse_script(text)?, &HashSet::new())),
  };

  let confirmed = confirmed_prefixes(&parsed, &candidates);
  if confirmed.len() == candidates.len() {
    return Ok(finish(text, parsed, &confirmed));
  }
  let mut offsets: Vec<usize> = confirmed.iter().copied().collect();
  offsets.sort_unstable();
  let parsed = parse_script(&bridge::mask_prefixes(text, &offsets))?;
  Ok(finish(text, parsed, &confirmed))
}

fn finish(text: &str, parsed: ParsedScript, prefixes: &HashSet<usize>) -> Prepared {
  let mut host_refs = HostRefs {
    parsed: &parsed,
    prefixes,
    text,
    found: Vec::new(),
  };
  parsed.script.visit_with(&mut host_refs);
  let host_refs = host_refs.found;

  let mut exports = Exports {
    comments: &parsed.comments,
    found: Vec::new(),
  };
  parsed.script.visit_with(&mut exports);
  let exports = exports.found;

  let mut offsets: Vec<usize> = prefixes.iter().copied().collect();
  offsets.sort_unstable();
  let stripped = bridge::strip_prefixes(text, &offsets);

  let start = parsed.start;
  let mut script = parsed.script;
  script.visit_mut_with(&mut StripPrefixes { start, prefixes });

  Prepared {
    script,
    start,
    stripped,
    analysis: Analysis { exports, host_refs },
  }
}

/// Candidates that parsed as the start of an identifier.
fn confirmed_prefixes(parsed: &ParsedScript, candidates: &[usize]) -> HashSet<usize> {
  struct Starts<'a> {
    parsed: &'a ParsedScript,
    candidates: HashSet<usize>,
    found: HashSet<usize>,
  }

  impl Visit for Starts<'_> {
    fn visit_ident(&mut self, ident: &Ident) {
      let offset = self.parsed.offset(ident.span.lo);
      if self.candidates.contains(&offset) && ident.sym.starts_with(MASKED_PREFIX) {
        self.found.insert(offset);
      }
    }
  }

  let mut starts = Starts {
    parsed,
    candidates: candidates.iter().copied().collect(),
    found: HashSet::new(),
  };
  parsed.script.visit_with(&mut starts);
  starts.found
}

struct HostRefs<'a> {
  parsed: &'a ParsedScript,
  prefixes: &'a HashSet<usize>,
  text: &'a str,
  found: Vec<HostRef>,
}

impl HostRefs<'_> {
  fn host_name(&self, ident: &Ident) -> Option<String> {
    let offset = self.parsed.offset(ident.span.lo);
    if !self.prefixes.contains(&offset) {
      return None;
    }
    ident.sym.strip_prefix(MASKED_PREFIX).map(str::to_string)
  }

  /// `js/a.b.c` as the prefixed identifier and its segments. Computed
  /// access ends the chain.
  fn chain<'e>(&self, expr: &'e Expr) -> Option<(&'e Ident, Vec<String>)> {
    match expr {
      Expr::Ident(ident) => self.host_name(ident).map(|name| (ident, vec![name])),
      Expr::Member(member) => self.member_chain(member),
      _ => None,
    }
  }

  fn member_chain<'e>(&self, member: &'e MemberExpr) -> Option<(&'e Ident, Vec<String>)> {
    let MemberProp::Ident(prop) = &member.prop else {
      return None;
    };
    let (root, mut segments) = self.chain(&member.obj)?;
    segments.push(prop.sym.to_string());
    Some((root, segments))
  }

  fn record(&mut self, root: &Ident, segments: Vec<String>, called: bool) {
    let (line, column) = line_column(self.text, self.parsed.offset(root.span.lo));
    self.found.push(HostRef {
      kind: HostBindingKind::classify(segments.len(), called),
      path: SymbolPath::new(segments),
      line,
      column,
    });
  }
}

impl Visit for HostRefs<'_> {
  fn visit_call_expr(&mut self, call: &CallExpr) {
    if let Callee::Expr(callee) = &call.callee
      && let Some((root, segments)) = self.chain(callee)
    {
      self.record(root, segments, true);
      for arg in &call.args {
        arg.visit_with(self);
      }
      return;
    }
    call.visit_children_with(self);
  }

  fn visit_member_expr(&mut self, member: &MemberExpr) {
    if let Some((root, segments)) = self.member_chain(member) {
      self.record(root, segments, false);
      return;
    }
    member.visit_children_with(self);
  }

  fn visit_ident(&mut self, ident: &Ident) {
    if let Some(name) = self.host_name(ident) {
      self.record(ident, vec![name], false);
    }
  }
}

struct Exports<'a> {
  comments: &'a SingleThreadedComments,
  found: Vec<SymbolPath>,
}

impl Visit for Exports<'_> {
  fn visit_stmt(&mut self, stmt: &Stmt) {
    let marked = self
      .comments
      .get_leading(stmt.span_lo())
      .is_some_and(|comments| comments.iter().any(|c| has_export_tag(&c.text)));
    if marked {
      self.found.extend(declared_paths(stmt));
    }
    stmt.visit_children_with(self);
  }
}

/// Whether a comment carries `@export` as a tag of its own: first on its
/// line after any `*` decoration, and not the start of a longer word.
fn has_export_tag(comment: &str) -> bool {
  comment.lines().any(|line| {
    line
      .trim_start_matches(|c: char| c.is_whitespace() || c == '*')
      .strip_prefix(EXPORT_MARKER)
      .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_' || c == '$'))
  })
}

/// Names a statement declares or assigns.
fn declared_paths(stmt: &Stmt) -> Vec<SymbolPath> {
  let single = |name: &str| vec![SymbolPath::new(vec![name.to_string()])];
  match stmt {
    Stmt::Decl(Decl::Fn(decl)) => single(&*decl.ident.sym),
    Stmt::Decl(Decl::Class(decl)) => single(&*decl.ident.sym),
    Stmt::Decl(Decl::Var(decl)) => decl
      .decls
      .iter()
      .filter_map(|d| match &d.name {
        Pat::Ident(binding) => Some(SymbolPath::new(vec![binding.id.sym.to_string()])),
        _ => None,
      })
      .collect(),
    Stmt::Expr(stmt) => match &*stmt.expr {
      Expr::Assign(assign) if assign.op == AssignOp::Assign => match &assign.left {
        AssignTarget::Simple(SimpleAssignTarget::Ident(binding)) => single(&*binding.id.sym),
        AssignTarget::Simple(SimpleAssignTarget::Member(member)) => {
          SymbolPath::of_member(member).into_iter().collect()
        }
        _ => Vec::new(),
      },
      _ => Vec::new(),
    },
    _ => Vec::new(),
  }
}

/// Drops the masked prefix from host identifiers and moves their spans onto
/// the name itself.
struct StripPrefixes<'a> {
  start: BytePos,
  prefixes: &'a HashSet<usize>,
}

impl VisitMut for StripPrefixes<'_> {
  fn visit_mut_ident(&mut self, ident: &mut Ident) {
    let offset = ident.span.lo.0.saturating_sub(self.start.0) as usize;
    if !self.prefixes.contains(&offset) {
      return;
    }
    if let Some(name) = ident.sym.strip_prefix(MASKED_PREFIX).map(str::to_string) {
      ident.sym = name.into();
      ident.span.lo = BytePos(ident.span.lo.0 + MASKED_PREFIX.len() as u32);
    }
  }
}
