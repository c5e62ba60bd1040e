//! Identifier renaming for `advanced` optimization.
//!
//! Declared names and properties are mangled by `swc_ecma_minifier`, with
//! every protected name passed as reserved. Properties read off undeclared
//! globals (`$.ajax`) are never collected by the minifier, so a second pass
//! gives each such unprotected name one fresh short name everywhere it is
//! used as a property. Undeclared globals themselves keep their names.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use swc_common::sync::Lrc;
use swc_common::{Mark, SourceMap, SyntaxContext};
use swc_ecma_ast::{Expr, Ident, IdentName, MemberExpr, MemberProp, Program};
use swc_ecma_minifier::optimize;
use swc_ecma_minifier::option::{ExtraOptions, MangleOptions, ManglePropertiesOptions, MinifyOptions};
use swc_ecma_visit::{Visit, VisitMut, VisitMutWith, VisitWith};

const FIRST_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ$_";
const REST_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ$_0123456789";

/// Reserved and contextual words, never produced as a short name.
const RESERVED_WORDS: &[&str] = &[
  "arguments", "as", "async", "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
  "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally", "for", "from", "function", "get",
  "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null", "of", "package", "private",
  "protected", "public", "return", "set", "static", "super", "switch", "this", "throw", "true", "try", "typeof",
  "undefined", "var", "void", "while", "with", "yield",
];

/// Original identifier -> renamed identifier.
///
/// The minifier names each scope separately, so a local name may end up
/// with different short names in different functions. The map keeps the
/// first renaming in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenameMap {
  names: BTreeMap<String, String>,
}

impl RenameMap {
  pub fn get(&self, original: &str) -> Option<&str> {
    self.names.get(original).map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.names.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }
}

/// Rename a resolved program. Must run inside the `GLOBALS` the marks were
/// created in.
pub(crate) fn mangle(
  program: Program,
  cm: Lrc<SourceMap>,
  unresolved_mark: Mark,
  top_level_mark: Mark,
  protected: &HashSet<String>,
) -> (Program, RenameMap) {
  let before = Names::collect(&program);
  let external = external_members(&program, unresolved_mark, protected);

  let mut reserved: Vec<&String> = protected.iter().collect();
  reserved.sort();
  let mut mangle = MangleOptions {
    top_level: Some(true),
    ..Default::default()
  };
  mangle.reserved.extend(reserved.into_iter().map(|name| name.as_str().into()));
  let mut props = ManglePropertiesOptions::default();
  props.reserved = mangle.reserved.clone();
  mangle.props = Some(props);

  let options = MinifyOptions {
    compress: None,
    mangle: Some(mangle),
    ..Default::default()
  };
  let extra = ExtraOptions {
    unresolved_mark,
    top_level_mark,
    mangle_name_cache: Default::default(),
  };
  let mut program = optimize(program, cm, None, None, &options, &extra);

  let mut taken = Names::collect(&program).symbols();
  taken.extend(protected.iter().cloned());
  let mut members = ExternalMembers {
    names: &external,
    taken,
    assigned: HashMap::new(),
    next: 0,
  };
  program.visit_mut_with(&mut members);

  let after = Names::collect(&program);
  (program, before.renamed_to(&after))
}

/// Unprotected property names read off an undeclared global, such as
/// `ajax` in `$.ajax`.
fn external_members(program: &Program, unresolved_mark: Mark, protected: &HashSet<String>) -> HashSet<String> {
  struct Collector<'a> {
    unresolved: SyntaxContext,
    protected: &'a HashSet<String>,
    found: HashSet<String>,
  }

  impl Collector<'_> {
    fn undeclared_root(&self, expr: &Expr) -> bool {
      match expr {
        Expr::Ident(ident) => ident.ctxt == self.unresolved,
        Expr::Member(member) => self.undeclared_root(&member.obj),
        _ => false,
      }
    }
  }

  impl Visit for Collector<'_> {
    fn visit_member_expr(&mut self, member: &MemberExpr) {
      if let MemberProp::Ident(prop) = &member.prop
        && !self.protected.contains(&*prop.sym)
        && self.undeclared_root(&member.obj)
      {
        self.found.insert(prop.sym.to_string());
      }
      member.visit_children_with(self);
    }
  }

  let mut collector = Collector {
    unresolved: SyntaxContext::empty().apply_mark(unresolved_mark),
    protected,
    found: HashSet::new(),
  };
  program.visit_with(&mut collector);
  collector.found
}

struct ExternalMembers<'a> {
  names: &'a HashSet<String>,
  taken: HashSet<String>,
  assigned: HashMap<String, String>,
  next: usize,
}

impl ExternalMembers<'_> {
  fn renamed(&mut self, original: &str) -> String {
    if let Some(name) = self.assigned.get(original) {
      return name.clone();
    }
    let name = loop {
      let candidate = short_name(self.next);
      self.next += 1;
      if !RESERVED_WORDS.contains(&candidate.as_str()) && !self.taken.contains(&candidate) {
        break candidate;
      }
    };
    self.taken.insert(name.clone());
    self.assigned.insert(original.to_string(), name.clone());
    name
  }
}

impl VisitMut for ExternalMembers<'_> {
  fn visit_mut_ident_name(&mut self, name: &mut IdentName) {
    if self.names.contains(&*name.sym) {
      name.sym = self.renamed(&name.sym).into();
    }
  }
}

/// Every identifier and property name in a program, keyed by position.
struct Names {
  idents: HashMap<(u32, bool), String>,
}

impl Names {
  fn collect(program: &Program) -> Self {
    let mut names = Names { idents: HashMap::new() };
    program.visit_with(&mut names);
    names
  }

  fn symbols(&self) -> HashSet<String> {
    self.idents.values().cloned().collect()
  }

  fn renamed_to(&self, after: &Names) -> RenameMap {
    let mut keys: Vec<_> = self.idents.keys().copied().collect();
    keys.sort_unstable();

    let mut names = BTreeMap::new();
    for key in keys {
      if let (Some(original), Some(renamed)) = (self.idents.get(&key), after.idents.get(&key))
        && original != renamed
      {
        names.entry(original.clone()).or_insert_with(|| renamed.clone());
      }
    }
    RenameMap { names }
  }
}

impl Visit for Names {
  fn visit_ident(&mut self, ident: &Ident) {
    self.idents.insert((ident.span.lo.0, false), ident.sym.to_string());
  }

  fn visit_ident_name(&mut self, name: &IdentName) {
    self.idents.insert((name.span.lo.0, true), name.sym.to_string());
  }
}

/// The `n`-th short identifier: `a`..`_`, then `aa`, `ba`, ...
fn short_name(mut n: usize) -> String {
  let mut name = String::new();
  name.push(FIRST_CHARS[n % FIRST_CHARS.len()] as char);
  n /= FIRST_CHARS.len();
  while n > 0 {
    n -= 1;
    name.push(REST_CHARS[n % REST_CHARS.len()] as char);
    n /= REST_CHARS.len();
  }
  name
}
