//! Extern declarations: symbols that must survive `advanced` renaming.
//!
//! Extern files are plain JavaScript declarations, read at build time and
//! never mutated:
//!
//! ```js
//! var jQuery = {};
//! jQuery.ajax = function(settings) {};
//! function $(selector) {}
//! jQuery.fn.prototype.hide;
//! ```
//!
//! Renaming is name-based, so every segment of a declared path is protected
//! wherever it appears (`x.ajax` keeps `ajax` for any `x`).

mod defaults;

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use swc_common::Spanned;
use swc_ecma_ast::{AssignOp, AssignTarget, Decl, Expr, MemberExpr, MemberProp, Pat, SimpleAssignTarget, Stmt};

use crate::compile::{ParseError, ParsedScript, parse_script};

#[derive(Debug, Error)]
pub enum ExternsError {
  #[error("externs file not found: {0}")]
  NotFound(PathBuf),

  #[error("failed to read externs file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid externs file {path}: {source}")]
  Syntax {
    path: PathBuf,
    #[source]
    source: ParseError,
  },
}

/// A dotted identifier path such as `jQuery.fn.hide`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolPath(Vec<String>);

impl SymbolPath {
  pub fn new(segments: Vec<String>) -> Self {
    Self(segments)
  }

  pub fn parse(path: &str) -> Self {
    Self(path.split('.').filter(|s| !s.is_empty()).map(str::to_string).collect())
  }

  /// The path of a member chain such as `a.b.c`. Computed access and
  /// non-identifier roots have no path.
  pub(crate) fn of_member(member: &MemberExpr) -> Option<Self> {
    let MemberProp::Ident(prop) = &member.prop else {
      return None;
    };
    let mut segments = match &*member.obj {
      Expr::Ident(ident) => vec![ident.sym.to_string()],
      Expr::Member(inner) => Self::of_member(inner)?.0,
      _ => return None,
    };
    segments.push(prop.sym.to_string());
    Some(Self(segments))
  }

  pub fn segments(&self) -> &[String] {
    &self.0
  }

  pub fn root(&self) -> Option<&str> {
    self.0.first().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl std::fmt::Display for SymbolPath {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0.join("."))
  }
}

/// Value an extern assigns to its symbol. Only used for documentation and
/// reporting; the compiler never evaluates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "value")]
pub enum Placeholder {
  Object,
  Array,
  Function,
  Undefined,
  Literal(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternDeclaration {
  pub path: SymbolPath,
  pub placeholder: Placeholder,
}

impl ExternDeclaration {
  pub fn new(path: &str, placeholder: Placeholder) -> Self {
    Self {
      path: SymbolPath::parse(path),
      placeholder,
    }
  }
}

/// Parse extern declarations from JavaScript source.
///
/// Only top-level statements declare externs: `var`/`let`/`const`,
/// function declarations, assignments to a name or member chain, and bare
/// member chains such as `Element.prototype.dataset;`.
pub fn parse_externs(source: &str) -> Result<Vec<ExternDeclaration>, ParseError> {
  let parsed = parse_script(source)?;
  let mut decls = Vec::new();

  for stmt in &parsed.script.body {
    match stmt {
      Stmt::Decl(Decl::Var(var)) => {
        for declarator in &var.decls {
          if let Pat::Ident(binding) = &declarator.name {
            decls.push(ExternDeclaration {
              path: SymbolPath::new(vec![binding.id.sym.to_string()]),
              placeholder: placeholder(declarator.init.as_deref(), &parsed, source),
            });
          }
        }
      }
      Stmt::Decl(Decl::Fn(function)) => decls.push(ExternDeclaration {
        path: SymbolPath::new(vec![function.ident.sym.to_string()]),
        placeholder: Placeholder::Function,
      }),
      Stmt::Expr(stmt) => match &*stmt.expr {
        Expr::Assign(assign) if assign.op == AssignOp::Assign => {
          let path = match &assign.left {
            AssignTarget::Simple(SimpleAssignTarget::Ident(binding)) => {
              Some(SymbolPath::new(vec![binding.id.sym.to_string()]))
            }
            AssignTarget::Simple(SimpleAssignTarget::Member(member)) => SymbolPath::of_member(member),
            _ => None,
          };
          if let Some(path) = path {
            decls.push(ExternDeclaration {
              path,
              placeholder: placeholder(Some(&*assign.right), &parsed, source),
            });
          }
        }
        Expr::Member(member) => {
          if let Some(path) = SymbolPath::of_member(member) {
            decls.push(ExternDeclaration {
              path,
              placeholder: Placeholder::Undefined,
            });
          }
        }
        Expr::Ident(ident) => decls.push(ExternDeclaration {
          path: SymbolPath::new(vec![ident.sym.to_string()]),
          placeholder: Placeholder::Undefined,
        }),
        _ => {}
      },
      _ => {}
    }
  }

  Ok(decls)
}

/// Classify an assigned value. Other values keep their source text.
fn placeholder(value: Option<&Expr>, parsed: &ParsedScript, source: &str) -> Placeholder {
  match value {
    None => Placeholder::Undefined,
    Some(Expr::Object(_)) => Placeholder::Object,
    Some(Expr::Array(_)) => Placeholder::Array,
    Some(Expr::Fn(_) | Expr::Arrow(_)) => Placeholder::Function,
    Some(Expr::Ident(ident)) if &*ident.sym == "undefined" => Placeholder::Undefined,
    Some(expr) => {
      let span = expr.span();
      let text = source
        .get(parsed.offset(span.lo)..parsed.offset(span.hi))
        .unwrap_or_default();
      Placeholder::Literal(text.to_string())
    }
  }
}

/// Read and parse one extern file.
pub fn load_extern_file(path: &Path) -> Result<Vec<ExternDeclaration>, ExternsError> {
  let source = fs::read_to_string(path).map_err(|source| {
    if source.kind() == io::ErrorKind::NotFound {
      ExternsError::NotFound(path.to_path_buf())
    } else {
      ExternsError::Read {
        path: path.to_path_buf(),
        source,
      }
    }
  })?;
  let decls = parse_externs(&source).map_err(|source| ExternsError::Syntax {
    path: path.to_path_buf(),
    source,
  })?;
  debug!(path = %path.display(), count = decls.len(), "loaded externs");
  Ok(decls)
}

/// The set of names protected from renaming.
///
/// Built-in browser and ECMAScript externs are always present; user externs
/// are merged on top with [`ExternSet::merge`].
#[derive(Debug, Clone, Default)]
pub struct ExternSet {
  declarations: BTreeMap<SymbolPath, ExternDeclaration>,
  names: HashSet<String>,
  builtin: HashSet<SymbolPath>,
}

impl ExternSet {
  /// An empty set without built-in externs.
  pub fn new() -> Self {
    Self::default()
  }

  /// A set holding the built-in externs.
  pub fn with_defaults() -> Self {
    let mut set = Self::new();
    set.merge(defaults::declarations().iter().cloned());
    set.builtin = set.declarations.keys().cloned().collect();
    set
  }

  /// Merge declarations. Returns paths that were already declared by a
  /// previous non-builtin merge.
  pub fn merge(&mut self, decls: impl IntoIterator<Item = ExternDeclaration>) -> Vec<SymbolPath> {
    let mut duplicates = Vec::new();
    for decl in decls {
      if decl.path.is_empty() {
        continue;
      }
      self.names.extend(decl.path.segments().iter().cloned());
      if self.declarations.contains_key(&decl.path) && !self.builtin.contains(&decl.path) {
        duplicates.push(decl.path.clone());
      }
      self.declarations.insert(decl.path.clone(), decl);
    }
    duplicates
  }

  /// Whether an identifier name is protected.
  pub fn protects(&self, name: &str) -> bool {
    self.names.contains(name)
  }

  /// Whether every segment of a path is protected.
  pub fn covers(&self, path: &SymbolPath) -> bool {
    !path.is_empty() && path.segments().iter().all(|s| self.protects(s))
  }

  pub fn get(&self, path: &SymbolPath) -> Option<&ExternDeclaration> {
    self.declarations.get(path)
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.names.iter().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.declarations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.declarations.is_empty()
  }
}
