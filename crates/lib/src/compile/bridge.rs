//! Host-platform bridge table.
//!
//! Sources reach host globals through the reserved `js/` namespace. Every such
//! reference is resolved once per compilation into a typed table keyed by
//! symbol path, instead of being looked up ad hoc while emitting.
//!
//! `js/name` is not JavaScript, so before parsing each candidate prefix is
//! masked to `js$name`, a single identifier of the same length. Candidates
//! the parser does not see as an identifier start (text in strings, comments
//! or regexes) are unmasked again.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::consts::HOST_BRIDGE_NAMESPACE;
use crate::externs::SymbolPath;

/// A host prefix as it reads after masking.
pub(crate) const MASKED_PREFIX: &str = "js$";

/// Byte offsets of `js/` occurrences that can start a host reference.
pub(crate) fn prefix_candidates(text: &str) -> Vec<usize> {
  let prefix = format!("{}/", HOST_BRIDGE_NAMESPACE);
  text
    .match_indices(&prefix)
    .map(|(at, _)| at)
    .filter(|&at| {
      let before = text[..at].chars().next_back();
      let after = text[at + prefix.len()..].chars().next();
      // `/js/` is a regex and `a.js/` a member, never a prefix.
      !before.is_some_and(|c| is_ident_char(c) || matches!(c, '.' | '/' | '\\'))
        && after.is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
    })
    .collect()
}

/// Replace the `/` of each prefix at `offsets` with `$`.
pub(crate) fn mask_prefixes(text: &str, offsets: &[usize]) -> String {
  let slash = HOST_BRIDGE_NAMESPACE.len();
  let mut masked = text.to_string();
  for &at in offsets {
    masked.replace_range(at + slash..at + slash + 1, "$");
  }
  masked
}

/// Remove the prefix at each of the sorted `offsets`.
pub(crate) fn strip_prefixes(text: &str, offsets: &[usize]) -> String {
  let len = HOST_BRIDGE_NAMESPACE.len() + 1;
  let mut stripped = String::with_capacity(text.len());
  let mut from = 0;
  for &at in offsets {
    stripped.push_str(&text[from..at]);
    from = at + len;
  }
  stripped.push_str(&text[from..]);
  stripped
}

fn is_ident_char(c: char) -> bool {
  c.is_alphanumeric() || c == '_' || c == '$'
}

/// How a host symbol is used at its first reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostBindingKind {
  /// `js/alert("hi")`
  Function,
  /// `js/document.title`, `js/window`
  Property,
  /// `js/console.log("hi")`
  MethodCall,
}

impl HostBindingKind {
  pub(crate) fn classify(segments: usize, called: bool) -> Self {
    match (segments, called) {
      (1, true) => HostBindingKind::Function,
      (_, true) => HostBindingKind::MethodCall,
      (_, false) => HostBindingKind::Property,
    }
  }
}

/// A host reference as found in one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HostRef {
  pub path: SymbolPath,
  pub kind: HostBindingKind,
  pub line: u32,
  pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostBinding {
  pub kind: HostBindingKind,
  /// Source file of the first reference.
  pub file: PathBuf,
  /// One-based line of the first reference.
  pub line: u32,
  /// One-based column of the first reference.
  pub column: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostBindingTable {
  bindings: BTreeMap<SymbolPath, HostBinding>,
}

impl HostBindingTable {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record references from one file. The first reference to a path wins.
  pub(crate) fn record(&mut self, file: &std::path::Path, refs: &[HostRef]) {
    for host_ref in refs {
      self.bindings.entry(host_ref.path.clone()).or_insert_with(|| HostBinding {
        kind: host_ref.kind,
        file: file.to_path_buf(),
        line: host_ref.line + 1,
        column: host_ref.column + 1,
      });
    }
  }

  pub fn get(&self, path: &SymbolPath) -> Option<&HostBinding> {
    self.bindings.get(path)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&SymbolPath, &HostBinding)> {
    self.bindings.iter()
  }

  /// Every identifier that appears in a host path.
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self
      .bindings
      .keys()
      .flat_map(|path| path.segments().iter().map(String::as_str))
  }

  pub fn len(&self) -> usize {
    self.bindings.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bindings.is_empty()
  }
}
