//! Script parsing on top of `swc_ecma_parser`.
//!
//! Every call parses into its own `SourceMap`, so a parsed script owns
//! nothing shared and can be cached across passes. Positions inside it are
//! relative to [`ParsedScript::start`].

use swc_common::comments::SingleThreadedComments;
use swc_common::sync::Lrc;
use swc_common::{BytePos, FileName, SourceMap, Spanned};
use swc_ecma_ast::{EsVersion, Script};
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax, lexer::Lexer};
use thiserror::Error;

/// A syntax error at a one-based line and column.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
  pub line: usize,
  pub column: usize,
  pub message: String,
}

#[derive(Debug)]
pub(crate) struct ParsedScript {
  pub script: Script,
  pub comments: SingleThreadedComments,
  /// Position of the first byte of the parsed text.
  pub start: BytePos,
}

impl ParsedScript {
  /// Byte offset of `pos` into the parsed text.
  pub fn offset(&self, pos: BytePos) -> usize {
    pos.0.saturating_sub(self.start.0) as usize
  }
}

/// Parse `text` as a classic (non-module) script.
///
/// Errors the parser recovered from are still errors here: a file that only
/// parses with recovery is not compiled.
pub(crate) fn parse_script(text: &str) -> Result<ParsedScript, ParseError> {
  let cm: Lrc<SourceMap> = Default::default();
  let fm = cm.new_source_file(FileName::Anon.into(), text.to_string());
  let comments = SingleThreadedComments::default();

  let lexer = Lexer::new(
    Syntax::Es(EsSyntax::default()),
    EsVersion::Es2022,
    StringInput::from(&*fm),
    Some(&comments),
  );
  let mut parser = Parser::new_from(lexer);

  let located = |err: swc_ecma_parser::error::Error| {
    let loc = cm.lookup_char_pos(err.span().lo);
    ParseError {
      line: loc.line,
      column: loc.col.0 + 1,
      message: err.kind().msg().into_owned(),
    }
  };

  let parsed = parser.parse_script();
  let recovered = parser.take_errors();
  let script = parsed.map_err(located)?;
  if let Some(err) = recovered.into_iter().next() {
    return Err(located(err));
  }

  Ok(ParsedScript {
    script,
    comments,
    start: fm.start_pos,
  })
}

/// Zero-based line and character column of a byte offset.
pub(crate) fn line_column(text: &str, offset: usize) -> (u32, u32) {
  let before = text.get(..offset).unwrap_or(text);
  let line = before.matches('\n').count() as u32;
  let line_start = before.rfind('\n').map_or(0, |i| i + 1);
  let column = before[line_start..].chars().count() as u32;
  (line, column)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_scripts() {
    let parsed = parse_script("var a = 1;\nfunction f() { return a; }\n").unwrap();
    assert_eq!(parsed.script.body.len(), 2);
  }

  #[test]
  fn division_after_update_is_not_a_regex() {
    assert!(parse_script("var i = 4;\ni++ / 2;\n").is_ok());
  }

  #[test]
  fn errors_carry_position() {
    let err = parse_script("var ok = 1;\nvar s = 'open;\n").unwrap_err();
    assert_eq!(err.line, 2);
    assert!(err.to_string().starts_with("2:"), "{}", err);
  }

  #[test]
  fn offsets_are_relative_to_the_text() {
    let parsed = parse_script("  var a;").unwrap();
    let stmt = &parsed.script.body[0];
    assert_eq!(parsed.offset(swc_common::Spanned::span(stmt).lo), 2);
  }

  #[test]
  fn line_column_counts_characters() {
    assert_eq!(line_column("ab\nçd", 5), (1, 1));
    assert_eq!(line_column("abc", 0), (0, 0));
  }
}
