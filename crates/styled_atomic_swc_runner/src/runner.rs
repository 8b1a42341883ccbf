use std::string::FromUtf8Error;

use swc_core::common::input::StringInput;
use swc_core::common::sync::Lrc;
use swc_core::common::{FileName, SourceMap, DUMMY_SP};
use swc_core::ecma::ast::{Expr, ExprStmt, Module, ModuleItem, ParenExpr, Stmt};
use swc_core::ecma::codegen::text_writer::JsWriter;
use swc_core::ecma::parser::lexer::Lexer;
use swc_core::ecma::parser::Parser;

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
  #[error("Failed to parse expression")]
  SwcParse(swc_core::ecma::parser::error::Error),
  #[error("IO Error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Invalid utf-8 output: {0}")]
  InvalidUtf8Output(#[from] FromUtf8Error),
}

/// Parse a single JavaScript expression, as found inside a `${...}` slot.
///
/// Recoverable parser errors are treated as failures so callers never see a
/// partially recovered tree.
pub fn parse_expr(code: &str) -> Result<Box<Expr>, RunnerError> {
  let source_map = Lrc::new(SourceMap::default());
  let source_file = source_map.new_source_file(Lrc::new(FileName::Anon), code.into());

  let lexer = Lexer::new(
    Default::default(),
    Default::default(),
    StringInput::from(&*source_file),
    None,
  );

  let mut parser = Parser::new_from(lexer);
  let expr = parser.parse_expr().map_err(RunnerError::SwcParse)?;
  if let Some(error) = parser.take_errors().into_iter().next() {
    return Err(RunnerError::SwcParse(error));
  }

  Ok(expr)
}

/// Print an expression back to source text using the SWC code generator.
///
/// The expression is emitted as an expression statement; the trailing
/// semicolon and newline are removed.
pub fn print_expr(expr: &Expr) -> Result<String, RunnerError> {
  let needs_parens = matches!(expr, Expr::Object(_) | Expr::Fn(_) | Expr::Class(_));
  let statement_expr = if needs_parens {
    Expr::Paren(ParenExpr {
      span: DUMMY_SP,
      expr: Box::new(expr.clone()),
    })
  } else {
    expr.clone()
  };

  let module = Module {
    span: DUMMY_SP,
    body: vec![ModuleItem::Stmt(Stmt::Expr(ExprStmt {
      span: DUMMY_SP,
      expr: Box::new(statement_expr),
    }))],
    shebang: None,
  };

  let source_map = Lrc::new(SourceMap::default());
  let mut output_buffer = vec![];
  let writer = JsWriter::new(source_map.clone(), "\n", &mut output_buffer, None);
  let mut emitter = swc_core::ecma::codegen::Emitter {
    cfg: Default::default(),
    cm: source_map.clone(),
    comments: None,
    wr: writer,
  };
  emitter.emit_module(&module)?;

  let output_code = String::from_utf8(output_buffer)?;
  let trimmed = output_code.trim_end().trim_end_matches(';');
  let unwrapped = if needs_parens {
    trimmed
      .strip_prefix('(')
      .and_then(|inner| inner.strip_suffix(')'))
      .unwrap_or(trimmed)
  } else {
    trimmed
  };

  Ok(unwrapped.to_string())
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;
  use swc_core::ecma::ast::{Expr, Lit};

  use super::*;

  #[test]
  fn test_parse_member_chain() {
    let expr = parse_expr("props.theme.colors.primary").unwrap();
    assert!(matches!(*expr, Expr::Member(_)));
  }

  #[test]
  fn test_parse_arrow_slot() {
    let expr = parse_expr("props => props.disabled ? 'gray' : 'blue'").unwrap();
    assert!(matches!(*expr, Expr::Arrow(_)));
  }

  #[test]
  fn test_parse_literal() {
    let expr = parse_expr("'8px'").unwrap();
    assert!(matches!(*expr, Expr::Lit(Lit::Str(_))));
  }

  #[test]
  fn test_parse_error() {
    assert!(parse_expr("props => (").is_err());
  }

  #[test]
  fn test_print_round_trip() {
    let expr = parse_expr("props.theme.colors.primary").unwrap();
    assert_eq!(print_expr(&expr).unwrap(), "props.theme.colors.primary");
  }

  #[test]
  fn test_print_call() {
    let expr = parse_expr("darken(theme.colors.bg, 0.2)").unwrap();
    assert_eq!(print_expr(&expr).unwrap(), "darken(theme.colors.bg, 0.2)");
  }
}
