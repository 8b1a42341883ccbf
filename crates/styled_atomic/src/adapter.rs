//! Seams to the collaborators around the engine.

use serde::Serialize;
use swc_core::ecma::ast::Expr;

use crate::ir::{RuleSet, SourceLocation};

/// An import the emitted module needs, e.g. `import { vars } from "./tokens.stylex"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSpec {
  pub source: String,
  pub specifier: String,
}

impl ImportSpec {
  pub fn new(source: &str, specifier: &str) -> Self {
    ImportSpec {
      source: source.to_string(),
      specifier: specifier.to_string(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeResolution {
  /// Source of the static expression, e.g. `vars.colorPrimary`, or a literal.
  pub expr: String,
  pub required_imports: Vec<ImportSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallResolution {
  /// A single CSS value. `css_text` is set when the value is known as plain text.
  Value {
    expr: String,
    required_imports: Vec<ImportSpec>,
    css_text: Option<String>,
  },
  /// A whole style object, applied as an extra style argument.
  Styles {
    expr: String,
    required_imports: Vec<ImportSpec>,
  },
  Unresolved {
    reason: String,
  },
}

/// Answers what static expression a theme path or helper call stands for.
pub trait ExpressionResolver {
  fn resolve_theme_path(
    &self,
    path: &[String],
    location: Option<SourceLocation>,
  ) -> Option<ThemeResolution>;

  /// `property` is the camelCase CSS property the call sits in, if any.
  fn resolve_call(&self, expr: &Expr, property: Option<&str>) -> CallResolution;
}

/// Parses a nested `css` tagged template or CSS string into rules.
pub trait CssBlockParser {
  fn parse_block(&self, expr: &Expr) -> Option<RuleSet>;
}

/// Block parser for callers without one; every text block is unsupported.
#[derive(Debug, Default)]
pub struct NoBlockParser;

impl CssBlockParser for NoBlockParser {
  fn parse_block(&self, _expr: &Expr) -> Option<RuleSet> {
    None
  }
}
