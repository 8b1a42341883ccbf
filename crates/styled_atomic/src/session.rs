use indexmap::IndexSet;
use swc_core::ecma::ast::Expr;

use crate::adapter::{CallResolution, CssBlockParser, ExpressionResolver, ImportSpec, ThemeResolution};
use crate::config::EngineConfig;
use crate::diagnostics::Warning;
use crate::ir::{RuleSet, SourceLocation};

/// Mutable state shared by all passes over one file.
///
/// Holds the adapter handles, the deduplicated imports the resolved
/// expressions need and the warnings recorded so far.
pub struct ResolutionSession<'a> {
  resolver: &'a dyn ExpressionResolver,
  block_parser: &'a dyn CssBlockParser,
  config: &'a EngineConfig,
  imports: IndexSet<ImportSpec>,
  warnings: Vec<Warning>,
  component_names: IndexSet<String>,
}

/// Lengths of the session's accumulators at the start of a component.
#[derive(Debug, Clone, Copy)]
pub struct SessionCheckpoint {
  imports: usize,
  warnings: usize,
}

impl<'a> ResolutionSession<'a> {
  pub fn new(
    resolver: &'a dyn ExpressionResolver,
    block_parser: &'a dyn CssBlockParser,
    config: &'a EngineConfig,
  ) -> Self {
    ResolutionSession {
      resolver,
      block_parser,
      config,
      imports: IndexSet::new(),
      warnings: Vec::new(),
      component_names: IndexSet::new(),
    }
  }

  /// Components declared in the same file, which selectors may reference.
  pub fn with_component_names<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.component_names = names.into_iter().map(Into::into).collect();
    self
  }

  pub fn config(&self) -> &'a EngineConfig {
    self.config
  }

  pub fn is_component(&self, name: &str) -> bool {
    self.component_names.contains(name)
  }

  pub fn checkpoint(&self) -> SessionCheckpoint {
    SessionCheckpoint {
      imports: self.imports.len(),
      warnings: self.warnings.len(),
    }
  }

  /// Forget everything recorded since `checkpoint`.
  pub fn rollback(&mut self, checkpoint: SessionCheckpoint) {
    self.imports.truncate(checkpoint.imports);
    self.warnings.truncate(checkpoint.warnings);
  }

  pub fn push_warning(&mut self, warning: Warning) {
    tracing::debug!(reason = %warning.reason, "{}", warning.message);
    self.warnings.push(warning);
  }

  pub fn warnings(&self) -> &[Warning] {
    &self.warnings
  }

  pub fn imports(&self) -> impl Iterator<Item = &ImportSpec> {
    self.imports.iter()
  }

  pub fn take_imports(&mut self) -> Vec<ImportSpec> {
    std::mem::take(&mut self.imports).into_iter().collect()
  }

  pub fn take_warnings(&mut self) -> Vec<Warning> {
    std::mem::take(&mut self.warnings)
  }

  fn add_imports(&mut self, imports: &[ImportSpec]) {
    for import in imports {
      self.imports.insert(import.clone());
    }
  }

  pub(crate) fn resolve_theme_path(
    &mut self,
    path: &[String],
    location: Option<SourceLocation>,
  ) -> Option<ThemeResolution> {
    let resolution = self.resolver.resolve_theme_path(path, location);
    tracing::trace!(path = %path.join("."), resolved = resolution.is_some(), "Theme path lookup");
    if let Some(resolution) = &resolution {
      self.add_imports(&resolution.required_imports);
    }
    resolution
  }

  /// Ask the resolver whether a theme flag is statically known, without
  /// recording imports for it.
  pub(crate) fn static_theme_flag(&self, path: &[String]) -> Option<bool> {
    let resolution = self.resolver.resolve_theme_path(path, None)?;
    match resolution.expr.trim() {
      "true" => Some(true),
      "false" => Some(false),
      _ => None,
    }
  }

  pub(crate) fn resolve_call(&mut self, expr: &Expr, property: Option<&str>) -> CallResolution {
    let resolution = self.resolver.resolve_call(expr, property);
    match &resolution {
      CallResolution::Value {
        required_imports, ..
      }
      | CallResolution::Styles {
        required_imports, ..
      } => {
        let imports = required_imports.clone();
        self.add_imports(&imports);
      }
      CallResolution::Unresolved { reason } => {
        tracing::trace!(%reason, "Helper call unresolved");
      }
    }
    resolution
  }

  pub(crate) fn parse_block(&self, expr: &Expr) -> Option<RuleSet> {
    self.block_parser.parse_block(expr)
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::adapter::NoBlockParser;
  use crate::testing::StaticResolver;

  #[test]
  fn test_rollback_drops_imports() {
    let resolver = StaticResolver::default()
      .with_theme_path("colors.primary", "vars.primary", Some(("./tokens.stylex", "vars")));
    let config = EngineConfig::default();
    let mut session = ResolutionSession::new(&resolver, &NoBlockParser, &config);

    let checkpoint = session.checkpoint();
    let resolved = session.resolve_theme_path(&["colors".into(), "primary".into()], None);
    assert_eq!(resolved.map(|r| r.expr), Some("vars.primary".to_string()));
    assert_eq!(session.imports().count(), 1);

    session.rollback(checkpoint);
    assert_eq!(session.imports().count(), 0);
  }

  #[test]
  fn test_imports_are_deduplicated() {
    let resolver = StaticResolver::default()
      .with_theme_path("colors.primary", "vars.primary", Some(("./tokens.stylex", "vars")))
      .with_theme_path("colors.muted", "vars.muted", Some(("./tokens.stylex", "vars")));
    let config = EngineConfig::default();
    let mut session = ResolutionSession::new(&resolver, &NoBlockParser, &config);

    session.resolve_theme_path(&["colors".into(), "primary".into()], None);
    session.resolve_theme_path(&["colors".into(), "muted".into()], None);
    assert_eq!(
      session.take_imports(),
      vec![ImportSpec::new("./tokens.stylex", "vars")]
    );
  }

  #[test]
  fn test_static_theme_flag() {
    let resolver = StaticResolver::default().with_theme_flag("isDark", true);
    let config = EngineConfig::default();
    let session = ResolutionSession::new(&resolver, &NoBlockParser, &config);
    assert_eq!(session.static_theme_flag(&["isDark".into()]), Some(true));
    assert_eq!(session.static_theme_flag(&["isCompact".into()]), None);
  }
}
