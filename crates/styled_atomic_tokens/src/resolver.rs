use std::{path::Path, sync::Arc};

use styled_atomic::{
  adapter::{CallResolution, ExpressionResolver, ImportSpec, ThemeResolution},
  classify::{member_chain, strip},
  ir::SourceLocation,
};
use swc_core::ecma::ast::{Callee, Expr, ExprOrSpread, Lit};

use crate::token_table::{get_or_load_token_table, ModuleRef, TokenTable};

/// Resolves theme paths, `token("name")` calls and mixin references from a
/// [`TokenTable`].
#[derive(Debug, Clone)]
pub struct TokenResolver {
  table: Arc<TokenTable>,
}

impl TokenResolver {
  pub fn new(table: Arc<TokenTable>) -> Self {
    TokenResolver { table }
  }

  pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
    Ok(TokenResolver::new(get_or_load_token_table(path)?))
  }

  pub fn table(&self) -> &TokenTable {
    &self.table
  }

  fn resolve_token(&self, args: &[ExprOrSpread]) -> CallResolution {
    let Some(name) = args.first().and_then(|arg| string_arg(arg)) else {
      return CallResolution::Unresolved {
        reason: "token() needs a string literal name".into(),
      };
    };
    let Some(variable) = self.table.token_names.get(&name) else {
      return CallResolution::Unresolved {
        reason: format!("Unknown token `{}`", name),
      };
    };

    let fallback = args
      .get(1)
      .and_then(string_arg)
      .or_else(|| self.table.light_values.get(&name).cloned());
    let css = match fallback {
      Some(fallback) => format!("var({}, {})", variable, fallback),
      None => format!("var({})", variable),
    };
    tracing::trace!(%name, %css, "Resolved token");
    CallResolution::Value {
      expr: format!("{:?}", css),
      required_imports: Vec::new(),
      css_text: Some(css),
    }
  }

  fn resolve_mixin(&self, callee: &Expr) -> CallResolution {
    let key = match member_chain(callee) {
      Some((root, segments)) => std::iter::once(root)
        .chain(segments)
        .collect::<Vec<_>>()
        .join("."),
      None => {
        return CallResolution::Unresolved {
          reason: "Only named helpers can be resolved".into(),
        }
      }
    };
    match &self.table.mixins {
      Some(module) if self.table.mixin_names.contains(&key) => {
        let name = key.rsplit('.').next().unwrap_or(&key);
        CallResolution::Styles {
          expr: property_access(&module.export, name),
          required_imports: vec![import_of(module)],
        }
      }
      _ => CallResolution::Unresolved {
        reason: format!("`{}` is not a known token or mixin", key),
      },
    }
  }
}

fn string_arg(arg: &ExprOrSpread) -> Option<String> {
  if arg.spread.is_some() {
    return None;
  }
  match strip(&arg.expr) {
    Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
    Expr::Tpl(tpl) if tpl.exprs.is_empty() => tpl
      .quasis
      .first()
      .and_then(|quasi| quasi.cooked.as_ref())
      .map(|cooked| cooked.to_string()),
    _ => None,
  }
}

fn is_identifier(name: &str) -> bool {
  let mut chars = name.chars();
  chars
    .next()
    .is_some_and(|first| first.is_ascii_alphabetic() || first == '_' || first == '$')
    && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '$')
}

fn property_access(object: &str, key: &str) -> String {
  if is_identifier(key) {
    format!("{}.{}", object, key)
  } else {
    format!("{}[{:?}]", object, key)
  }
}

fn import_of(module: &ModuleRef) -> ImportSpec {
  ImportSpec::new(&module.source, &module.export)
}

impl ExpressionResolver for TokenResolver {
  fn resolve_theme_path(
    &self,
    path: &[String],
    location: Option<SourceLocation>,
  ) -> Option<ThemeResolution> {
    let key = path.join(".");
    if let Some(source) = self.table.values.get(&key) {
      return Some(ThemeResolution {
        expr: source.clone(),
        required_imports: Vec::new(),
      });
    }
    match (self.table.theme.get(&key), &self.table.vars) {
      (Some(variable), Some(module)) => Some(ThemeResolution {
        expr: property_access(&module.export, variable),
        required_imports: vec![import_of(module)],
      }),
      _ => {
        tracing::debug!(path = %key, ?location, "Theme path is not in the token table");
        None
      }
    }
  }

  fn resolve_call(&self, expr: &Expr, _property: Option<&str>) -> CallResolution {
    match strip(expr) {
      Expr::Call(call) => match &call.callee {
        Callee::Expr(callee) if matches!(strip(callee), Expr::Ident(ident) if &*ident.sym == "token") => {
          self.resolve_token(&call.args)
        }
        Callee::Expr(callee) => self.resolve_mixin(callee),
        _ => CallResolution::Unresolved {
          reason: "Only named helpers can be resolved".into(),
        },
      },
      other => self.resolve_mixin(other),
    }
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;
  use styled_atomic_swc_runner::parse_expr;

  use super::*;
  use crate::token_table::parse_token_table;

  fn resolver() -> TokenResolver {
    let table = parse_token_table(
      r##"{
        vars: { source: "./tokens.stylex", export: "vars" },
        theme: { "colors.primary": "colorPrimary", "colors.brand-bold": "brand-bold" },
        values: { "space.sm": "4px", isDark: false },
        tokenNames: { "color.text": "--ds-text", "space.100": "--ds-space-100" },
        light: { "color.text": "#172B4D" },
        mixins: { source: "./mixins.stylex", export: "mixins", names: ["focusRing", "mixins.truncate"] },
      }"##,
    )
    .unwrap();
    TokenResolver::new(Arc::new(table))
  }

  fn path(text: &str) -> Vec<String> {
    text.split('.').map(str::to_string).collect()
  }

  fn call(code: &str) -> CallResolution {
    resolver().resolve_call(&parse_expr(code).unwrap(), Some("color"))
  }

  #[test]
  fn test_theme_paths() {
    let resolver = resolver();
    assert_eq!(
      resolver.resolve_theme_path(&path("colors.primary"), None),
      Some(ThemeResolution {
        expr: "vars.colorPrimary".into(),
        required_imports: vec![ImportSpec::new("./tokens.stylex", "vars")],
      })
    );
    assert_eq!(
      resolver
        .resolve_theme_path(&path("colors.brand-bold"), None)
        .unwrap()
        .expr,
      r#"vars["brand-bold"]"#
    );
    assert_eq!(
      resolver.resolve_theme_path(&path("space.sm"), None).unwrap().expr,
      "\"4px\""
    );
    assert_eq!(resolver.resolve_theme_path(&path("isDark"), None).unwrap().expr, "false");
    assert_eq!(resolver.resolve_theme_path(&path("colors.missing"), None), None);
  }

  #[test]
  fn test_token_calls() {
    assert_eq!(
      call("token('color.text')"),
      CallResolution::Value {
        expr: "\"var(--ds-text, #172B4D)\"".into(),
        required_imports: Vec::new(),
        css_text: Some("var(--ds-text, #172B4D)".into()),
      }
    );
    let CallResolution::Value { css_text, .. } = call("token('space.100', '8px')") else {
      panic!("expected a value");
    };
    assert_eq!(css_text.as_deref(), Some("var(--ds-space-100, 8px)"));
    assert!(matches!(call("token('color.nope')"), CallResolution::Unresolved { .. }));
    assert!(matches!(call("token(name)"), CallResolution::Unresolved { .. }));
  }

  #[test]
  fn test_mixins() {
    assert_eq!(
      call("focusRing()"),
      CallResolution::Styles {
        expr: "mixins.focusRing".into(),
        required_imports: vec![ImportSpec::new("./mixins.stylex", "mixins")],
      }
    );
    assert!(matches!(call("mixins.truncate"), CallResolution::Styles { .. }));
    assert!(matches!(call("darken(red)"), CallResolution::Unresolved { .. }));
  }
}
