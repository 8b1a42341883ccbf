//! Test doubles for the engine's collaborators.

use indexmap::IndexMap;
use styled_atomic_swc_runner::{parse_expr, print_expr};
use swc_core::ecma::ast::{Callee, Expr, Tpl};

use crate::adapter::{CallResolution, CssBlockParser, ExpressionResolver, ImportSpec, ThemeResolution};
use crate::classify::{member_chain, strip};
use crate::ir::{Declaration, DeclarationValue, Rule, RuleSet, SlotMap, SourceLocation};

/// Parse a slot expression from source.
pub fn slot(code: &str) -> Box<Expr> {
  match parse_expr(code) {
    Ok(expr) => expr,
    Err(err) => panic!("Invalid slot expression `{}`: {}", code, err),
  }
}

/// Resolver answering from fixed tables.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
  theme_paths: IndexMap<String, ThemeResolution>,
  calls: IndexMap<String, CallResolution>,
}

impl StaticResolver {
  pub fn with_theme_path(mut self, path: &str, expr: &str, import: Option<(&str, &str)>) -> Self {
    self.theme_paths.insert(
      path.to_string(),
      ThemeResolution {
        expr: expr.to_string(),
        required_imports: import
          .map(|(source, specifier)| vec![ImportSpec::new(source, specifier)])
          .unwrap_or_default(),
      },
    );
    self
  }

  pub fn with_theme_flag(self, path: &str, value: bool) -> Self {
    self.with_theme_path(path, if value { "true" } else { "false" }, None)
  }

  /// Answer for calls to (or references of) `callee`, e.g. `darken` or `mixins.focus`.
  pub fn with_call(mut self, callee: &str, resolution: CallResolution) -> Self {
    self.calls.insert(callee.to_string(), resolution);
    self
  }
}

fn callee_key(expr: &Expr) -> String {
  let target = match strip(expr) {
    Expr::Call(call) => match &call.callee {
      Callee::Expr(callee) => &**callee,
      _ => expr,
    },
    other => other,
  };
  match member_chain(target) {
    Some((root, segments)) => std::iter::once(root)
      .chain(segments)
      .collect::<Vec<_>>()
      .join("."),
    None => print_expr(target).unwrap_or_default(),
  }
}

impl ExpressionResolver for StaticResolver {
  fn resolve_theme_path(
    &self,
    path: &[String],
    _location: Option<SourceLocation>,
  ) -> Option<ThemeResolution> {
    self.theme_paths.get(&path.join(".")).cloned()
  }

  fn resolve_call(&self, expr: &Expr, _property: Option<&str>) -> CallResolution {
    let key = callee_key(expr);
    match self.calls.get(&key) {
      Some(resolution) => resolution.clone(),
      None => CallResolution::Unresolved {
        reason: format!("No static value for `{}`", key),
      },
    }
  }
}

/// Parses `css` tagged templates and CSS strings with flat declarations and
/// nested `&`-selector or at-rule blocks.
#[derive(Debug, Default)]
pub struct TemplateBlockParser;

impl CssBlockParser for TemplateBlockParser {
  fn parse_block(&self, expr: &Expr) -> Option<RuleSet> {
    let mut slots = SlotMap::new();
    let text = match strip(expr) {
      Expr::TaggedTpl(tagged) => marked_template(&tagged.tpl, &mut slots),
      Expr::Tpl(tpl) => marked_template(tpl, &mut slots),
      Expr::Lit(swc_core::ecma::ast::Lit::Str(s)) => s.value.to_string(),
      _ => return None,
    };
    let rules = parse_css(&text)?;
    Some(RuleSet::new(rules, slots))
  }
}

fn marked_template(tpl: &Tpl, slots: &mut SlotMap) -> String {
  let mut text = String::new();
  for (index, quasi) in tpl.quasis.iter().enumerate() {
    match &quasi.cooked {
      Some(cooked) => text.push_str(cooked),
      None => text.push_str(&quasi.raw),
    }
    if let Some(expr) = tpl.exprs.get(index) {
      let id = slots.push(expr.clone());
      text.push_str(&id.placeholder());
    }
  }
  text
}

fn parse_declaration(segment: &str) -> Option<Declaration> {
  let segment = segment.trim();
  if segment.is_empty() {
    return None;
  }
  let Some((property, value)) = segment.split_once(':') else {
    return Some(Declaration {
      property: None,
      value: DeclarationValue::from_marked(segment),
      important: false,
      loc: None,
    });
  };
  let value = value.trim();
  let (value, important) = match value.strip_suffix("!important") {
    Some(rest) => (rest.trim_end(), true),
    None => (value, false),
  };
  let mut declaration = Declaration::marked(property.trim(), value);
  declaration.important = important;
  Some(declaration)
}

/// An open block: its selector context and the rule its declarations go to.
///
/// A declaration following a nested block starts a new rule so that rules
/// stay in source order.
struct OpenBlock {
  rule: Option<usize>,
  selector: String,
  at_rules: Vec<String>,
}

impl OpenBlock {
  fn push(&mut self, rules: &mut Vec<Rule>, declaration: Declaration) {
    let index = match self.rule {
      Some(index) => index,
      None => {
        rules.push(Rule {
          selector: self.selector.clone(),
          at_rules: self.at_rules.clone(),
          declarations: Vec::new(),
          loc: None,
        });
        self.rule = Some(rules.len() - 1);
        rules.len() - 1
      }
    };
    rules[index].declarations.push(declaration);
  }
}

/// Rules in source order; `None` on unbalanced braces.
pub fn parse_css(text: &str) -> Option<Vec<Rule>> {
  let mut rules = Vec::new();
  let mut stack = vec![OpenBlock {
    rule: None,
    selector: "&".to_string(),
    at_rules: Vec::new(),
  }];
  let mut segment = String::new();

  for ch in text.chars() {
    match ch {
      ';' => {
        if let Some(declaration) = parse_declaration(&segment) {
          stack.last_mut()?.push(&mut rules, declaration);
        }
        segment.clear();
      }
      '{' => {
        let header = segment.trim().to_string();
        segment.clear();
        let parent = stack.last_mut()?;
        parent.rule = None;
        let (selector, at_rules) = if header.starts_with('@') {
          let mut at_rules = parent.at_rules.clone();
          at_rules.push(header);
          (parent.selector.clone(), at_rules)
        } else if header.contains('&') {
          (header.replace('&', &parent.selector), parent.at_rules.clone())
        } else {
          (format!("{} {}", parent.selector, header), parent.at_rules.clone())
        };
        stack.push(OpenBlock {
          rule: None,
          selector,
          at_rules,
        });
      }
      '}' => {
        let mut block = stack.pop()?;
        if let Some(declaration) = parse_declaration(&segment) {
          block.push(&mut rules, declaration);
        }
        segment.clear();
        stack.last_mut()?.rule = None;
      }
      other => segment.push(other),
    }
  }

  if stack.len() != 1 {
    return None;
  }
  if let Some(declaration) = parse_declaration(&segment) {
    stack.last_mut()?.push(&mut rules, declaration);
  }
  Some(rules)
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::ir::{SlotId, ValuePart};

  #[test]
  fn test_parse_css_nesting() {
    let rules = parse_css("color: red; &:hover { color: blue; } @media (min-width: 600px) { color: green }").unwrap();
    assert_eq!(rules.len(), 3);
    assert_eq!(rules[0].declarations, vec![Declaration::literal("color", "red")]);
    assert_eq!(rules[1].selector, "&:hover");
    assert_eq!(rules[2].selector, "&");
    assert_eq!(rules[2].at_rules, vec!["@media (min-width: 600px)".to_string()]);
    assert_eq!(rules[2].declarations, vec![Declaration::literal("color", "green")]);
  }

  #[test]
  fn test_parse_css_unbalanced() {
    assert_eq!(parse_css("&:hover { color: blue;"), None);
    assert_eq!(parse_css("color: blue; }"), None);
  }

  #[test]
  fn test_parse_css_keeps_source_order() {
    let rules = parse_css("color: red; &:hover { color: blue; } opacity: 1;").unwrap();
    let selectors: Vec<&str> = rules.iter().map(|rule| rule.selector.as_str()).collect();
    assert_eq!(selectors, vec!["&", "&:hover", "&"]);
    assert_eq!(rules[2].declarations, vec![Declaration::literal("opacity", "1")]);
  }

  #[test]
  fn test_tagged_template_slots() {
    let expr = slot("css`color: ${p => p.theme.colors.fg}; ${mixin};`");
    let rule_set = TemplateBlockParser.parse_block(&expr).unwrap();
    assert_eq!(rule_set.slots.len(), 2);
    let declarations = &rule_set.rules[0].declarations;
    assert_eq!(declarations[0].value.slots(), vec![SlotId(0)]);
    assert_eq!(declarations[1].property, None);
    assert_eq!(
      declarations[1].value,
      DeclarationValue::Interpolated(vec![ValuePart::Slot(SlotId(1))])
    );
  }

  #[test]
  fn test_important_flag() {
    let rules = parse_css("color: red !important;").unwrap();
    assert!(rules[0].declarations[0].important);
    assert_eq!(
      rules[0].declarations[0].value,
      DeclarationValue::Static("red".into())
    );
  }

  #[test]
  fn test_static_resolver_calls() {
    let resolver = StaticResolver::default().with_call(
      "mixins.focus",
      CallResolution::Styles {
        expr: "mixins.focus".into(),
        required_imports: vec![],
      },
    );
    assert!(matches!(
      resolver.resolve_call(&slot("mixins.focus()"), None),
      CallResolution::Styles { .. }
    ));
    assert!(matches!(
      resolver.resolve_call(&slot("darken('red')"), None),
      CallResolution::Unresolved { .. }
    ));
  }
}
