//! Shape-based classification of interpolated slot expressions.
//!
//! Nothing here evaluates an expression. A slot is matched against the
//! patterns the engine knows how to turn into static styles; anything else is
//! [`Classification::Unclassified`] and aborts the component.

use indexmap::IndexMap;
use swc_core::ecma::ast::{
  BinaryOp, BlockStmt, BlockStmtOrExpr, CondExpr, Expr, Lit, MemberProp, Number, ObjectPatProp,
  OptChainBase, Pat, PropName, Stmt, Tpl, UnaryOp,
};

use crate::condition::{CaseValue, CompareOp, ConditionInfo, ConditionKey, ConditionTest, Subject};
use crate::diagnostics::{Bail, ReasonCode};
use crate::utils::trim_float;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestructuredProp {
  pub prop: String,
  pub default: Option<String>,
}

/// What the slot function's parameter binds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ParamBinding {
  #[default]
  None,
  /// `props => ...`
  Single(String),
  /// `({ size = "medium", theme, ...rest }) => ...`, keyed by local name.
  Destructured {
    locals: IndexMap<String, DestructuredProp>,
    rest: Option<String>,
  },
}

impl ParamBinding {
  fn from_pat(pat: &Pat) -> Option<ParamBinding> {
    match pat {
      Pat::Ident(binding) => Some(ParamBinding::Single(binding.id.sym.to_string())),
      Pat::Assign(assign) => ParamBinding::from_pat(&assign.left),
      Pat::Object(object) => {
        let mut locals = IndexMap::new();
        let mut rest = None;
        for prop in &object.props {
          match prop {
            ObjectPatProp::Assign(assign) => {
              let local = assign.key.id.sym.to_string();
              let default = assign.value.as_deref().and_then(literal_text);
              locals.insert(
                local.clone(),
                DestructuredProp {
                  prop: local,
                  default,
                },
              );
            }
            ObjectPatProp::KeyValue(key_value) => {
              let prop = match &key_value.key {
                PropName::Ident(ident) => ident.sym.to_string(),
                PropName::Str(s) => s.value.to_string(),
                _ => continue,
              };
              let (local, default) = match &*key_value.value {
                Pat::Ident(binding) => (binding.id.sym.to_string(), None),
                Pat::Assign(assign) => match &*assign.left {
                  Pat::Ident(binding) => (binding.id.sym.to_string(), literal_text(&assign.right)),
                  _ => continue,
                },
                _ => continue,
              };
              locals.insert(local, DestructuredProp { prop, default });
            }
            ObjectPatProp::Rest(rest_pat) => {
              if let Pat::Ident(binding) = &*rest_pat.arg {
                rest = Some(binding.id.sym.to_string());
              }
            }
          }
        }
        Some(ParamBinding::Destructured { locals, rest })
      }
      _ => None,
    }
  }

  /// Local names the binding introduces.
  pub fn names(&self) -> Vec<String> {
    match self {
      ParamBinding::None => Vec::new(),
      ParamBinding::Single(name) => vec![name.clone()],
      ParamBinding::Destructured { locals, rest } => locals
        .keys()
        .cloned()
        .chain(rest.iter().cloned())
        .collect(),
    }
  }

  pub(crate) fn is_props_object(&self, name: &str) -> bool {
    match self {
      ParamBinding::Single(param) => param == name,
      ParamBinding::Destructured { rest, .. } => rest.as_deref() == Some(name),
      ParamBinding::None => false,
    }
  }

  pub(crate) fn local(&self, name: &str) -> Option<&DestructuredProp> {
    match self {
      ParamBinding::Destructured { locals, .. } => locals.get(name),
      _ => None,
    }
  }

  /// Destructuring default of `prop`, if any.
  pub fn default_for(&self, prop: &str) -> Option<String> {
    match self {
      ParamBinding::Destructured { locals, .. } => locals
        .values()
        .find(|local| local.prop == prop)
        .and_then(|local| local.default.clone()),
      _ => None,
    }
  }
}

fn binding_from_params<'p>(mut params: impl Iterator<Item = &'p Pat>) -> Result<ParamBinding, Bail> {
  let binding = match params.next() {
    None => ParamBinding::None,
    Some(pat) => ParamBinding::from_pat(pat).ok_or_else(|| {
      Bail::new(
        ReasonCode::UnclassifiableExpression,
        "Unsupported parameter pattern in interpolation",
      )
    })?,
  };
  if params.next().is_some() {
    return Err(Bail::new(
      ReasonCode::UnclassifiableExpression,
      "Interpolation functions take a single props parameter",
    ));
  }
  Ok(binding)
}

fn single_return(block: &BlockStmt) -> Result<&Expr, Bail> {
  match block.stmts.as_slice() {
    [Stmt::Return(ret)] => ret.arg.as_deref().ok_or_else(|| {
      Bail::new(
        ReasonCode::UnclassifiableExpression,
        "Interpolation function returns nothing",
      )
    }),
    _ => Err(Bail::new(
      ReasonCode::UnclassifiableExpression,
      "Interpolation function body must be a single return statement",
    )),
  }
}

/// Split a slot into its parameter binding and the expression it produces.
///
/// Non-function slots keep the binding of the enclosing interpolation.
pub fn unwrap_slot<'a>(expr: &'a Expr, outer: &ParamBinding) -> Result<(ParamBinding, &'a Expr), Bail> {
  match strip(expr) {
    Expr::Arrow(arrow) => {
      let binding = binding_from_params(arrow.params.iter())?;
      let body = match &*arrow.body {
        BlockStmtOrExpr::Expr(body) => strip(body),
        BlockStmtOrExpr::BlockStmt(block) => strip(single_return(block)?),
      };
      Ok((binding, body))
    }
    Expr::Fn(function) => {
      let binding = binding_from_params(function.function.params.iter().map(|param| &param.pat))?;
      let block = function.function.body.as_ref().ok_or_else(|| {
        Bail::new(ReasonCode::UnclassifiableExpression, "Interpolation function has no body")
      })?;
      Ok((binding, strip(single_return(block)?)))
    }
    other => Ok((outer.clone(), other)),
  }
}

/// Remove parentheses and TypeScript-only wrappers.
pub fn strip(expr: &Expr) -> &Expr {
  match expr {
    Expr::Paren(paren) => strip(&paren.expr),
    Expr::TsAs(ts) => strip(&ts.expr),
    Expr::TsNonNull(ts) => strip(&ts.expr),
    Expr::TsConstAssertion(ts) => strip(&ts.expr),
    Expr::TsSatisfies(ts) => strip(&ts.expr),
    other => other,
  }
}

fn number_text(number: &Number) -> String {
  match &number.raw {
    Some(raw) => raw.to_string(),
    None => trim_float(number.value),
  }
}

/// Text of a string or number literal.
pub fn literal_text(expr: &Expr) -> Option<String> {
  match strip(expr) {
    Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
    Expr::Lit(Lit::Num(n)) => Some(number_text(n)),
    Expr::Tpl(tpl) if tpl.exprs.is_empty() => Some(quasi_text(tpl, 0)),
    _ => None,
  }
}

fn case_literal(expr: &Expr) -> Option<CaseValue> {
  match strip(expr) {
    Expr::Lit(Lit::Str(s)) => Some(CaseValue::Str(s.value.to_string())),
    Expr::Lit(Lit::Num(n)) => Some(CaseValue::Num(number_text(n))),
    _ => None,
  }
}

fn quasi_text(tpl: &Tpl, index: usize) -> String {
  tpl
    .quasis
    .get(index)
    .map(|quasi| match &quasi.cooked {
      Some(cooked) => cooked.to_string(),
      None => quasi.raw.to_string(),
    })
    .unwrap_or_default()
}

/// `(root identifier, member segments)` of a plain member chain.
pub fn member_chain(expr: &Expr) -> Option<(String, Vec<String>)> {
  let mut segments = Vec::new();
  let mut current = strip(expr);
  loop {
    match current {
      Expr::Member(member) => {
        segments.push(member_prop_name(&member.prop)?);
        current = strip(&member.obj);
      }
      Expr::OptChain(chain) => match &*chain.base {
        OptChainBase::Member(member) => {
          segments.push(member_prop_name(&member.prop)?);
          current = strip(&member.obj);
        }
        OptChainBase::Call(_) => return None,
      },
      Expr::Ident(ident) => {
        segments.reverse();
        return Some((ident.sym.to_string(), segments));
      }
      _ => return None,
    }
  }
}

fn member_prop_name(prop: &MemberProp) -> Option<String> {
  match prop {
    MemberProp::Ident(ident) => Some(ident.sym.to_string()),
    MemberProp::Computed(computed) => match strip(&computed.expr) {
      Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
      _ => None,
    },
    MemberProp::PrivateName(_) => None,
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropRef {
  pub prop: String,
  pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateItem<'a> {
  Text(String),
  Expr(&'a Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification<'a> {
  /// A string or number usable as CSS text.
  Literal(String),
  /// `false`, `null`, `undefined`, `""`: the declaration is omitted.
  Empty,
  ThemePath(Vec<String>),
  PropValue(PropRef),
  /// Arithmetic or fallbacks over props, kept as a style-function body.
  PropExpression {
    expr: &'a Expr,
    props: Vec<String>,
  },
  Template(Vec<TemplateItem<'a>>),
  Conditional {
    condition: ConditionKey,
    consequent: &'a Expr,
    alternate: &'a Expr,
  },
  ChainedTernary {
    prop: String,
    cases: Vec<(CaseValue, &'a Expr)>,
    default: &'a Expr,
  },
  Guarded {
    condition: ConditionKey,
    rhs: &'a Expr,
  },
  /// Delegated whole to the expression resolver.
  HelperCall(&'a Expr),
  /// A nested CSS block: tagged template, object literal or CSS string.
  Block(&'a Expr),
  Unclassified {
    reason: ReasonCode,
    message: String,
  },
}

impl Classification<'_> {
  fn unclassified(reason: ReasonCode, message: impl Into<String>) -> Self {
    Classification::Unclassified {
      reason,
      message: message.into(),
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      Classification::Literal(_) => "literal",
      Classification::Empty => "empty",
      Classification::ThemePath(_) => "theme-path",
      Classification::PropValue(_) => "prop-value",
      Classification::PropExpression { .. } => "prop-expression",
      Classification::Template(_) => "template",
      Classification::Conditional { .. } => "conditional",
      Classification::ChainedTernary { .. } => "chained-ternary",
      Classification::Guarded { .. } => "guarded",
      Classification::HelperCall(_) => "helper-call",
      Classification::Block(_) => "block",
      Classification::Unclassified { .. } => "unclassified",
    }
  }
}

enum BoundRef {
  Theme(Vec<String>),
  Prop {
    prop: String,
    rest: Vec<String>,
    default: Option<String>,
  },
}

pub struct Classifier<'c> {
  binding: &'c ParamBinding,
  theme_segment: &'c str,
  has_property: bool,
}

impl<'c> Classifier<'c> {
  pub fn new(binding: &'c ParamBinding, theme_segment: &'c str, has_property: bool) -> Self {
    Classifier {
      binding,
      theme_segment,
      has_property,
    }
  }

  fn bound_ref(&self, expr: &Expr) -> Option<BoundRef> {
    let (root, segments) = member_chain(expr)?;
    if self.binding.is_props_object(&root) {
      let (first, rest) = segments.split_first()?;
      if first == self.theme_segment {
        return Some(BoundRef::Theme(rest.to_vec()));
      }
      return Some(BoundRef::Prop {
        prop: first.clone(),
        rest: rest.to_vec(),
        default: None,
      });
    }
    let local = self.binding.local(&root)?;
    if local.prop == self.theme_segment {
      return Some(BoundRef::Theme(segments));
    }
    Some(BoundRef::Prop {
      prop: local.prop.clone(),
      rest: segments,
      default: local.default.clone(),
    })
  }

  fn subject_of(&self, expr: &Expr) -> Option<Subject> {
    match self.bound_ref(expr)? {
      BoundRef::Theme(path) if !path.is_empty() => Some(Subject::Theme(path)),
      BoundRef::Prop { prop, rest, .. } if rest.is_empty() => Some(Subject::Prop(prop)),
      _ => None,
    }
  }

  /// Normalise a conditional test into a condition key.
  pub fn condition_of(&self, test: &Expr) -> Option<ConditionKey> {
    match strip(test) {
      Expr::Unary(unary) if unary.op == UnaryOp::Bang => {
        let inner = self.condition_of(&unary.arg)?;
        let single = inner.as_single()?;
        Some(ConditionKey::single(single.negated()))
      }
      Expr::Bin(bin) if bin.op == BinaryOp::LogicalAnd => {
        let left = self.condition_of(&bin.left)?;
        let right = self.condition_of(&bin.right)?;
        Some(left.and_key(&right))
      }
      Expr::Bin(bin)
        if matches!(
          bin.op,
          BinaryOp::EqEqEq | BinaryOp::EqEq | BinaryOp::NotEqEq | BinaryOp::NotEq
        ) =>
      {
        let op = match bin.op {
          BinaryOp::EqEqEq | BinaryOp::EqEq => CompareOp::Eq,
          _ => CompareOp::NotEq,
        };
        let (subject_expr, value) = match (case_literal(&bin.right), case_literal(&bin.left)) {
          (Some(value), _) => (&bin.left, value),
          (None, Some(value)) => (&bin.right, value),
          (None, None) => return None,
        };
        let subject = self.subject_of(subject_expr)?;
        Some(ConditionKey::single(ConditionInfo {
          subject,
          test: ConditionTest::Compare { op, value },
        }))
      }
      other => {
        let subject = self.subject_of(other)?;
        Some(ConditionKey::single(ConditionInfo {
          subject,
          test: ConditionTest::Truthy,
        }))
      }
    }
  }

  pub fn classify<'a>(&self, expr: &'a Expr) -> Classification<'a> {
    let expr = strip(expr);
    match expr {
      Expr::Lit(Lit::Bool(_)) | Expr::Lit(Lit::Null(_)) => Classification::Empty,
      Expr::Ident(ident) if &*ident.sym == "undefined" => Classification::Empty,
      Expr::Lit(Lit::Str(s)) if s.value.trim().is_empty() => Classification::Empty,
      Expr::Lit(Lit::Str(s)) => {
        if self.has_property {
          Classification::Literal(s.value.to_string())
        } else {
          Classification::Block(expr)
        }
      }
      Expr::Lit(Lit::Num(n)) => Classification::Literal(number_text(n)),
      Expr::Tpl(tpl) => self.classify_template(expr, tpl),
      Expr::TaggedTpl(_) | Expr::Object(_) => {
        if self.has_property {
          Classification::unclassified(
            ReasonCode::UnsupportedBlock,
            "CSS block used as a property value",
          )
        } else {
          Classification::Block(expr)
        }
      }
      Expr::Cond(cond) => self.classify_conditional(cond),
      Expr::Bin(bin) if bin.op == BinaryOp::LogicalAnd => match self.condition_of(&bin.left) {
        Some(condition) => Classification::Guarded {
          condition,
          rhs: strip(&bin.right),
        },
        None => Classification::unclassified(
          ReasonCode::UnclassifiableExpression,
          "Guard is not a prop or theme test",
        ),
      },
      Expr::Bin(bin) if matches!(bin.op, BinaryOp::LogicalOr | BinaryOp::NullishCoalescing) => {
        if let (Some(BoundRef::Prop { prop, rest, .. }), Some(default)) =
          (self.bound_ref(&bin.left), literal_text(&bin.right))
        {
          if rest.is_empty() {
            return Classification::PropValue(PropRef {
              prop,
              default: Some(default),
            });
          }
        }
        self.classify_expression(expr)
      }
      Expr::Call(_) => Classification::HelperCall(expr),
      Expr::Arrow(_) | Expr::Fn(_) => Classification::unclassified(
        ReasonCode::UnclassifiableExpression,
        "Interpolation returns a function",
      ),
      _ => {
        if let Some(bound) = self.bound_ref(expr) {
          return match bound {
            BoundRef::Theme(path) if path.is_empty() => Classification::unclassified(
              ReasonCode::UnclassifiableExpression,
              "The theme object itself is not a CSS value",
            ),
            BoundRef::Theme(path) => Classification::ThemePath(path),
            BoundRef::Prop {
              prop,
              rest,
              default,
            } if rest.is_empty() => Classification::PropValue(PropRef { prop, default }),
            BoundRef::Prop { prop, .. } => Classification::PropExpression {
              expr,
              props: vec![prop],
            },
          };
        }
        if member_chain(expr).is_some() {
          return Classification::HelperCall(expr);
        }
        self.classify_expression(expr)
      }
    }
  }

  fn classify_template<'a>(&self, expr: &'a Expr, tpl: &'a Tpl) -> Classification<'a> {
    if !self.has_property {
      if tpl.exprs.is_empty() && quasi_text(tpl, 0).trim().is_empty() {
        return Classification::Empty;
      }
      return Classification::Block(expr);
    }
    if tpl.exprs.is_empty() {
      let text = quasi_text(tpl, 0);
      if text.trim().is_empty() {
        return Classification::Empty;
      }
      return Classification::Literal(text);
    }

    let mut items = Vec::new();
    for (index, part) in tpl.exprs.iter().enumerate() {
      let text = quasi_text(tpl, index);
      if !text.is_empty() {
        items.push(TemplateItem::Text(text));
      }
      items.push(TemplateItem::Expr(strip(part)));
    }
    let tail = quasi_text(tpl, tpl.exprs.len());
    if !tail.is_empty() {
      items.push(TemplateItem::Text(tail));
    }
    Classification::Template(items)
  }

  fn classify_conditional<'a>(&self, cond: &'a CondExpr) -> Classification<'a> {
    let Some(condition) = self.condition_of(&cond.test) else {
      return Classification::unclassified(
        ReasonCode::UnclassifiableExpression,
        "Conditional test is not a prop or theme test",
      );
    };

    if let Some((prop, _)) = condition.as_single().and_then(ConditionInfo::as_prop_eq) {
      if let Some(next_prop) = self.next_link_prop(&cond.alt) {
        if next_prop == prop {
          return self.classify_chain(prop.to_string(), cond);
        }
        return Classification::unclassified(
          ReasonCode::MismatchedTernaryChain,
          format!(
            "Ternary chain tests `{}` and then `{}`",
            prop, next_prop
          ),
        );
      }
    }

    Classification::Conditional {
      condition,
      consequent: strip(&cond.cons),
      alternate: strip(&cond.alt),
    }
  }

  /// The prop of `prop === literal` when `expr` is a conditional with that test.
  fn next_link_prop(&self, expr: &Expr) -> Option<String> {
    let Expr::Cond(next) = strip(expr) else {
      return None;
    };
    let key = self.condition_of(&next.test)?;
    let (prop, _) = key.as_single()?.as_prop_eq()?;
    Some(prop.to_string())
  }

  fn classify_chain<'a>(&self, prop: String, head: &'a CondExpr) -> Classification<'a> {
    let mut cases: Vec<(CaseValue, &'a Expr)> = Vec::new();
    let mut current = head;
    loop {
      let key = self.condition_of(&current.test);
      let Some((link_prop, case)) = key
        .as_ref()
        .and_then(ConditionKey::as_single)
        .and_then(ConditionInfo::as_prop_eq)
      else {
        return Classification::unclassified(
          ReasonCode::MismatchedTernaryChain,
          "Ternary chain link is not an equality test",
        );
      };
      if link_prop != prop {
        return Classification::unclassified(
          ReasonCode::MismatchedTernaryChain,
          format!("Ternary chain tests `{}` and then `{}`", prop, link_prop),
        );
      }
      // An earlier link with the same case shadows later ones.
      if !cases.iter().any(|(existing, _)| existing == case) {
        cases.push((case.clone(), strip(&current.cons)));
      }

      let alternate = strip(&current.alt);
      match alternate {
        Expr::Cond(next) if self.next_link_prop(alternate).is_some() => current = next,
        _ => {
          return Classification::ChainedTernary {
            prop,
            cases,
            default: alternate,
          }
        }
      }
    }
  }

  fn classify_expression<'a>(&self, expr: &'a Expr) -> Classification<'a> {
    let mut props = Vec::new();
    if self.collect_props(expr, &mut props) && !props.is_empty() {
      Classification::PropExpression { expr, props }
    } else {
      Classification::unclassified(
        ReasonCode::UnclassifiableExpression,
        "Expression does not match a supported interpolation pattern",
      )
    }
  }

  /// Collect the props an expression reads; false when it reads anything else.
  fn collect_props(&self, expr: &Expr, props: &mut Vec<String>) -> bool {
    match strip(expr) {
      Expr::Lit(Lit::Str(_)) | Expr::Lit(Lit::Num(_)) => true,
      Expr::Bin(bin) => self.collect_props(&bin.left, props) && self.collect_props(&bin.right, props),
      Expr::Unary(unary) if matches!(unary.op, UnaryOp::Minus | UnaryOp::Plus | UnaryOp::Bang) => {
        self.collect_props(&unary.arg, props)
      }
      Expr::Cond(cond) => {
        self.collect_props(&cond.test, props)
          && self.collect_props(&cond.cons, props)
          && self.collect_props(&cond.alt, props)
      }
      Expr::Tpl(tpl) => tpl.exprs.iter().all(|part| self.collect_props(part, props)),
      other => match self.bound_ref(other) {
        Some(BoundRef::Prop { prop, .. }) => {
          if !props.contains(&prop) {
            props.push(prop);
          }
          true
        }
        _ => false,
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;
  use styled_atomic_swc_runner::parse_expr;

  use super::*;

  fn classify_kind(code: &str, has_property: bool) -> String {
    let expr = parse_expr(code).unwrap();
    let (binding, body) = unwrap_slot(&expr, &ParamBinding::None).unwrap();
    Classifier::new(&binding, "theme", has_property)
      .classify(body)
      .kind()
      .to_string()
  }

  fn with_classification(code: &str, has_property: bool, check: impl FnOnce(Classification<'_>)) {
    let expr = parse_expr(code).unwrap();
    let (binding, body) = unwrap_slot(&expr, &ParamBinding::None).unwrap();
    check(Classifier::new(&binding, "theme", has_property).classify(body));
  }

  #[test]
  fn test_theme_path() {
    with_classification("props => props.theme.colors.primary", true, |c| {
      assert_eq!(
        c,
        Classification::ThemePath(vec!["colors".into(), "primary".into()])
      );
    });
    with_classification("({ theme }) => theme.space[2]", true, |c| {
      assert_eq!(c.kind(), "unclassified");
    });
    with_classification("({ theme }) => theme.space['2']", true, |c| {
      assert_eq!(c, Classification::ThemePath(vec!["space".into(), "2".into()]));
    });
  }

  #[test]
  fn test_prop_value_and_default() {
    with_classification("p => p.width", true, |c| {
      assert_eq!(
        c,
        Classification::PropValue(PropRef {
          prop: "width".into(),
          default: None
        })
      );
    });
    with_classification("p => p.width || '100%'", true, |c| {
      assert_eq!(
        c,
        Classification::PropValue(PropRef {
          prop: "width".into(),
          default: Some("100%".into())
        })
      );
    });
    with_classification("({ $gap = 8 }) => $gap", true, |c| {
      assert_eq!(
        c,
        Classification::PropValue(PropRef {
          prop: "$gap".into(),
          default: Some("8".into())
        })
      );
    });
  }

  #[test]
  fn test_boolean_conditional() {
    with_classification("p => p.disabled ? 'gray' : 'blue'", true, |c| {
      let Classification::Conditional { condition, .. } = c else {
        panic!("expected a conditional");
      };
      assert_eq!(condition.to_string(), "disabled");
    });
    with_classification("p => !p.disabled ? 'gray' : 'blue'", true, |c| {
      let Classification::Conditional { condition, .. } = c else {
        panic!("expected a conditional");
      };
      assert_eq!(condition.to_string(), "!disabled");
    });
    with_classification("p => !!p.disabled ? 'gray' : 'blue'", true, |c| {
      let Classification::Conditional { condition, .. } = c else {
        panic!("expected a conditional");
      };
      assert_eq!(condition.to_string(), "disabled");
    });
  }

  #[test]
  fn test_enum_comparison_either_side() {
    with_classification("p => 'small' == p.size ? '4px' : '8px'", true, |c| {
      let Classification::Conditional { condition, .. } = c else {
        panic!("expected a conditional");
      };
      assert_eq!(condition.to_string(), r#"size === "small""#);
    });
    with_classification("({ size }) => size !== 'small' ? '4px' : '8px'", true, |c| {
      let Classification::Conditional { condition, .. } = c else {
        panic!("expected a conditional");
      };
      assert_eq!(condition.to_string(), r#"size !== "small""#);
    });
  }

  #[test]
  fn test_chained_ternary() {
    with_classification(
      "p => p.size === 'small' ? '24px' : p.size === 'large' ? '48px' : p.size === 'small' ? '1px' : '32px'",
      true,
      |c| {
        let Classification::ChainedTernary {
          prop,
          cases,
          default,
        } = c
        else {
          panic!("expected a chain");
        };
        assert_eq!(prop, "size");
        let names: Vec<&str> = cases.iter().map(|(case, _)| case.as_key()).collect();
        assert_eq!(names, vec!["small", "large"]);
        assert_eq!(literal_text(default), Some("32px".into()));
      },
    );
  }

  #[test]
  fn test_mismatched_chain() {
    with_classification(
      "p => p.size === 'small' ? '24px' : p.variant === 'ghost' ? '0' : '32px'",
      true,
      |c| {
        assert!(matches!(
          c,
          Classification::Unclassified {
            reason: ReasonCode::MismatchedTernaryChain,
            ..
          }
        ));
      },
    );
  }

  #[test]
  fn test_guarded_block() {
    with_classification("p => p.active && css`color: red;`", false, |c| {
      let Classification::Guarded { condition, rhs } = c else {
        panic!("expected a guard");
      };
      assert_eq!(condition.to_string(), "active");
      assert!(matches!(rhs, Expr::TaggedTpl(_)));
    });
    with_classification(
      "p => p.active && p.size === 'large' && { color: 'red' }",
      false,
      |c| {
        let Classification::Guarded { condition, .. } = c else {
          panic!("expected a guard");
        };
        assert_eq!(condition.to_string(), r#"active && size === "large""#);
      },
    );
  }

  #[test]
  fn test_theme_flag_condition() {
    with_classification("p => p.theme.isDark ? 'black' : 'white'", true, |c| {
      let Classification::Conditional { condition, .. } = c else {
        panic!("expected a conditional");
      };
      assert_eq!(condition.to_string(), "theme.isDark");
      assert!(condition.has_theme());
    });
  }

  #[test]
  fn test_simple_kinds() {
    assert_eq!(classify_kind("'8px'", true), "literal");
    assert_eq!(classify_kind("12", true), "literal");
    assert_eq!(classify_kind("p => false", true), "empty");
    assert_eq!(classify_kind("p => null", true), "empty");
    assert_eq!(classify_kind("p => undefined", true), "empty");
    assert_eq!(classify_kind("darken(0.2, 'red')", true), "helper-call");
    assert_eq!(classify_kind("spacing.large", true), "helper-call");
    assert_eq!(classify_kind("p => p.width * 2", true), "prop-expression");
    assert_eq!(classify_kind("p => `${p.width}px`", true), "template");
    assert_eq!(classify_kind("css`color: red;`", false), "block");
    assert_eq!(classify_kind("({ color: 'red' })", false), "block");
    assert_eq!(classify_kind("'color: red;'", false), "block");
    assert_eq!(classify_kind("({ color: 'red' })", true), "unclassified");
    assert_eq!(classify_kind("p => p.a ? 'x' : 'y'", true), "conditional");
    assert_eq!(classify_kind("p => window.innerWidth > 4 ? 'x' : 'y'", true), "unclassified");
    assert_eq!(classify_kind("p => q => q.width", true), "unclassified");
  }

  #[test]
  fn test_block_body_with_single_return() {
    assert_eq!(
      classify_kind("props => { return props.theme.colors.bg; }", true),
      "theme-path"
    );
    let expr = parse_expr("props => { const x = 1; return x; }").unwrap();
    assert!(unwrap_slot(&expr, &ParamBinding::None).is_err());
  }

  #[test]
  fn test_non_function_slot_inherits_binding() {
    let expr = parse_expr("props.theme.colors.fg").unwrap();
    let outer = ParamBinding::Single("props".into());
    let (binding, body) = unwrap_slot(&expr, &outer).unwrap();
    assert_eq!(binding, outer);
    assert_eq!(
      Classifier::new(&binding, "theme", true).classify(body).kind(),
      "theme-path"
    );
  }

  #[test]
  fn test_classification_is_idempotent() {
    let sources = [
      "p => p.size === 'a' ? '1px' : p.size === 'b' ? '2px' : '3px'",
      "p => p.theme.isDark ? p.theme.colors.bg : shade(p.theme.colors.bg)",
      "({ active, theme }) => active && theme.colors.accent",
    ];
    for source in sources {
      let expr = parse_expr(source).unwrap();
      let (binding, body) = unwrap_slot(&expr, &ParamBinding::None).unwrap();
      let classifier = Classifier::new(&binding, "theme", true);
      assert_eq!(classifier.classify(body), classifier.classify(body));
    }
  }

  #[test]
  fn test_destructured_rest_binding() {
    let expr = parse_expr("({ size, ...rest }) => rest.theme.space.md").unwrap();
    let (binding, body) = unwrap_slot(&expr, &ParamBinding::None).unwrap();
    assert_eq!(binding.names(), vec!["size".to_string(), "rest".to_string()]);
    assert_eq!(
      Classifier::new(&binding, "theme", true).classify(body),
      Classification::ThemePath(vec!["space".into(), "md".into()])
    );
  }
}
