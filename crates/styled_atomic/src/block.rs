//! Object-literal style blocks (`{ color: "red", "&:hover": { ... } }`) as rules.

use swc_core::ecma::ast::{Expr, Lit, ObjectLit, Prop, PropName, PropOrSpread, UnaryExpr, UnaryOp};

use crate::classify::{literal_text, strip};
use crate::diagnostics::{Bail, ReasonCode};
use crate::ir::{Declaration, Rule, RuleSet, SlotMap};
use crate::utils::to_camel_case;

const UNITLESS: &[&str] = &[
  "animationIterationCount",
  "aspectRatio",
  "columnCount",
  "flex",
  "flexGrow",
  "flexShrink",
  "fontWeight",
  "gridColumn",
  "gridRow",
  "lineClamp",
  "lineHeight",
  "opacity",
  "order",
  "orphans",
  "widows",
  "zIndex",
  "zoom",
];

fn numeric_value(property: &str, expr: &Expr) -> Option<String> {
  let text = match strip(expr) {
    Expr::Lit(Lit::Num(_)) => literal_text(expr)?,
    Expr::Unary(UnaryExpr {
      op: UnaryOp::Minus,
      arg,
      ..
    }) if matches!(strip(arg), Expr::Lit(Lit::Num(_))) => match literal_text(arg)?.as_str() {
      "0" => "0".to_string(),
      magnitude => format!("-{}", magnitude),
    },
    _ => return None,
  };
  if text == "0" || UNITLESS.contains(&to_camel_case(property).as_str()) || property.starts_with("--") {
    Some(text)
  } else {
    Some(format!("{}px", text))
  }
}

fn key_text(key: &PropName) -> Result<String, Bail> {
  match key {
    PropName::Ident(ident) => Ok(ident.sym.to_string()),
    PropName::Str(s) => Ok(s.value.to_string()),
    PropName::Num(n) => Ok(n.value.to_string()),
    _ => Err(Bail::new(
      ReasonCode::UnsupportedBlock,
      "Computed keys in style objects are not supported",
    )),
  }
}

fn nested_selector(parent: &str, key: &str) -> String {
  if key.contains('&') {
    key.replace('&', parent)
  } else {
    format!("{}{}", parent, key)
  }
}

/// Convert a style object into rules. Non-literal values become slots.
pub(crate) fn object_to_rules(object: &ObjectLit) -> Result<RuleSet, Bail> {
  let mut rule_set = RuleSet::default();
  collect_rules(object, "&", &[], &mut rule_set.rules, &mut rule_set.slots)?;
  Ok(rule_set)
}

fn collect_rules(
  object: &ObjectLit,
  selector: &str,
  at_rules: &[String],
  rules: &mut Vec<Rule>,
  slots: &mut SlotMap,
) -> Result<(), Bail> {
  let mut declarations = Vec::new();
  let mut nested: Vec<(String, Vec<String>, &ObjectLit)> = Vec::new();

  for prop in &object.props {
    match prop {
      PropOrSpread::Spread(spread) => {
        let id = slots.push(spread.expr.clone());
        declarations.push(Declaration::block(id));
      }
      PropOrSpread::Prop(prop) => match &**prop {
        Prop::KeyValue(key_value) => {
          let key = key_text(&key_value.key)?;
          let value = strip(&key_value.value);
          if key.starts_with('&') || key.starts_with(':') || key.starts_with('@') {
            let Expr::Object(inner) = value else {
              return Err(Bail::new(
                ReasonCode::UnsupportedBlock,
                format!("Nested key `{}` must hold a style object", key),
              ));
            };
            if key.starts_with('@') {
              let mut inner_at_rules = at_rules.to_vec();
              inner_at_rules.push(key);
              nested.push((selector.to_string(), inner_at_rules, inner));
            } else {
              nested.push((nested_selector(selector, &key), at_rules.to_vec(), inner));
            }
          } else if let Some(text) = numeric_value(&key, value) {
            declarations.push(Declaration::literal(&key, &text));
          } else if let Expr::Lit(Lit::Str(s)) = value {
            declarations.push(Declaration::literal(&key, &s.value));
          } else {
            let id = slots.push(key_value.value.clone());
            declarations.push(Declaration::marked(&key, &id.placeholder()));
          }
        }
        Prop::Shorthand(ident) => {
          let id = slots.push(Box::new(Expr::Ident(ident.clone())));
          declarations.push(Declaration::marked(&ident.sym, &id.placeholder()));
        }
        _ => {
          return Err(Bail::new(
            ReasonCode::UnsupportedBlock,
            "Methods and accessors in style objects are not supported",
          ))
        }
      },
    }
  }

  rules.push(Rule {
    selector: selector.to_string(),
    at_rules: at_rules.to_vec(),
    declarations,
    loc: None,
  });
  for (inner_selector, inner_at_rules, inner) in nested {
    collect_rules(inner, &inner_selector, &inner_at_rules, rules, slots)?;
  }
  Ok(())
}
