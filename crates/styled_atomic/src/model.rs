//! The resolved style model handed to the emitter.
//!
//! Emission order: base, dimensions, buckets (insertion order), style
//! functions, extra styles, runtime styles.

use indexmap::IndexMap;
use serde::Serialize;

use crate::condition::ConditionKey;

pub const DEFAULT_KEY: &str = "default";

/// camelCase CSS property to value, in declaration order.
pub type PropMap = IndexMap<String, StyleValue>;

/// Source text of an expression the adapter resolved to, e.g. `vars.colorPrimary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StaticExpr(pub String);

/// A style-function body expression over the function's parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicExpr {
  pub source: String,
  pub params: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum TemplatePart {
  Text(String),
  Static(StaticExpr),
  Dynamic(DynamicExpr),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum StyleValue {
  Literal(String),
  Expr(StaticExpr),
  Dynamic(DynamicExpr),
  Template(Vec<TemplatePart>),
  /// `default` plus pseudo-class and at-rule keys.
  Nested(IndexMap<String, StyleValue>),
  Null,
}

impl StyleValue {
  pub fn lit(value: &str) -> Self {
    StyleValue::Literal(value.to_string())
  }

  pub fn expr(source: &str) -> Self {
    StyleValue::Expr(StaticExpr(source.to_string()))
  }

  pub fn nested<I: IntoIterator<Item = (&'static str, StyleValue)>>(entries: I) -> Self {
    StyleValue::Nested(
      entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect(),
    )
  }

  /// Surround a resolved value with the static text around its slot.
  pub fn wrap(self, prefix: &str, suffix: &str) -> StyleValue {
    if prefix.is_empty() && suffix.is_empty() {
      return self;
    }
    match self {
      StyleValue::Literal(value) => StyleValue::Literal(format!("{}{}{}", prefix, value, suffix)),
      StyleValue::Expr(expr) => template_around(prefix, TemplatePart::Static(expr), suffix),
      StyleValue::Dynamic(expr) => template_around(prefix, TemplatePart::Dynamic(expr), suffix),
      StyleValue::Template(mut parts) => {
        if !prefix.is_empty() {
          match parts.first_mut() {
            Some(TemplatePart::Text(text)) => text.insert_str(0, prefix),
            _ => parts.insert(0, TemplatePart::Text(prefix.to_string())),
          }
        }
        if !suffix.is_empty() {
          match parts.last_mut() {
            Some(TemplatePart::Text(text)) => text.push_str(suffix),
            _ => parts.push(TemplatePart::Text(suffix.to_string())),
          }
        }
        StyleValue::Template(parts)
      }
      other => other,
    }
  }

  /// The unconditional value: the `default` key of a nested map, or the value itself.
  pub fn default_value(&self) -> Option<&StyleValue> {
    match self {
      StyleValue::Nested(map) => map.get(DEFAULT_KEY),
      other => Some(other),
    }
  }

  pub fn has_nested_keys(&self) -> bool {
    match self {
      StyleValue::Nested(map) => map.keys().any(|key| key != DEFAULT_KEY),
      _ => false,
    }
  }

  /// Nested entries other than `default`.
  pub fn nested_entries(&self) -> Vec<(String, StyleValue)> {
    match self {
      StyleValue::Nested(map) => map
        .iter()
        .filter(|(key, _)| key.as_str() != DEFAULT_KEY)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect(),
      _ => Vec::new(),
    }
  }

  /// This value over `base`: base pseudo and at-rule entries apply unless
  /// this value sets the same key.
  pub fn layered_over(&self, base: &StyleValue) -> StyleValue {
    if !base.has_nested_keys() {
      return self.clone();
    }
    let default = self.default_value().cloned().unwrap_or(StyleValue::Null);
    let mut map = IndexMap::from([(DEFAULT_KEY.to_string(), default)]);
    for (key, value) in base.nested_entries().into_iter().chain(self.nested_entries()) {
      map.insert(key, value);
    }
    StyleValue::Nested(map)
  }

  pub fn is_dynamic(&self) -> bool {
    match self {
      StyleValue::Dynamic(_) => true,
      StyleValue::Template(parts) => parts
        .iter()
        .any(|part| matches!(part, TemplatePart::Dynamic(_))),
      StyleValue::Nested(map) => map.values().any(StyleValue::is_dynamic),
      _ => false,
    }
  }

  pub fn as_literal(&self) -> Option<&str> {
    match self {
      StyleValue::Literal(value) => Some(value),
      _ => None,
    }
  }

  /// Join resolved pieces of one value. Literal pieces are plain text.
  pub fn concat(pieces: Vec<StyleValue>) -> StyleValue {
    fn push_text(parts: &mut Vec<TemplatePart>, text: &str) {
      if text.is_empty() {
        return;
      }
      match parts.last_mut() {
        Some(TemplatePart::Text(existing)) => existing.push_str(text),
        _ => parts.push(TemplatePart::Text(text.to_string())),
      }
    }

    let mut parts: Vec<TemplatePart> = Vec::new();

    for piece in pieces {
      match piece {
        StyleValue::Literal(text) => push_text(&mut parts, &text),
        StyleValue::Expr(expr) => parts.push(TemplatePart::Static(expr)),
        StyleValue::Dynamic(expr) => parts.push(TemplatePart::Dynamic(expr)),
        StyleValue::Template(inner) => {
          for part in inner {
            match part {
              TemplatePart::Text(text) => push_text(&mut parts, &text),
              other => parts.push(other),
            }
          }
        }
        StyleValue::Nested(_) | StyleValue::Null => {}
      }
    }

    match parts.as_slice() {
      [] => StyleValue::Literal(String::new()),
      [TemplatePart::Text(text)] => StyleValue::Literal(text.clone()),
      [TemplatePart::Static(expr)] => StyleValue::Expr(expr.clone()),
      [TemplatePart::Dynamic(expr)] => StyleValue::Dynamic(expr.clone()),
      _ => StyleValue::Template(parts),
    }
  }
}

fn template_around(prefix: &str, part: TemplatePart, suffix: &str) -> StyleValue {
  let mut parts = Vec::with_capacity(3);
  if !prefix.is_empty() {
    parts.push(TemplatePart::Text(prefix.to_string()));
  }
  parts.push(part);
  if !suffix.is_empty() {
    parts.push(TemplatePart::Text(suffix.to_string()));
  }
  StyleValue::Template(parts)
}

/// Set `value` for `prop` under the nested `path` (pseudo and at-rule keys).
///
/// An existing scalar becomes the `default` of a new nested map, keys already
/// present are preserved. `seed_default` fills `default` of a newly created map.
pub fn insert_at_path(
  map: &mut PropMap,
  prop: &str,
  path: &[String],
  value: StyleValue,
  seed_default: StyleValue,
) {
  match map.get_mut(prop) {
    Some(existing) => set_in_value(existing, path, value, StyleValue::Null),
    None => {
      if path.is_empty() {
        map.insert(prop.to_string(), value);
      } else {
        let mut fresh = StyleValue::Nested(IndexMap::from([(DEFAULT_KEY.to_string(), seed_default)]));
        set_in_value(&mut fresh, path, value, StyleValue::Null);
        map.insert(prop.to_string(), fresh);
      }
    }
  }
}

fn set_in_value(target: &mut StyleValue, path: &[String], value: StyleValue, seed: StyleValue) {
  let Some((head, rest)) = path.split_first() else {
    match target {
      StyleValue::Nested(map) => {
        map.insert(DEFAULT_KEY.to_string(), value);
      }
      other => *other = value,
    }
    return;
  };

  if !matches!(target, StyleValue::Nested(_)) {
    let previous = std::mem::replace(target, StyleValue::Null);
    *target = StyleValue::Nested(IndexMap::from([(DEFAULT_KEY.to_string(), previous)]));
  }
  if let StyleValue::Nested(map) = target {
    match map.get_mut(head) {
      Some(child) => set_in_value(child, rest, value, seed),
      None if rest.is_empty() => {
        map.insert(head.clone(), value);
      }
      None => {
        let mut child = StyleValue::Nested(IndexMap::from([(DEFAULT_KEY.to_string(), seed)]));
        set_in_value(&mut child, rest, value, StyleValue::Null);
        map.insert(head.clone(), child);
      }
    }
  }
}

/// Read the value stored for `prop` under `path`, if any.
pub fn get_at_path<'a>(map: &'a PropMap, prop: &str, path: &[String]) -> Option<&'a StyleValue> {
  let mut current = map.get(prop)?;
  for key in path {
    match current {
      StyleValue::Nested(nested) => current = nested.get(key)?,
      _ => return None,
    }
  }
  Some(current)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantDimension {
  pub name: String,
  pub prop: String,
  pub variants: IndexMap<String, PropMap>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleParam {
  pub name: String,
  pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleFunction {
  pub name: String,
  pub condition: Option<ConditionKey>,
  pub params: Vec<StyleParam>,
  pub body: PropMap,
}

/// A value only the runtime can compute, applied as an inline style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeStyle {
  pub property: String,
  pub condition: ConditionKey,
  pub expr: String,
}

/// A helper resolving to a whole style object, passed as an extra style argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraStyle {
  pub condition: ConditionKey,
  pub expr: StaticExpr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OverrideRelation {
  /// `&:hover ${Child}`: the child is styled when the owner matches.
  Descendant,
  /// `${Parent}:hover &`: the owner is styled when the parent matches.
  Ancestor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescendantOverride {
  pub name: String,
  pub target: String,
  pub relation: OverrideRelation,
  pub path: Vec<String>,
  pub props: PropMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WrapperReason {
  VariantBuckets,
  VariantDimensions,
  StyleFunctions,
  ThemeHook,
  ConditionalExtraStyles,
  PropFiltering,
  ClassNameMerge,
  StyleMerge,
  PolymorphicAs,
  Attrs,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WrapperDecision {
  pub reasons: Vec<WrapperReason>,
  /// Props to remove before forwarding to the rendered element.
  pub dropped_props: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleModel {
  pub component: String,
  pub base: PropMap,
  pub buckets: IndexMap<ConditionKey, PropMap>,
  pub dimensions: Vec<VariantDimension>,
  pub style_functions: IndexMap<String, StyleFunction>,
  pub runtime_styles: Vec<RuntimeStyle>,
  pub extra_styles: Vec<ExtraStyle>,
  pub descendant_overrides: Vec<DescendantOverride>,
  pub wrapper: WrapperDecision,
  pub needs_wrapper: bool,
}

impl StyleModel {
  pub fn new(component: &str) -> Self {
    StyleModel {
      component: component.to_string(),
      ..Default::default()
    }
  }

  pub fn is_empty(&self) -> bool {
    self.base.is_empty()
      && self.buckets.is_empty()
      && self.dimensions.is_empty()
      && self.style_functions.is_empty()
      && self.runtime_styles.is_empty()
      && self.extra_styles.is_empty()
      && self.descendant_overrides.is_empty()
  }

  pub fn bucket(&self, key: &ConditionKey) -> Option<&PropMap> {
    self.buckets.get(key)
  }

  pub fn bucket_mut(&mut self, key: &ConditionKey) -> &mut PropMap {
    self.buckets.entry(key.clone()).or_default()
  }

  pub fn dimension(&self, name: &str) -> Option<&VariantDimension> {
    self.dimensions.iter().find(|dim| dim.name == name)
  }
}
