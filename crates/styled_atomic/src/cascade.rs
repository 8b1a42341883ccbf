//! Keeps nested-rule cascade order for condition buckets once styles are atomic.
//!
//! In the template a `disabled` block overriding `color` only replaces the
//! root value: `&:hover` rules (base or variant) still win on hover. An atomic
//! bucket replaces the whole property, so the pseudo entries it would lose are
//! either copied into it (widening) or, when an enum variant carries its own
//! pseudo entries for the property, split into compound buckets per case.
//! Enum buckets are widened the same way.

use indexmap::IndexMap;

use crate::condition::{CaseValue, ConditionInfo, ConditionKey};
use crate::config::EngineConfig;
use crate::diagnostics::{ReasonCode, Warning};
use crate::model::{StyleModel, StyleValue, DEFAULT_KEY};

type Entries = Vec<(String, StyleValue)>;

/// `prop === case` buckets by prop, as `(case, key)` in bucket order.
fn enum_buckets(model: &StyleModel) -> IndexMap<String, Vec<(CaseValue, ConditionKey)>> {
  let mut by_prop: IndexMap<String, Vec<(CaseValue, ConditionKey)>> = IndexMap::new();
  for key in model.buckets.keys() {
    if let Some((prop, case)) = key.as_single().and_then(ConditionInfo::as_prop_eq) {
      by_prop
        .entry(prop.to_string())
        .or_default()
        .push((case.clone(), key.clone()));
    }
  }
  by_prop
}

/// `default` plus `under` entries, with `over` entries taking precedence.
fn compose(default: StyleValue, under: Entries, over: Entries) -> StyleValue {
  if under.is_empty() && over.is_empty() {
    return default;
  }
  let mut map = IndexMap::from([(DEFAULT_KEY.to_string(), default)]);
  for (key, value) in under.into_iter().chain(over) {
    map.insert(key, value);
  }
  StyleValue::Nested(map)
}

fn bucket_value(model: &StyleModel, key: &ConditionKey, property: &str) -> Option<StyleValue> {
  model.buckets.get(key)?.get(property).cloned()
}

pub(crate) fn preserve_cascade(model: &mut StyleModel, config: &EngineConfig) -> Vec<Warning> {
  let mut warnings = Vec::new();
  let boolean_keys: Vec<ConditionKey> = model
    .buckets
    .keys()
    .filter(|key| key.as_single().is_some_and(ConditionInfo::is_boolean))
    .cloned()
    .collect();

  for key in boolean_keys {
    let properties: Vec<String> = model
      .buckets
      .get(&key)
      .map(|bucket| bucket.keys().cloned().collect())
      .unwrap_or_default();

    for property in properties {
      let enums = enum_buckets(model);
      let nested_enums: Vec<&String> = enums
        .iter()
        .filter(|(_, cases)| {
          cases.iter().any(|(_, case_key)| {
            model
              .buckets
              .get(case_key)
              .and_then(|bucket| bucket.get(&property))
              .is_some_and(StyleValue::has_nested_keys)
          })
        })
        .map(|(prop, _)| prop)
        .collect();

      match nested_enums.as_slice() {
        [] => widen(model, &key, &property),
        [enum_prop] => {
          if !config.compound_variants() {
            continue;
          }
          let cases = &enums[*enum_prop];
          if cases.len() > config.compound_variant_max_cases() {
            warnings.push(Warning::info(
              ReasonCode::CompoundVariantSkipped,
              format!(
                "`{}` overrides `{}` which {} `{}` variants style with nested keys; compound variants were not synthesized",
                key,
                property,
                cases.len(),
                enum_prop
              ),
            ));
            continue;
          }
          let enum_prop = enum_prop.to_string();
          let cases = cases.clone();
          synthesize(model, &key, &property, &enum_prop, &cases);
        }
        _ => warnings.push(Warning::info(
          ReasonCode::CompoundVariantSkipped,
          format!(
            "`{}` overrides `{}` which several enum props style with nested keys; compound variants were not synthesized",
            key, property
          ),
        )),
      }
    }
  }

  // Enum cases and chain defaults replace the root value only, like the
  // boolean buckets above.
  let enum_keys: Vec<ConditionKey> = model
    .buckets
    .keys()
    .filter(|key| !key.is_always() && key.parts().iter().all(ConditionInfo::is_prop_compare))
    .cloned()
    .collect();
  for key in enum_keys {
    let properties: Vec<String> = model
      .buckets
      .get(&key)
      .map(|bucket| bucket.keys().cloned().collect())
      .unwrap_or_default();
    for property in properties {
      widen(model, &key, &property);
    }
  }
  warnings
}

/// Copy the base pseudo and at-rule entries of `property` into the bucket.
fn widen(model: &mut StyleModel, key: &ConditionKey, property: &str) {
  let Some(base_value) = model.base.get(property) else {
    return;
  };
  let Some(current) = bucket_value(model, key, property) else {
    return;
  };
  let widened = current.layered_over(base_value);
  if widened != current {
    tracing::debug!(%key, %property, "Widening bucket with base nested entries");
    if let Some(bucket) = model.buckets.get_mut(key) {
      bucket.insert(property.to_string(), widened);
    }
  }
}

/// Split `property` out of the boolean bucket into one compound bucket per
/// enum case plus one for every other value of the enum prop.
fn synthesize(
  model: &mut StyleModel,
  key: &ConditionKey,
  property: &str,
  enum_prop: &str,
  cases: &[(CaseValue, ConditionKey)],
) {
  let Some(current) = bucket_value(model, key, property) else {
    return;
  };
  let default = current.default_value().cloned().unwrap_or(StyleValue::Null);
  let own_entries = current.nested_entries();
  let base_entries = model
    .base
    .get(property)
    .map(StyleValue::nested_entries)
    .unwrap_or_default();

  let mut compounds = Vec::with_capacity(cases.len() + 1);
  for (case, case_key) in cases {
    let case_entries = bucket_value(model, case_key, property)
      .map(|value| value.nested_entries())
      .filter(|entries| !entries.is_empty())
      .unwrap_or_else(|| base_entries.clone());
    compounds.push((
      key.and(ConditionInfo::eq(enum_prop, case.clone())),
      compose(default.clone(), case_entries, own_entries.clone()),
    ));
  }
  let rest = cases.iter().fold(key.clone(), |rest, (case, _)| {
    rest.and(ConditionInfo::not_eq(enum_prop, case.clone()))
  });
  compounds.push((rest, compose(default, base_entries, own_entries)));

  for (compound, value) in compounds {
    tracing::debug!(%compound, %property, "Synthesized compound variant");
    model
      .bucket_mut(&compound)
      .insert(property.to_string(), value);
  }

  if let Some(bucket) = model.buckets.get_mut(key) {
    bucket.shift_remove(property);
    if bucket.is_empty() {
      model.buckets.shift_remove(key);
    }
  }
}
