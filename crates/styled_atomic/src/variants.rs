//! Groups `prop === case` buckets into variant dimensions.

use indexmap::{IndexMap, IndexSet};

use crate::condition::{CaseValue, ConditionInfo, ConditionKey, ConditionTest, CompareOp};
use crate::config::EngineConfig;
use crate::ir::PropType;
use crate::model::{PropMap, StyleModel, VariantDimension, DEFAULT_KEY};
use crate::utils::{lower_first, to_pascal_case};

struct Candidate {
  prop: String,
  cases: Vec<(CaseValue, ConditionKey)>,
}

fn candidates(model: &StyleModel) -> Vec<Candidate> {
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
    .into_iter()
    .map(|(prop, cases)| Candidate { prop, cases })
    .collect()
}

/// The bucket a chain default lands in: `prop !== a && prop !== b ...` over
/// exactly the grouped cases.
fn complement_key(model: &StyleModel, prop: &str, cases: &[(CaseValue, ConditionKey)]) -> Option<ConditionKey> {
  model
    .buckets
    .keys()
    .find(|key| {
      key.parts().len() == cases.len()
        && key.parts().iter().all(|part| {
          part.prop() == Some(prop)
            && matches!(
              &part.test,
              ConditionTest::Compare { op: CompareOp::NotEq, value }
                if cases.iter().any(|(case, _)| case == value)
            )
        })
    })
    .cloned()
}

fn property_set<'m>(maps: impl Iterator<Item = &'m PropMap>) -> IndexSet<String> {
  maps.flat_map(|map| map.keys().cloned()).collect()
}

/// Values `base` holds for `properties`.
fn base_values(model: &StyleModel, properties: &IndexSet<String>) -> PropMap {
  properties
    .iter()
    .filter_map(|property| {
      model
        .base
        .get(property)
        .map(|value| (property.clone(), value.clone()))
    })
    .collect()
}

/// Fill in what a case leaves to `base`. Base pseudo and at-rule entries
/// still apply under a case that only sets the root value.
fn complete(mut map: PropMap, base: &PropMap) -> PropMap {
  for (property, base_value) in base {
    match map.get_mut(property) {
      Some(value) => *value = value.layered_over(base_value),
      None => {
        map.insert(property.clone(), base_value.clone());
      }
    }
  }
  map
}

/// Group the enum buckets of one component into dimensions, in place.
pub fn group_dimensions(model: &mut StyleModel, prop_types: &IndexMap<String, PropType>, config: &EngineConfig) {
  if !config.group_variants() {
    return;
  }

  for candidate in candidates(model) {
    let prop_type = prop_types.get(&candidate.prop);
    let union_pair = config.union_variant_grouping()
      && candidate.cases.len() == 1
      && prop_type.is_some_and(|prop_type| prop_type.literals.len() == 2);
    if candidate.cases.len() < 2 && !union_pair {
      continue;
    }

    let complement = complement_key(model, &candidate.prop, &candidate.cases);
    let grouped_keys: Vec<&ConditionKey> = candidate
      .cases
      .iter()
      .map(|(_, key)| key)
      .chain(complement.as_ref())
      .collect();
    let properties = property_set(
      grouped_keys
        .iter()
        .filter_map(|key| model.buckets.get(*key)),
    );

    // Other simple buckets overriding the same properties must keep their
    // place after the variant in the emitted order.
    let overlapping_bucket = model.buckets.iter().find(|(key, bucket)| {
      !key.is_compound()
        && !grouped_keys.contains(key)
        && bucket.keys().any(|property| properties.contains(property))
    });
    let overlapping_dimension = model.dimensions.iter().find(|dimension| {
      dimension
        .variants
        .values()
        .any(|variant| variant.keys().any(|property| properties.contains(property)))
    });
    if let Some((key, _)) = overlapping_bucket {
      tracing::debug!(prop = %candidate.prop, overlaps = %key, "Keeping variant buckets ungrouped");
      continue;
    }
    if let Some(dimension) = overlapping_dimension {
      tracing::debug!(prop = %candidate.prop, overlaps = %dimension.name, "Keeping variant buckets ungrouped");
      continue;
    }

    let base = base_values(model, &properties);
    let mut variants: IndexMap<String, PropMap> = IndexMap::new();
    for (case, key) in &candidate.cases {
      let bucket = model.buckets.get(key).cloned().unwrap_or_default();
      variants.insert(case.as_key().to_string(), complete(bucket, &base));
    }

    if union_pair {
      if let Some(other) = prop_type
        .and_then(|prop_type| prop_type.literals.iter().find(|literal| !variants.contains_key(literal.as_key())))
      {
        variants.insert(other.as_key().to_string(), base.clone());
      }
    }

    // An optional prop can still be left undefined, which renders the base values.
    let fully_covered = prop_type.is_some_and(|prop_type| {
      prop_type.required
        && prop_type
          .literals
          .iter()
          .all(|literal| variants.contains_key(literal.as_key()))
    });
    let default = match &complement {
      Some(key) => Some(complete(model.buckets.get(key).cloned().unwrap_or_default(), &base)),
      None if fully_covered || base.is_empty() => None,
      None => Some(base.clone()),
    };
    if let Some(default) = default.filter(|default| !default.is_empty()) {
      variants.insert(DEFAULT_KEY.to_string(), default);
    }

    for key in grouped_keys.iter().map(|key| (*key).clone()).collect::<Vec<_>>() {
      model.buckets.shift_remove(&key);
    }
    for property in &properties {
      model.base.shift_remove(property);
    }

    let name = candidate
      .prop
      .strip_prefix(config.transient_prefix())
      .unwrap_or(&candidate.prop)
      .to_string();
    tracing::debug!(%name, cases = variants.len(), "Grouped variant dimension");
    model.dimensions.push(VariantDimension {
      name,
      prop: candidate.prop,
      variants,
    });
  }
}

/// Share identical dimensions across the components of a file and rename
/// conflicting ones to `<component><Dimension>`.
pub fn group_file_dimensions<'m>(models: impl IntoIterator<Item = &'m mut StyleModel>) -> Vec<VariantDimension> {
  let mut shared: Vec<VariantDimension> = Vec::new();
  for model in models {
    let component = model.component.clone();
    for dimension in model.dimensions.iter_mut() {
      let identical = match shared.iter().find(|existing| existing.name == dimension.name) {
        None => None,
        Some(existing) => Some(existing.prop == dimension.prop && existing.variants == dimension.variants),
      };
      match identical {
        None => shared.push(dimension.clone()),
        Some(true) => {
          tracing::trace!(name = %dimension.name, %component, "Sharing identical dimension");
        }
        Some(false) => {
          let renamed = format!("{}{}", lower_first(&component), to_pascal_case(&dimension.name));
          tracing::debug!(from = %dimension.name, to = %renamed, "Renaming conflicting dimension");
          dimension.name = renamed;
          if !shared.contains(&*dimension) {
            shared.push(dimension.clone());
          }
        }
      }
    }
  }
  shared
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::model::StyleValue;

  fn size(case: &str) -> ConditionKey {
    ConditionInfo::eq("size", CaseValue::str(case)).into()
  }

  fn height(value: &str) -> PropMap {
    PropMap::from([("height".to_string(), StyleValue::lit(value))])
  }

  fn sized_model() -> StyleModel {
    let mut model = StyleModel::new("Button");
    model.base = PropMap::from([
      ("height".to_string(), StyleValue::lit("32px")),
      ("color".to_string(), StyleValue::lit("black")),
    ]);
    model.buckets.insert(size("small"), height("24px"));
    model.buckets.insert(size("large"), height("48px"));
    model
  }

  #[test]
  fn test_groups_enum_buckets() {
    let mut model = sized_model();
    group_dimensions(&mut model, &IndexMap::new(), &EngineConfig::default());

    assert!(model.buckets.is_empty());
    assert_eq!(
      model.base,
      PropMap::from([("color".to_string(), StyleValue::lit("black"))])
    );
    let dimension = model.dimension("size").unwrap();
    assert_eq!(
      dimension.variants,
      IndexMap::from([
        ("small".to_string(), height("24px")),
        ("large".to_string(), height("48px")),
        ("default".to_string(), height("32px")),
      ])
    );
  }

  #[test]
  fn test_required_covered_union_has_no_default() {
    let mut model = sized_model();
    let prop_types = IndexMap::from([(
      "size".to_string(),
      PropType::union([CaseValue::str("small"), CaseValue::str("large")]).required(),
    )]);
    group_dimensions(&mut model, &prop_types, &EngineConfig::default());
    let dimension = model.dimension("size").unwrap();
    assert_eq!(dimension.variants.len(), 2);
  }

  #[test]
  fn test_optional_covered_union_keeps_base_default() {
    let mut model = sized_model();
    let prop_types = IndexMap::from([(
      "size".to_string(),
      PropType::union([CaseValue::str("small"), CaseValue::str("large")]),
    )]);
    group_dimensions(&mut model, &prop_types, &EngineConfig::default());
    assert_eq!(
      model.base,
      PropMap::from([("color".to_string(), StyleValue::lit("black"))])
    );
    assert_eq!(
      model.dimension("size").unwrap().variants["default"],
      height("32px")
    );
  }

  #[test]
  fn test_cases_keep_base_pseudo_entries() {
    let hover = |default: &str| {
      StyleValue::nested([("default", StyleValue::lit(default)), (":hover", StyleValue::lit("blue"))])
    };
    let mut model = StyleModel::new("Link");
    model.base = PropMap::from([("color".to_string(), hover("red"))]);
    for (case, color) in [("small", "green"), ("large", "black")] {
      model
        .buckets
        .insert(size(case), PropMap::from([("color".to_string(), StyleValue::lit(color))]));
    }

    group_dimensions(&mut model, &IndexMap::new(), &EngineConfig::default());
    assert!(model.base.is_empty());
    let variants = &model.dimension("size").unwrap().variants;
    assert_eq!(variants["small"]["color"], hover("green"));
    assert_eq!(variants["large"]["color"], hover("black"));
    assert_eq!(variants["default"]["color"], hover("red"));
  }

  #[test]
  fn test_complement_bucket_becomes_default() {
    let mut model = StyleModel::new("Button");
    model.buckets.insert(size("small"), height("24px"));
    model.buckets.insert(size("large"), height("48px"));
    model.buckets.insert(
      ConditionKey::from_parts(vec![
        ConditionInfo::not_eq("size", CaseValue::str("small")),
        ConditionInfo::not_eq("size", CaseValue::str("large")),
      ]),
      height("32px"),
    );
    group_dimensions(&mut model, &IndexMap::new(), &EngineConfig::default());
    assert!(model.buckets.is_empty());
    assert_eq!(
      model.dimension("size").unwrap().variants["default"],
      height("32px")
    );
  }

  #[test]
  fn test_cases_are_completed_with_base_values() {
    let mut model = StyleModel::new("Button");
    model.base = PropMap::from([
      ("height".to_string(), StyleValue::lit("32px")),
      ("padding".to_string(), StyleValue::lit("8px")),
    ]);
    model.buckets.insert(size("small"), height("24px"));
    let mut large = height("48px");
    large.insert("padding".into(), StyleValue::lit("12px"));
    model.buckets.insert(size("large"), large);

    group_dimensions(&mut model, &IndexMap::new(), &EngineConfig::default());
    let variants = &model.dimension("size").unwrap().variants;
    assert_eq!(variants["small"]["padding"], StyleValue::lit("8px"));
    assert_eq!(variants["large"]["padding"], StyleValue::lit("12px"));
  }

  #[test]
  fn test_overlapping_boolean_bucket_blocks_grouping() {
    let mut model = sized_model();
    model
      .buckets
      .insert(ConditionInfo::truthy("compact").into(), height("20px"));
    group_dimensions(&mut model, &IndexMap::new(), &EngineConfig::default());
    assert!(model.dimensions.is_empty());
    assert_eq!(model.buckets.len(), 3);
  }

  #[test]
  fn test_single_bucket_is_not_grouped_without_union() {
    let mut model = StyleModel::new("Button");
    model.buckets.insert(size("small"), height("24px"));
    group_dimensions(&mut model, &IndexMap::new(), &EngineConfig::default());
    assert!(model.dimensions.is_empty());
  }

  #[test]
  fn test_two_member_union_grouping() {
    let mut model = StyleModel::new("Button");
    model.base = height("32px");
    model.buckets.insert(size("small"), height("24px"));
    let prop_types = IndexMap::from([(
      "size".to_string(),
      PropType::union([CaseValue::str("small"), CaseValue::str("regular")]).required(),
    )]);

    group_dimensions(&mut model, &prop_types, &EngineConfig::default());
    assert_eq!(
      model.dimension("size").unwrap().variants,
      IndexMap::from([
        ("small".to_string(), height("24px")),
        ("regular".to_string(), height("32px")),
      ])
    );

    let mut model = StyleModel::new("Button");
    model.buckets.insert(size("small"), height("24px"));
    let config = EngineConfig {
      union_variant_grouping: Some(false),
      ..Default::default()
    };
    group_dimensions(&mut model, &prop_types, &config);
    assert!(model.dimensions.is_empty());
  }

  #[test]
  fn test_transient_prefix_is_dropped_from_name() {
    let mut model = StyleModel::new("Button");
    for case in ["a", "b"] {
      model.buckets.insert(
        ConditionInfo::eq("$variant", CaseValue::str(case)).into(),
        height(case),
      );
    }
    group_dimensions(&mut model, &IndexMap::new(), &EngineConfig::default());
    let dimension = &model.dimensions[0];
    assert_eq!(dimension.name, "variant");
    assert_eq!(dimension.prop, "$variant");
  }

  #[test]
  fn test_file_dimensions_dedupe_and_rename() {
    let dimension = |value: &str| VariantDimension {
      name: "size".into(),
      prop: "size".into(),
      variants: IndexMap::from([("small".to_string(), height(value))]),
    };
    let mut first = StyleModel::new("Button");
    first.dimensions.push(dimension("24px"));
    let mut second = StyleModel::new("Link");
    second.dimensions.push(dimension("24px"));
    let mut third = StyleModel::new("IconButton");
    third.dimensions.push(dimension("16px"));

    let mut models = vec![first, second, third];
    let shared = group_file_dimensions(models.iter_mut());
    let names: Vec<&str> = shared.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["size", "iconButtonSize"]);
    assert_eq!(models[1].dimensions[0].name, "size");
    assert_eq!(models[2].dimensions[0].name, "iconButtonSize");
  }
}
