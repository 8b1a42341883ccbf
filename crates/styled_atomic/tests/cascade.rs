//! Emitted styles must produce the same computed values as the template for
//! every combination of the conditions involved.

mod support;

use pretty_assertions::assert_eq;
use styled_atomic::{
  model::{PropMap, StyleModel},
  EngineConfig, StyleValue,
};
use support::{component, holds, run, run_with, Props};

/// Apply base, dimensions and buckets in emission order. Later maps replace a
/// property wholesale, as atomic classes do.
fn computed(model: &StyleModel, props: Props<'_>) -> PropMap {
  let mut out = model.base.clone();
  let mut apply = |map: &PropMap| {
    for (property, value) in map {
      out.insert(property.clone(), value.clone());
    }
  };
  for dimension in &model.dimensions {
    let case = props
      .iter()
      .find(|(prop, _)| *prop == dimension.prop)
      .and_then(|(_, value)| *value);
    match case.and_then(|case| dimension.variants.get(case)) {
      Some(variant) => apply(variant),
      None => {
        if let Some(default) = dimension.variants.get("default") {
          apply(default);
        }
      }
    }
  }
  for (key, bucket) in &model.buckets {
    if holds(key, props) {
      apply(bucket);
    }
  }
  out
}

fn hover(default: &str, hover: &str) -> StyleValue {
  StyleValue::nested([("default", StyleValue::lit(default)), (":hover", StyleValue::lit(hover))])
}

const TONE_BUTTON: &str = "color: black; &:hover { color: gray; } __SLOT_0__; __SLOT_1__;";

fn tone_slots() -> [&'static str; 2] {
  [
    r#"p => p.tone === "primary" ? { color: "white", "&:hover": { color: "blue" } } : p.tone === "danger" ? { color: "white", "&:hover": { color: "red" } } : null"#,
    r#"p => p.disabled && { color: "silver", cursor: "not-allowed" }"#,
  ]
}

#[test]
fn test_every_tone_and_disabled_combination() {
  let output = run(vec![component("Button", TONE_BUTTON, &tone_slots())]);
  let model = output.model("Button").unwrap();
  assert!(output.warnings.is_empty());

  let cases: [(Option<&str>, Option<&str>, StyleValue); 6] = [
    (None, None, hover("black", "gray")),
    (None, Some("true"), hover("silver", "gray")),
    (Some("primary"), None, hover("white", "blue")),
    (Some("primary"), Some("true"), hover("silver", "blue")),
    (Some("danger"), None, hover("white", "red")),
    (Some("danger"), Some("true"), hover("silver", "red")),
  ];
  for (tone, disabled, expected) in cases {
    let props = [("tone", tone), ("disabled", disabled)];
    let styles = computed(model, &props);
    assert_eq!(styles["color"], expected, "tone={:?} disabled={:?}", tone, disabled);
    assert_eq!(
      styles.get("cursor").is_some(),
      disabled.is_some(),
      "tone={:?} disabled={:?}",
      tone,
      disabled
    );
  }
}

#[test]
fn test_compound_buckets_follow_the_dimension() {
  let output = run(vec![component("Button", TONE_BUTTON, &tone_slots())]);
  let model = output.model("Button").unwrap();

  assert_eq!(model.dimensions.len(), 1);
  assert_eq!(model.dimensions[0].name, "tone");
  let keys: Vec<String> = model.buckets.keys().map(ToString::to_string).collect();
  assert_eq!(
    keys,
    vec![
      "disabled",
      r#"disabled && tone === "primary""#,
      r#"disabled && tone === "danger""#,
      r#"disabled && tone !== "primary" && tone !== "danger""#,
    ]
  );
}

#[test]
fn test_without_compound_variants_the_dimension_stays_ungrouped() {
  let config = EngineConfig {
    compound_variants: Some(false),
    ..Default::default()
  };
  let output = run_with(&config, vec![component("Button", TONE_BUTTON, &tone_slots())]);
  let model = output.model("Button").unwrap();

  // `disabled` still overrides `color`, so the tone buckets keep their order.
  assert!(model.dimensions.is_empty());
  assert_eq!(model.buckets.len(), 3);
}

#[test]
fn test_widened_bucket_for_every_combination() {
  let output = run(vec![component(
    "Link",
    "color: red; &:hover { color: blue; } @media (max-width: 600px) { color: green; } __SLOT_0__;",
    &["p => p.muted && { color: 'gray' }"],
  )]);
  let model = output.model("Link").unwrap();

  let expected_muted = StyleValue::nested([
    ("default", StyleValue::lit("gray")),
    (":hover", StyleValue::lit("blue")),
    ("@media (max-width:600px)", StyleValue::lit("green")),
  ]);
  assert_eq!(computed(model, &[("muted", Some("true"))])["color"], expected_muted);
  assert_eq!(computed(model, &[("muted", None)])["color"], model.base["color"]);
}

#[test]
fn test_enum_cases_keep_base_hover() {
  let output = run(vec![component(
    "Link",
    "color: red; &:hover { color: blue; } __SLOT_0__;",
    &[r#"p => p.size === "small" ? { color: "green" } : p.size === "large" ? { color: "black" } : null"#],
  )]);
  let model = output.model("Link").unwrap();
  assert_eq!(model.dimensions.len(), 1);

  let cases = [
    (Some("small"), hover("green", "blue")),
    (Some("large"), hover("black", "blue")),
    (None, hover("red", "blue")),
  ];
  for (size, expected) in cases {
    assert_eq!(computed(model, &[("size", size)])["color"], expected, "size={:?}", size);
  }
}

#[test]
fn test_repeated_condition_wins_over_the_one_in_between() {
  let output = run(vec![component(
    "Tab",
    "color: black; __SLOT_0__; __SLOT_1__; __SLOT_2__;",
    &[
      "p => p.active && { color: 'red' }",
      "p => p.selected && { color: 'blue' }",
      "p => p.active && { color: 'green' }",
    ],
  )]);
  let model = output.model("Tab").unwrap();
  assert!(output.warnings.is_empty());

  let cases = [
    (None, None, "black"),
    (None, Some("true"), "blue"),
    (Some("true"), None, "green"),
    (Some("true"), Some("true"), "green"),
  ];
  for (active, selected, expected) in cases {
    let props = [("active", active), ("selected", selected)];
    assert_eq!(
      computed(model, &props)["color"],
      StyleValue::lit(expected),
      "active={:?} selected={:?}",
      active,
      selected
    );
  }
}
