use indexmap::IndexSet;

use crate::condition::ConditionKey;
use crate::config::EngineConfig;
use crate::ir::{ComponentInput, ElementKind};
use crate::model::{StyleModel, WrapperDecision, WrapperReason};
use crate::prop_valid::is_prop_valid;

/// Props the model reads, in order of first use.
fn referenced_props(model: &StyleModel) -> IndexSet<String> {
  let mut props = IndexSet::new();
  for key in model.buckets.keys() {
    props.extend(key.props().map(str::to_string));
  }
  for dimension in &model.dimensions {
    props.insert(dimension.prop.clone());
  }
  for function in model.style_functions.values() {
    if let Some(condition) = &function.condition {
      props.extend(condition.props().map(str::to_string));
    }
    props.extend(function.params.iter().map(|param| param.name.clone()));
  }
  for runtime in &model.runtime_styles {
    props.extend(runtime.condition.props().map(str::to_string));
  }
  for extra in &model.extra_styles {
    props.extend(extra.condition.props().map(str::to_string));
  }
  props
}

/// Whether rendering needs the theme object: runtime styles read it, and
/// theme conditions test it.
fn reads_theme(model: &StyleModel) -> bool {
  !model.runtime_styles.is_empty()
    || model.buckets.keys().any(ConditionKey::has_theme)
    || model
      .style_functions
      .values()
      .filter_map(|function| function.condition.as_ref())
      .any(ConditionKey::has_theme)
    || model.extra_styles.iter().any(|extra| extra.condition.has_theme())
}

/// Decide whether the component has to stay a runtime wrapper and which
/// props it must not forward to the rendered element.
pub fn analyze_wrapper(model: &StyleModel, input: &ComponentInput, config: &EngineConfig) -> WrapperDecision {
  let mut decision = WrapperDecision::default();
  let mut add = |condition: bool, reason: WrapperReason| {
    if condition {
      decision.reasons.push(reason);
    }
  };

  add(!model.buckets.is_empty(), WrapperReason::VariantBuckets);
  add(!model.dimensions.is_empty(), WrapperReason::VariantDimensions);
  add(!model.style_functions.is_empty(), WrapperReason::StyleFunctions);
  add(reads_theme(model), WrapperReason::ThemeHook);
  add(
    model
      .extra_styles
      .iter()
      .any(|extra| !extra.condition.is_always()),
    WrapperReason::ConditionalExtraStyles,
  );

  let transient_prefix = config.transient_prefix();
  let intrinsic = matches!(input.element, ElementKind::Intrinsic(_));
  let mut filtered = false;
  let mut dropped = Vec::new();
  for prop in referenced_props(model) {
    if !transient_prefix.is_empty() && prop.starts_with(transient_prefix) {
      dropped.push(prop);
    } else if intrinsic && !is_prop_valid(&prop) {
      filtered = true;
      dropped.push(prop);
    }
  }
  add(filtered, WrapperReason::PropFiltering);

  add(input.usage.class_name, WrapperReason::ClassNameMerge);
  add(input.usage.style, WrapperReason::StyleMerge);
  add(input.usage.polymorphic_as, WrapperReason::PolymorphicAs);
  add(input.usage.attrs, WrapperReason::Attrs);

  decision.dropped_props = dropped;
  decision
}
