//! Box shorthand expansion.
//!
//! Atomic styles merge per property, so `margin` in one map and
//! `marginBottom` in another would apply in stylesheet order rather than
//! source order. When that mix exists the shorthand is expanded into the
//! longhand family already in use.

use std::iter;

use crate::config::EngineConfig;
use crate::model::{PropMap, StyleModel, StyleValue};
use crate::utils::split_value_tokens;

pub const FAMILIES: &[&str] = &["margin", "padding", "scrollMargin", "scrollPadding", "inset"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LonghandForm {
  /// `marginTop`, `marginRight`, `marginBottom`, `marginLeft`
  Physical,
  /// `marginBlockStart`, `marginInlineEnd`, `marginBlockEnd`, `marginInlineStart`
  Logical,
  /// `marginBlock`, `marginInline`
  LogicalAxis,
}

const FORMS: [LonghandForm; 3] = [LonghandForm::Physical, LonghandForm::Logical, LonghandForm::LogicalAxis];

/// Longhand property names of `family` in `form`, in box order.
pub fn longhands(family: &str, form: LonghandForm) -> Vec<String> {
  let suffixes: &[&str] = match form {
    LonghandForm::Physical => &["Top", "Right", "Bottom", "Left"],
    LonghandForm::Logical => &["BlockStart", "InlineEnd", "BlockEnd", "InlineStart"],
    LonghandForm::LogicalAxis => &["Block", "Inline"],
  };
  suffixes
    .iter()
    .map(|suffix| {
      if family == "inset" && form == LonghandForm::Physical {
        suffix.to_ascii_lowercase()
      } else {
        format!("{}{}", family, suffix)
      }
    })
    .collect()
}

/// Resolved top/right/bottom/left of a box shorthand (horizontal writing mode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxValues {
  pub top: String,
  pub right: String,
  pub bottom: String,
  pub left: String,
}

impl BoxValues {
  /// The 1 to 4 value shorthand forms.
  pub fn from_tokens(tokens: &[String]) -> Option<BoxValues> {
    let (top, right, bottom, left) = match tokens {
      [all] => (all, all, all, all),
      [vertical, horizontal] => (vertical, horizontal, vertical, horizontal),
      [top, horizontal, bottom] => (top, horizontal, bottom, horizontal),
      [top, right, bottom, left] => (top, right, bottom, left),
      _ => return None,
    };
    Some(BoxValues {
      top: top.clone(),
      right: right.clone(),
      bottom: bottom.clone(),
      left: left.clone(),
    })
  }

  pub fn parse(value: &str) -> Option<BoxValues> {
    BoxValues::from_tokens(&split_value_tokens(value))
  }

  /// Shortest shorthand text for these values.
  pub fn to_shorthand(&self) -> String {
    if self.left == self.right {
      if self.top == self.bottom {
        if self.top == self.right {
          return self.top.clone();
        }
        return format!("{} {}", self.top, self.right);
      }
      return format!("{} {} {}", self.top, self.right, self.bottom);
    }
    format!("{} {} {} {}", self.top, self.right, self.bottom, self.left)
  }

  fn axis(start: &str, end: &str) -> String {
    if start == end {
      start.to_string()
    } else {
      format!("{} {}", start, end)
    }
  }

  /// Values for each of `longhands(family, form)`.
  pub fn values(&self, form: LonghandForm) -> Vec<String> {
    match form {
      LonghandForm::Physical | LonghandForm::Logical => vec![
        self.top.clone(),
        self.right.clone(),
        self.bottom.clone(),
        self.left.clone(),
      ],
      LonghandForm::LogicalAxis => vec![
        BoxValues::axis(&self.top, &self.bottom),
        BoxValues::axis(&self.left, &self.right),
      ],
    }
  }

  /// Recombine the longhands of `family` found in `map`.
  pub fn collapse(map: &PropMap, family: &str) -> Option<BoxValues> {
    for form in FORMS {
      let values: Option<Vec<String>> = longhands(family, form)
        .iter()
        .map(|name| map.get(name).and_then(StyleValue::as_literal).map(str::to_string))
        .collect();
      let Some(values) = values else {
        continue;
      };
      return match form {
        LonghandForm::Physical | LonghandForm::Logical => BoxValues::from_tokens(&values),
        LonghandForm::LogicalAxis => {
          let block = split_value_tokens(&values[0]);
          let inline = split_value_tokens(&values[1]);
          let (top, bottom) = match block.as_slice() {
            [both] => (both.clone(), both.clone()),
            [start, end] => (start.clone(), end.clone()),
            _ => return None,
          };
          let (left, right) = match inline.as_slice() {
            [both] => (both.clone(), both.clone()),
            [start, end] => (start.clone(), end.clone()),
            _ => return None,
          };
          Some(BoxValues {
            top,
            right,
            bottom,
            left,
          })
        }
      };
    }
    None
  }
}

fn form_in(map: &PropMap, family: &str) -> Option<LonghandForm> {
  FORMS.into_iter().find(|form| {
    longhands(family, *form)
      .iter()
      .any(|name| map.contains_key(name))
  })
}

fn maps(model: &StyleModel) -> Vec<&PropMap> {
  iter::once(&model.base)
    .chain(model.buckets.values())
    .chain(model.dimensions.iter().flat_map(|dimension| dimension.variants.values()))
    .collect()
}

fn maps_mut(model: &mut StyleModel) -> Vec<&mut PropMap> {
  iter::once(&mut model.base)
    .chain(model.buckets.values_mut())
    .chain(
      model
        .dimensions
        .iter_mut()
        .flat_map(|dimension| dimension.variants.values_mut()),
    )
    .collect()
}

/// Replace `family` in `map` by its longhands, at the same position.
fn expand_in(map: &mut PropMap, family: &str, form: LonghandForm) -> bool {
  let Some(values) = map
    .get(family)
    .and_then(StyleValue::as_literal)
    .filter(|value| !value.contains('!'))
    .and_then(BoxValues::parse)
  else {
    return false;
  };
  let expanded: Vec<(String, String)> = longhands(family, form)
    .into_iter()
    .zip(values.values(form))
    .collect();

  let previous = std::mem::take(map);
  for (property, value) in previous {
    if property == family {
      for (longhand, value) in &expanded {
        map.insert(longhand.clone(), StyleValue::Literal(value.clone()));
      }
    } else {
      map.insert(property, value);
    }
  }
  true
}

/// Expand shorthands that share a component with longhands of the same family.
pub fn normalize_shorthands(model: &mut StyleModel, config: &EngineConfig) {
  if !config.expand_shorthands() {
    return;
  }

  for family in FAMILIES {
    let (shorthand_maps, forms): (Vec<bool>, Vec<Option<LonghandForm>>) = maps(model)
      .into_iter()
      .map(|map| (map.contains_key(*family), form_in(map, family)))
      .unzip();
    if !shorthand_maps.contains(&true) {
      continue;
    }

    for (index, map) in maps_mut(model).into_iter().enumerate() {
      if !shorthand_maps[index] {
        continue;
      }
      let other_form = forms
        .iter()
        .enumerate()
        .find_map(|(other, form)| if other == index { None } else { *form });
      if let Some(form) = other_form {
        if expand_in(map, family, form) {
          tracing::debug!(%family, ?form, "Expanded shorthand");
        }
      }
    }
  }
}
