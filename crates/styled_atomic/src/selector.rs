//! Selector and at-rule parsing for rules nested in a component template.

use crate::diagnostics::{Bail, ReasonCode};
use crate::ir::SlotId;
use crate::model::OverrideRelation;
use crate::utils::{normalize_at_query, normalize_nested_selector};

const AT_RULES: &[&str] = &["@media", "@container", "@supports"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorKind {
  /// `&`
  Root,
  /// One or more pseudo keys of the root, e.g. `[":hover", ":focus-visible"]`.
  Pseudos(Vec<String>),
  /// A selector that styles across a component reference.
  Override {
    slot: SlotId,
    relation: OverrideRelation,
    pseudo: Option<String>,
  },
}

fn unsupported(selector: &str, message: &str) -> Bail {
  Bail::new(ReasonCode::UnsupportedSelector, message.to_string()).with_context(selector)
}

/// The single pseudo-class or pseudo-element in `rest`, e.g. `:not(.a)`.
fn single_pseudo(rest: &str) -> Option<String> {
  let body = rest
    .strip_prefix("::")
    .or_else(|| rest.strip_prefix(':'))?;
  let name_len = body
    .chars()
    .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
    .count();
  if name_len == 0 {
    return None;
  }
  let after_name = &body[name_len..];
  if after_name.is_empty() {
    return Some(rest.to_string());
  }
  // Functional pseudo: the arguments must close at the very end.
  let args = after_name.strip_prefix('(')?;
  let mut depth = 1usize;
  for (index, ch) in args.char_indices() {
    match ch {
      '(' => depth += 1,
      ')' => {
        depth -= 1;
        if depth == 0 {
          return if index + 1 == args.len() {
            Some(rest.to_string())
          } else {
            None
          };
        }
      }
      _ => {}
    }
  }
  None
}

fn parse_pseudo_part(part: &str, selector: &str) -> Result<String, Bail> {
  let normalized = normalize_nested_selector(part);
  let Some(rest) = normalized.strip_prefix('&') else {
    return Err(unsupported(selector, "Selector does not target the component"));
  };
  if rest.contains('&') || rest.contains('*') {
    return Err(unsupported(selector, "Universal and repeated selectors are not supported"));
  }
  if rest.chars().any(char::is_whitespace) || rest.contains(['>', '+', '~']) {
    return Err(unsupported(selector, "Combinators over elements are not supported"));
  }
  if rest.starts_with('.') || rest.starts_with('[') || rest.starts_with('#') {
    return Err(unsupported(selector, "Class and attribute selectors are not supported"));
  }
  single_pseudo(rest).ok_or_else(|| unsupported(selector, "Chained pseudo selectors are not supported"))
}

fn parse_override(selector: &str) -> Result<SelectorKind, Bail> {
  let parts: Vec<&str> = selector.split_whitespace().collect();
  let [first, second] = parts.as_slice() else {
    return Err(unsupported(selector, "Component selectors must have exactly two parts"));
  };

  let split_slot = |part: &str| -> Option<(SlotId, Option<String>)> {
    let found = SlotId::find_all(part);
    let [(0, end, id)] = found.as_slice() else {
      return None;
    };
    let rest = &part[*end..];
    if rest.is_empty() {
      Some((*id, None))
    } else {
      single_pseudo(rest).map(|pseudo| (*id, Some(pseudo)))
    }
  };

  if first.starts_with('&') {
    let pseudo = match &first[1..] {
      "" => None,
      rest => Some(
        single_pseudo(rest).ok_or_else(|| unsupported(selector, "Chained pseudo selectors are not supported"))?,
      ),
    };
    let (slot, target_pseudo) = split_slot(second)
      .ok_or_else(|| unsupported(selector, "Descendant selectors must reference a component"))?;
    if target_pseudo.is_some() {
      return Err(unsupported(selector, "Pseudo selectors on the referenced component are not supported"));
    }
    return Ok(SelectorKind::Override {
      slot,
      relation: OverrideRelation::Descendant,
      pseudo,
    });
  }

  if *second == "&" {
    let (slot, pseudo) = split_slot(first)
      .ok_or_else(|| unsupported(selector, "Ancestor selectors must reference a component"))?;
    return Ok(SelectorKind::Override {
      slot,
      relation: OverrideRelation::Ancestor,
      pseudo,
    });
  }

  Err(unsupported(selector, "Unsupported component selector"))
}

pub fn parse_selector(selector: &str) -> Result<SelectorKind, Bail> {
  let selector = selector.trim();
  if selector == "&" {
    return Ok(SelectorKind::Root);
  }
  if !SlotId::find_all(selector).is_empty() {
    return parse_override(selector);
  }

  let mut pseudos = Vec::new();
  for part in selector.split(',') {
    let part = part.trim();
    if part == "&" {
      return Err(unsupported(selector, "Root mixed into a selector list"));
    }
    let pseudo = parse_pseudo_part(part, selector)?;
    if !pseudos.contains(&pseudo) {
      pseudos.push(pseudo);
    }
  }
  Ok(SelectorKind::Pseudos(pseudos))
}

/// Whitespace-normalised `@media`, `@container` or `@supports` query.
pub fn normalize_at_rule(at_rule: &str) -> Result<String, Bail> {
  let at_rule = at_rule.trim();
  let supported = AT_RULES.iter().any(|name| {
    at_rule
      .strip_prefix(name)
      .is_some_and(|rest| rest.starts_with(' ') || rest.starts_with('('))
  });
  if !supported {
    return Err(
      Bail::new(
        ReasonCode::UnsupportedAtRule,
        format!("At-rule `{}` is not supported", at_rule),
      )
      .with_context(at_rule),
    );
  }
  Ok(normalize_at_query(at_rule))
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  fn pseudos(keys: &[&str]) -> SelectorKind {
    SelectorKind::Pseudos(keys.iter().map(|k| k.to_string()).collect())
  }

  #[test]
  fn test_root_and_pseudos() {
    assert_eq!(parse_selector("&").unwrap(), SelectorKind::Root);
    assert_eq!(parse_selector("&:hover").unwrap(), pseudos(&[":hover"]));
    assert_eq!(parse_selector(":hover").unwrap(), pseudos(&[":hover"]));
    assert_eq!(parse_selector("&:before").unwrap(), pseudos(&["::before"]));
    assert_eq!(parse_selector("&::placeholder").unwrap(), pseudos(&["::placeholder"]));
    assert_eq!(
      parse_selector("&:not(:disabled)").unwrap(),
      pseudos(&[":not(:disabled)"])
    );
    assert_eq!(
      parse_selector("&:hover, &:focus-visible").unwrap(),
      pseudos(&[":hover", ":focus-visible"])
    );
  }

  #[test]
  fn test_unsupported_selectors() {
    for selector in [
      "*",
      "& *",
      "& > span",
      "& + &",
      "&.active",
      "&[disabled]",
      "&:hover:focus",
      "&:hover::before",
      "& span",
    ] {
      let bail = parse_selector(selector).unwrap_err();
      assert_eq!(bail.reason, ReasonCode::UnsupportedSelector, "{}", selector);
    }
  }

  #[test]
  fn test_component_overrides() {
    assert_eq!(
      parse_selector("&:hover __SLOT_0__").unwrap(),
      SelectorKind::Override {
        slot: SlotId(0),
        relation: OverrideRelation::Descendant,
        pseudo: Some(":hover".into()),
      }
    );
    assert_eq!(
      parse_selector("__SLOT_3__:focus-within &").unwrap(),
      SelectorKind::Override {
        slot: SlotId(3),
        relation: OverrideRelation::Ancestor,
        pseudo: Some(":focus-within".into()),
      }
    );
    assert_eq!(
      parse_selector("& __SLOT_1__").unwrap(),
      SelectorKind::Override {
        slot: SlotId(1),
        relation: OverrideRelation::Descendant,
        pseudo: None,
      }
    );
    assert!(parse_selector("& > __SLOT_1__").is_err());
  }

  #[test]
  fn test_at_rules() {
    assert_eq!(
      normalize_at_rule("@media  (max-width : 600px)").unwrap(),
      "@media (max-width:600px)"
    );
    assert_eq!(
      normalize_at_rule("@container sidebar (min-width: 400px)").unwrap(),
      "@container sidebar (min-width:400px)"
    );
    assert!(normalize_at_rule("@supports (display: grid)").is_ok());
    assert_eq!(
      normalize_at_rule("@keyframes spin").unwrap_err().reason,
      ReasonCode::UnsupportedAtRule
    );
    assert!(normalize_at_rule("@mediafoo").is_err());
  }
}
