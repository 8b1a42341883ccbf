use serde::{Deserialize, Serialize};

/// Engine options, read from the `styledAtomic` section of the migration config.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
  /// Member name that marks a themed path.
  ///
  /// Defaults to `theme`.
  pub theme_segment: Option<String>,

  /// Prefix of props that are never forwarded to the DOM.
  ///
  /// Defaults to `$`.
  pub transient_prefix: Option<String>,

  /// Synthesize compound buckets to keep the cascade between boolean and
  /// enum buckets.
  ///
  /// Defaults to true.
  pub compound_variants: Option<bool>,

  /// Largest enum for which compound buckets are synthesized.
  ///
  /// Defaults to 2.
  pub compound_variant_max_cases: Option<usize>,

  /// Defaults to true.
  pub group_variants: Option<bool>,

  /// Group a single enum bucket with the other member of a declared
  /// two-member union.
  ///
  /// Defaults to true.
  pub union_variant_grouping: Option<bool>,

  /// Defaults to true.
  pub expand_shorthands: Option<bool>,

  /// Keep the unresolvable branch of a theme flag conditional as a runtime style.
  ///
  /// Defaults to true.
  pub themed_runtime_fallback: Option<bool>,
}

impl EngineConfig {
  pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(source)
  }

  pub fn theme_segment(&self) -> &str {
    self.theme_segment.as_deref().unwrap_or("theme")
  }

  pub fn transient_prefix(&self) -> &str {
    self.transient_prefix.as_deref().unwrap_or("$")
  }

  pub fn compound_variants(&self) -> bool {
    self.compound_variants.unwrap_or(true)
  }

  pub fn compound_variant_max_cases(&self) -> usize {
    self.compound_variant_max_cases.unwrap_or(2)
  }

  pub fn group_variants(&self) -> bool {
    self.group_variants.unwrap_or(true)
  }

  pub fn union_variant_grouping(&self) -> bool {
    self.union_variant_grouping.unwrap_or(true)
  }

  pub fn expand_shorthands(&self) -> bool {
    self.expand_shorthands.unwrap_or(true)
  }

  pub fn themed_runtime_fallback(&self) -> bool {
    self.themed_runtime_fallback.unwrap_or(true)
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn test_defaults() {
    let config = EngineConfig::default();
    assert_eq!(config.theme_segment(), "theme");
    assert_eq!(config.transient_prefix(), "$");
    assert_eq!(config.compound_variant_max_cases(), 2);
    assert!(config.compound_variants());
    assert!(config.themed_runtime_fallback());
  }

  #[test]
  fn test_from_json() {
    let config = EngineConfig::from_json(
      r#"{ "compoundVariantMaxCases": 3, "expandShorthands": false, "themeSegment": "t" }"#,
    )
    .unwrap();
    assert_eq!(config.compound_variant_max_cases(), 3);
    assert!(!config.expand_shorthands());
    assert_eq!(config.theme_segment(), "t");
    assert!(config.group_variants());
  }

  #[test]
  fn test_rejects_wrong_types() {
    assert!(EngineConfig::from_json(r#"{ "groupVariants": "yes" }"#).is_err());
  }
}
