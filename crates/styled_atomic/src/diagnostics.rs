use std::fmt;

use serde::Serialize;

use crate::ir::{SlotId, SourceLocation};

/// Why a component was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReasonCode {
  UnclassifiableExpression,
  MismatchedTernaryChain,
  UnresolvableThemePath,
  UnresolvableCall,
  UnsupportedSelector,
  UnsupportedAtRule,
  UnsupportedBlock,
  ImportantDynamicValue,
  MultipleSlots,
  StylesInValuePosition,
  ConditionOrderConflict,
  CompoundVariantSkipped,
}

impl ReasonCode {
  pub fn as_str(&self) -> &'static str {
    match self {
      ReasonCode::UnclassifiableExpression => "unclassifiable-expression",
      ReasonCode::MismatchedTernaryChain => "mismatched-ternary-chain",
      ReasonCode::UnresolvableThemePath => "unresolvable-theme-path",
      ReasonCode::UnresolvableCall => "unresolvable-call",
      ReasonCode::UnsupportedSelector => "unsupported-selector",
      ReasonCode::UnsupportedAtRule => "unsupported-at-rule",
      ReasonCode::UnsupportedBlock => "unsupported-block",
      ReasonCode::ImportantDynamicValue => "important-dynamic-value",
      ReasonCode::MultipleSlots => "multiple-slots",
      ReasonCode::StylesInValuePosition => "styles-in-value-position",
      ReasonCode::ConditionOrderConflict => "condition-order-conflict",
      ReasonCode::CompoundVariantSkipped => "compound-variant-skipped",
    }
  }
}

impl fmt::Display for ReasonCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Error,
  Warning,
  Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
  pub severity: Severity,
  pub reason: ReasonCode,
  pub message: String,
  pub component: Option<String>,
  pub location: Option<SourceLocation>,
  /// Printed source of the offending expression or selector.
  pub context: Option<String>,
}

impl Warning {
  pub fn info(reason: ReasonCode, message: impl Into<String>) -> Self {
    Warning {
      severity: Severity::Info,
      reason,
      message: message.into(),
      component: None,
      location: None,
      context: None,
    }
  }
}

impl fmt::Display for Warning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[{}] {}", self.reason, self.message)?;
    if let Some(component) = &self.component {
      write!(f, " in {}", component)?;
    }
    if let Some(location) = &self.location {
      write!(f, " at {}", location)?;
    }
    Ok(())
  }
}

/// A declaration the engine cannot represent statically. Aborts the component.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}: {message}")]
pub struct Bail {
  pub reason: ReasonCode,
  pub message: String,
  pub location: Option<SourceLocation>,
  pub context: Option<String>,
}

impl Bail {
  pub fn new(reason: ReasonCode, message: impl Into<String>) -> Self {
    Bail {
      reason,
      message: message.into(),
      location: None,
      context: None,
    }
  }

  pub fn with_context(mut self, context: impl Into<String>) -> Self {
    if self.context.is_none() {
      self.context = Some(context.into());
    }
    self
  }

  /// Attach a location unless a more specific one is already set.
  pub fn at(mut self, location: Option<SourceLocation>) -> Self {
    if self.location.is_none() {
      self.location = location;
    }
    self
  }

  pub fn into_warning(self, component: &str) -> Warning {
    Warning {
      severity: Severity::Warning,
      reason: self.reason,
      message: self.message,
      component: Some(component.to_string()),
      location: self.location,
      context: self.context,
    }
  }
}

/// Malformed input from the template parser.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
  #[error("Slot {0} is referenced by the rule tree but missing from the slot map")]
  MissingSlot(SlotId),
}

/// Failure while resolving one component.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub(crate) enum ResolveError {
  #[error(transparent)]
  Bail(#[from] Bail),
  #[error(transparent)]
  Fatal(#[from] EngineError),
}

impl ResolveError {
  pub(crate) fn map_bail(self, f: impl FnOnce(Bail) -> Bail) -> Self {
    match self {
      ResolveError::Bail(bail) => ResolveError::Bail(f(bail)),
      fatal => fatal,
    }
  }
}

pub(crate) fn bail<T>(reason: ReasonCode, message: impl Into<String>) -> Result<T, ResolveError> {
  Err(ResolveError::Bail(Bail::new(reason, message)))
}
