//! Normalised branching tests and the canonical bucket keys built from them.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::utils::{lower_first, to_pascal_case};

/// Literal a prop is compared against. Numbers keep their source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CaseValue {
  Str(String),
  Num(String),
}

impl CaseValue {
  pub fn str(value: &str) -> Self {
    CaseValue::Str(value.to_string())
  }

  /// The case name used as a variant key.
  pub fn as_key(&self) -> &str {
    match self {
      CaseValue::Str(s) | CaseValue::Num(s) => s,
    }
  }
}

impl fmt::Display for CaseValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CaseValue::Str(s) => write!(f, "{:?}", s),
      CaseValue::Num(n) => write!(f, "{}", n),
    }
  }
}

impl Serialize for CaseValue {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.as_key())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
  Eq,
  NotEq,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
  /// A component prop, by its source name (transient `$` prefix included).
  Prop(String),
  /// A path below the theme object, e.g. `["isDark"]`.
  Theme(Vec<String>),
}

impl Subject {
  fn display_name(&self) -> String {
    match self {
      Subject::Prop(name) => name.clone(),
      Subject::Theme(path) => format!("theme.{}", path.join(".")),
    }
  }

  fn key_name(&self) -> String {
    match self {
      Subject::Prop(name) => lower_first(&to_pascal_case(name)),
      Subject::Theme(path) => format!("theme{}", to_pascal_case(&path.join("."))),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConditionTest {
  Truthy,
  Falsy,
  Compare { op: CompareOp, value: CaseValue },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConditionInfo {
  pub subject: Subject,
  pub test: ConditionTest,
}

impl ConditionInfo {
  pub fn truthy(prop: &str) -> Self {
    ConditionInfo {
      subject: Subject::Prop(prop.to_string()),
      test: ConditionTest::Truthy,
    }
  }

  pub fn falsy(prop: &str) -> Self {
    ConditionInfo {
      subject: Subject::Prop(prop.to_string()),
      test: ConditionTest::Falsy,
    }
  }

  pub fn eq(prop: &str, value: CaseValue) -> Self {
    ConditionInfo {
      subject: Subject::Prop(prop.to_string()),
      test: ConditionTest::Compare {
        op: CompareOp::Eq,
        value,
      },
    }
  }

  pub fn not_eq(prop: &str, value: CaseValue) -> Self {
    ConditionInfo {
      subject: Subject::Prop(prop.to_string()),
      test: ConditionTest::Compare {
        op: CompareOp::NotEq,
        value,
      },
    }
  }

  pub fn theme_flag(path: &[String]) -> Self {
    ConditionInfo {
      subject: Subject::Theme(path.to_vec()),
      test: ConditionTest::Truthy,
    }
  }

  pub fn negated(&self) -> Self {
    let test = match &self.test {
      ConditionTest::Truthy => ConditionTest::Falsy,
      ConditionTest::Falsy => ConditionTest::Truthy,
      ConditionTest::Compare { op, value } => ConditionTest::Compare {
        op: match op {
          CompareOp::Eq => CompareOp::NotEq,
          CompareOp::NotEq => CompareOp::Eq,
        },
        value: value.clone(),
      },
    };
    ConditionInfo {
      subject: self.subject.clone(),
      test,
    }
  }

  /// Same subject and same operator family.
  pub fn is_compatible_with(&self, other: &ConditionInfo) -> bool {
    if self.subject != other.subject {
      return false;
    }
    match (&self.test, &other.test) {
      (
        ConditionTest::Truthy | ConditionTest::Falsy,
        ConditionTest::Truthy | ConditionTest::Falsy,
      ) => true,
      (ConditionTest::Compare { op: a, .. }, ConditionTest::Compare { op: b, .. }) => a == b,
      _ => false,
    }
  }

  pub fn prop(&self) -> Option<&str> {
    match &self.subject {
      Subject::Prop(name) => Some(name),
      Subject::Theme(_) => None,
    }
  }

  pub fn is_boolean(&self) -> bool {
    matches!(self.test, ConditionTest::Truthy | ConditionTest::Falsy)
  }

  /// A `===` or `!==` test on a prop.
  pub fn is_prop_compare(&self) -> bool {
    matches!(
      (&self.subject, &self.test),
      (Subject::Prop(_), ConditionTest::Compare { .. })
    )
  }

  /// `(prop, case)` when this is a `prop === case` test.
  pub fn as_prop_eq(&self) -> Option<(&str, &CaseValue)> {
    match (&self.subject, &self.test) {
      (
        Subject::Prop(prop),
        ConditionTest::Compare {
          op: CompareOp::Eq,
          value,
        },
      ) => Some((prop, value)),
      _ => None,
    }
  }

  /// Identifier-safe name, e.g. `sizeSmall`, `notDisabled`, `themeIsDark`.
  pub fn style_key(&self) -> String {
    let subject = self.subject.key_name();
    match &self.test {
      ConditionTest::Truthy => subject,
      ConditionTest::Falsy => format!("not{}", to_pascal_case(&subject)),
      ConditionTest::Compare { op, value } => {
        let case = to_pascal_case(value.as_key());
        match op {
          CompareOp::Eq => format!("{}{}", subject, case),
          CompareOp::NotEq => format!("{}Not{}", subject, case),
        }
      }
    }
  }
}

impl fmt::Display for ConditionInfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let subject = self.subject.display_name();
    match &self.test {
      ConditionTest::Truthy => write!(f, "{}", subject),
      ConditionTest::Falsy => write!(f, "!{}", subject),
      ConditionTest::Compare { op, value } => {
        let op = match op {
          CompareOp::Eq => "===",
          CompareOp::NotEq => "!==",
        };
        write!(f, "{} {} {}", subject, op, value)
      }
    }
  }
}

impl Serialize for ConditionInfo {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

/// An ordered conjunction of conditions. The empty key is "always".
///
/// The canonical string form is the bucket identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ConditionKey(Vec<ConditionInfo>);

impl ConditionKey {
  pub fn always() -> Self {
    ConditionKey(Vec::new())
  }

  pub fn single(info: ConditionInfo) -> Self {
    ConditionKey(vec![info])
  }

  pub fn from_parts(parts: Vec<ConditionInfo>) -> Self {
    let mut key = ConditionKey::always();
    for part in parts {
      key = key.and(part);
    }
    key
  }

  /// Add a condition, ignoring one that is already part of the conjunction.
  pub fn and(&self, info: ConditionInfo) -> Self {
    let mut parts = self.0.clone();
    if !parts.contains(&info) {
      parts.push(info);
    }
    ConditionKey(parts)
  }

  pub fn and_key(&self, other: &ConditionKey) -> Self {
    other
      .0
      .iter()
      .fold(self.clone(), |key, info| key.and(info.clone()))
  }

  pub fn is_always(&self) -> bool {
    self.0.is_empty()
  }

  pub fn is_compound(&self) -> bool {
    self.0.len() > 1
  }

  pub fn parts(&self) -> &[ConditionInfo] {
    &self.0
  }

  pub fn as_single(&self) -> Option<&ConditionInfo> {
    match self.0.as_slice() {
      [only] => Some(only),
      _ => None,
    }
  }

  /// Props referenced by any part of the conjunction.
  pub fn props(&self) -> impl Iterator<Item = &str> {
    self.0.iter().filter_map(|info| info.prop())
  }

  pub fn has_theme(&self) -> bool {
    self
      .0
      .iter()
      .any(|info| matches!(info.subject, Subject::Theme(_)))
  }

  pub fn style_key(&self) -> String {
    let mut out = String::new();
    for (i, info) in self.0.iter().enumerate() {
      if i == 0 {
        out.push_str(&info.style_key());
      } else {
        out.push_str("And");
        out.push_str(&to_pascal_case(&info.style_key()));
      }
    }
    out
  }
}

impl From<ConditionInfo> for ConditionKey {
  fn from(info: ConditionInfo) -> Self {
    ConditionKey::single(info)
  }
}

impl fmt::Display for ConditionKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, info) in self.0.iter().enumerate() {
      if i > 0 {
        write!(f, " && ")?;
      }
      write!(f, "{}", info)?;
    }
    Ok(())
  }
}

impl Serialize for ConditionKey {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}
