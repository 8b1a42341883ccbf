//! Rule tree handed over by the template parser.
//!
//! Slots are placeholders in selector and value text (`__SLOT_<n>__`) pointing
//! at the original `${...}` expression in the [`SlotMap`].

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use swc_core::ecma::ast::Expr;

use crate::condition::CaseValue;
use crate::diagnostics::EngineError;

const SLOT_PREFIX: &str = "__SLOT_";
const SLOT_SUFFIX: &str = "__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SlotId(pub u32);

impl SlotId {
  pub fn placeholder(&self) -> String {
    format!("{}{}{}", SLOT_PREFIX, self.0, SLOT_SUFFIX)
  }

  /// Parse a whole placeholder string such as `__SLOT_3__`.
  pub fn from_placeholder(text: &str) -> Option<SlotId> {
    text
      .strip_prefix(SLOT_PREFIX)?
      .strip_suffix(SLOT_SUFFIX)?
      .parse::<u32>()
      .ok()
      .map(SlotId)
  }

  /// Find every placeholder inside `text`, in order of appearance.
  pub fn find_all(text: &str) -> Vec<(usize, usize, SlotId)> {
    let mut found = Vec::new();
    let mut offset = 0;
    while let Some(start) = text[offset..].find(SLOT_PREFIX) {
      let start = offset + start;
      let digits_start = start + SLOT_PREFIX.len();
      let digits_len = text[digits_start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .count();
      let end = digits_start + digits_len + SLOT_SUFFIX.len();
      if digits_len > 0 && text[digits_start + digits_len..].starts_with(SLOT_SUFFIX) {
        if let Ok(n) = text[digits_start..digits_start + digits_len].parse::<u32>() {
          found.push((start, end, SlotId(n)));
        }
        offset = end;
      } else {
        offset = digits_start;
      }
    }
    found
  }
}

impl fmt::Display for SlotId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.placeholder())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceLocation {
  pub line: u32,
  pub column: u32,
}

impl SourceLocation {
  pub fn new(line: u32, column: u32) -> Self {
    SourceLocation { line, column }
  }
}

impl fmt::Display for SourceLocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.line, self.column)
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotMap {
  slots: IndexMap<SlotId, Box<Expr>>,
}

impl SlotMap {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, id: SlotId, expr: Box<Expr>) {
    self.slots.insert(id, expr);
  }

  /// Append an expression under the next free id.
  pub fn push(&mut self, expr: Box<Expr>) -> SlotId {
    let id = SlotId(
      self
        .slots
        .keys()
        .map(|id| id.0 + 1)
        .max()
        .unwrap_or_default(),
    );
    self.slots.insert(id, expr);
    id
  }

  pub fn get(&self, id: SlotId) -> Option<&Expr> {
    self.slots.get(&id).map(|expr| &**expr)
  }

  /// A slot referenced by the rule tree must exist in the map.
  pub fn expect_slot(&self, id: SlotId) -> Result<&Expr, EngineError> {
    self.get(id).ok_or(EngineError::MissingSlot(id))
  }

  pub fn len(&self) -> usize {
    self.slots.len()
  }

  pub fn is_empty(&self) -> bool {
    self.slots.is_empty()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValuePart {
  Text(String),
  Slot(SlotId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationValue {
  Static(String),
  Interpolated(Vec<ValuePart>),
}

impl DeclarationValue {
  /// Split raw value text containing slot placeholders into parts.
  pub fn from_marked(text: &str) -> DeclarationValue {
    let found = SlotId::find_all(text);
    if found.is_empty() {
      return DeclarationValue::Static(text.to_string());
    }

    let mut parts = Vec::new();
    let mut cursor = 0;
    for (start, end, id) in found {
      if start > cursor {
        parts.push(ValuePart::Text(text[cursor..start].to_string()));
      }
      parts.push(ValuePart::Slot(id));
      cursor = end;
    }
    if cursor < text.len() {
      parts.push(ValuePart::Text(text[cursor..].to_string()));
    }
    DeclarationValue::Interpolated(parts)
  }

  pub fn slots(&self) -> Vec<SlotId> {
    match self {
      DeclarationValue::Static(_) => Vec::new(),
      DeclarationValue::Interpolated(parts) => parts
        .iter()
        .filter_map(|part| match part {
          ValuePart::Slot(id) => Some(*id),
          ValuePart::Text(_) => None,
        })
        .collect(),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
  /// `None` when the slot stands where a whole declaration would.
  pub property: Option<String>,
  pub value: DeclarationValue,
  pub important: bool,
  pub loc: Option<SourceLocation>,
}

impl Declaration {
  pub fn literal(property: &str, value: &str) -> Self {
    Declaration {
      property: Some(property.to_string()),
      value: DeclarationValue::Static(value.to_string()),
      important: false,
      loc: None,
    }
  }

  pub fn marked(property: &str, value: &str) -> Self {
    Declaration {
      property: Some(property.to_string()),
      value: DeclarationValue::from_marked(value),
      important: false,
      loc: None,
    }
  }

  pub fn block(slot: SlotId) -> Self {
    Declaration {
      property: None,
      value: DeclarationValue::Interpolated(vec![ValuePart::Slot(slot)]),
      important: false,
      loc: None,
    }
  }

  pub fn important(mut self) -> Self {
    self.important = true;
    self
  }

  pub fn at(mut self, loc: SourceLocation) -> Self {
    self.loc = Some(loc);
    self
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
  pub selector: String,
  pub at_rules: Vec<String>,
  pub declarations: Vec<Declaration>,
  pub loc: Option<SourceLocation>,
}

impl Rule {
  pub fn root(declarations: Vec<Declaration>) -> Self {
    Self::new("&", declarations)
  }

  pub fn new(selector: &str, declarations: Vec<Declaration>) -> Self {
    Rule {
      selector: selector.to_string(),
      at_rules: Vec::new(),
      declarations,
      loc: None,
    }
  }

  pub fn with_at_rule(mut self, at_rule: &str) -> Self {
    self.at_rules.push(at_rule.to_string());
    self
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
  pub rules: Vec<Rule>,
  pub slots: SlotMap,
}

impl RuleSet {
  pub fn new(rules: Vec<Rule>, slots: SlotMap) -> Self {
    RuleSet { rules, slots }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "camelCase")]
pub enum ElementKind {
  Intrinsic(String),
  Component(String),
}

/// Declared union-literal type of a prop, e.g. `"small" | "large"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropType {
  pub literals: Vec<CaseValue>,
  /// Declared without `?`, so the prop is never left undefined.
  pub required: bool,
}

impl PropType {
  /// An optional prop of the given literals.
  pub fn union<I: IntoIterator<Item = CaseValue>>(literals: I) -> Self {
    PropType {
      literals: literals.into_iter().collect(),
      required: false,
    }
  }

  pub fn required(mut self) -> Self {
    self.required = true;
    self
  }
}

/// How the component is used at its call sites in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentUsage {
  pub class_name: bool,
  pub style: bool,
  pub polymorphic_as: bool,
  pub attrs: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentInput {
  pub name: String,
  pub element: ElementKind,
  pub rules: RuleSet,
  pub prop_types: IndexMap<String, PropType>,
  pub usage: ComponentUsage,
}

impl ComponentInput {
  pub fn new(name: &str, element: ElementKind, rules: RuleSet) -> Self {
    ComponentInput {
      name: name.to_string(),
      element,
      rules,
      prop_types: IndexMap::new(),
      usage: ComponentUsage::default(),
    }
  }

  pub fn with_prop_type(mut self, prop: &str, prop_type: PropType) -> Self {
    self.prop_types.insert(prop.to_string(), prop_type);
    self
  }

  pub fn with_usage(mut self, usage: ComponentUsage) -> Self {
    self.usage = usage;
    self
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileInput {
  pub path: String,
  pub components: Vec<ComponentInput>,
}
