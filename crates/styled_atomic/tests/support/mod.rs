#![allow(dead_code)]

use styled_atomic::{
  condition::{CompareOp, ConditionTest, Subject},
  ir::ElementKind,
  testing::{parse_css, slot, StaticResolver, TemplateBlockParser},
  transform_file, CallResolution, ComponentInput, ConditionKey, EngineConfig, FileInput, FileOutput,
  RuleSet, SlotId, SlotMap,
};

pub fn component(name: &str, css: &str, slots: &[&str]) -> ComponentInput {
  let mut slot_map = SlotMap::new();
  for (index, code) in slots.iter().enumerate() {
    slot_map.insert(SlotId(index as u32), slot(code));
  }
  ComponentInput::new(
    name,
    ElementKind::Intrinsic("button".into()),
    RuleSet::new(parse_css(css).expect("balanced css"), slot_map),
  )
}

pub fn resolver() -> StaticResolver {
  StaticResolver::default()
    .with_theme_path("colors.primary", "vars.primary", Some(("./tokens.stylex", "vars")))
    .with_theme_path("colors.text", "vars.text", Some(("./tokens.stylex", "vars")))
    .with_theme_path("space.md", "'8px'", None)
    .with_call(
      "rem",
      CallResolution::Value {
        expr: "'1rem'".into(),
        required_imports: Vec::new(),
        css_text: Some("1rem".into()),
      },
    )
}

pub fn run_with(config: &EngineConfig, components: Vec<ComponentInput>) -> FileOutput {
  let file = FileInput {
    path: "src/components.tsx".into(),
    components,
  };
  transform_file(&file, &resolver(), &TemplateBlockParser, config).expect("well-formed input")
}

pub fn run(components: Vec<ComponentInput>) -> FileOutput {
  run_with(&EngineConfig::default(), components)
}

/// Prop values a render is evaluated with.
pub type Props<'p> = &'p [(&'p str, Option<&'p str>)];

fn prop_value<'p>(props: Props<'p>, name: &str) -> Option<&'p str> {
  props
    .iter()
    .find(|(prop, _)| *prop == name)
    .and_then(|(_, value)| *value)
}

/// Whether `key` holds for `props`. `Some("true")` is a truthy boolean prop.
pub fn holds(key: &ConditionKey, props: Props<'_>) -> bool {
  key.parts().iter().all(|part| {
    let Subject::Prop(name) = &part.subject else {
      return false;
    };
    let value = prop_value(props, name);
    match &part.test {
      ConditionTest::Truthy => value.is_some(),
      ConditionTest::Falsy => value.is_none(),
      ConditionTest::Compare { op, value: case } => {
        let equal = value == Some(case.as_key());
        match op {
          CompareOp::Eq => equal,
          CompareOp::NotEq => !equal,
        }
      }
    }
  })
}
