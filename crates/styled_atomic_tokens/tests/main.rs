use std::{fs, sync::Arc};

use indoc::indoc;
use pretty_assertions::assert_eq;
use styled_atomic::{
  adapter::NoBlockParser,
  ir::ElementKind,
  model::{ExtraStyle, StaticExpr},
  testing::{parse_css, slot},
  transform_file, ComponentInput, ConditionKey, EngineConfig, FileInput, ImportSpec, ReasonCode,
  RuleSet, SlotId, SlotMap, StyleValue,
};
use styled_atomic_tokens::{get_or_load_token_table, load_token_table, TokenResolver};

static TOKEN_DATA_PATH: &str = "tests/fixtures/token-data.json5";

fn component(name: &str, css: &str, slots: &[&str]) -> ComponentInput {
  let mut slot_map = SlotMap::new();
  for (index, code) in slots.iter().enumerate() {
    slot_map.insert(SlotId(index as u32), slot(code));
  }
  ComponentInput::new(
    name,
    ElementKind::Intrinsic("div".into()),
    RuleSet::new(parse_css(css).expect("balanced css"), slot_map),
  )
}

#[test]
fn test_tables_are_shared_per_path() {
  let first = get_or_load_token_table(TOKEN_DATA_PATH).expect("Failed to load token table");
  let second = get_or_load_token_table(TOKEN_DATA_PATH).expect("Failed to load token table");
  assert!(Arc::ptr_eq(&first, &second));
  assert_eq!(first.theme["colors.text"], "colorText");
}

#[test]
fn test_load_errors_name_the_file() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("broken.json5");
  fs::write(&path, "{ theme: ").unwrap();

  let err = load_token_table(&path).unwrap_err();
  assert!(err.to_string().contains("broken.json5"), "{}", err);

  let missing = dir.path().join("missing.json5");
  let err = load_token_table(&missing).unwrap_err();
  assert!(err.to_string().starts_with("Failed to read"), "{}", err);
}

#[test]
fn test_loads_table_from_disk() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("tokens.json5");
  fs::write(
    &path,
    indoc! {r#"
      {
        vars: { source: "@design/tokens", export: "tokens" },
        theme: { "colors.bg": "bg" },
      }
    "#},
  )
  .unwrap();

  let resolver = TokenResolver::from_path(&path).unwrap();
  assert_eq!(resolver.table().theme["colors.bg"], "bg");
}

#[test]
fn test_resolves_a_themed_file() {
  let resolver = TokenResolver::from_path(TOKEN_DATA_PATH).unwrap();
  let file = FileInput {
    path: "src/Card.tsx".into(),
    components: vec![
      component(
        "Card",
        indoc! {"
          color: __SLOT_0__;
          padding: __SLOT_1__;
          border-color: __SLOT_2__;
          __SLOT_3__;
          background: __SLOT_4__;
        "},
        &[
          "p => p.theme.colors.text",
          "p => p.theme.space.sm",
          "token('color.border.focused')",
          "focusRing()",
          "p => p.theme.isDark ? 'black' : 'white'",
        ],
      ),
      component("Badge", "color: __SLOT_0__;", &["p => p.theme.colors.danger"]),
    ],
  };

  let output = transform_file(&file, &resolver, &NoBlockParser, &EngineConfig::default()).unwrap();

  let card = output.model("Card").unwrap();
  assert_eq!(card.base["color"], StyleValue::Expr(StaticExpr("vars.colorText".into())));
  assert_eq!(card.base["padding"], StyleValue::lit("4px"));
  assert_eq!(card.base["borderColor"], StyleValue::lit("var(--ds-border-focused)"));
  assert_eq!(card.base["background"], StyleValue::lit("white"));
  assert_eq!(
    card.extra_styles,
    vec![ExtraStyle {
      condition: ConditionKey::always(),
      expr: StaticExpr("mixins.focusRing".into()),
    }]
  );
  assert!(!card.needs_wrapper);

  assert_eq!(output.model("Badge"), None);
  assert_eq!(
    output.imports,
    vec![
      ImportSpec::new("./tokens.stylex", "vars"),
      ImportSpec::new("./mixins.stylex", "mixins"),
    ]
  );
  assert_eq!(output.warnings.len(), 1);
  assert_eq!(output.warnings[0].reason, ReasonCode::UnresolvableThemePath);
  assert_eq!(output.warnings[0].component.as_deref(), Some("Badge"));
}
