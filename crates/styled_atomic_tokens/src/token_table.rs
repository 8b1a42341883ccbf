use anyhow::{bail, Context, Result};
use parking_lot::Mutex;
use serde_json::Value;
use serde_json5::from_str;
use std::{
  collections::{HashMap, HashSet},
  fs,
  path::{Path, PathBuf},
  sync::{Arc, LazyLock},
};

/// A named export of a module, e.g. `vars` from `./tokens.stylex`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRef {
  pub source: String,
  pub export: String,
}

/// Everything the resolver knows about a design system.
///
/// ```json5
/// {
///   vars: { source: "./tokens.stylex", export: "vars" },
///   theme: { "colors.primary": "colorPrimary" },
///   values: { "space.sm": "4px", isDark: false },
///   tokenNames: { "color.text": "--ds-text" },
///   light: { "color.text": "#172B4D" },
///   mixins: { source: "./mixins.stylex", export: "mixins", names: ["focusRing"] },
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct TokenTable {
  pub vars: Option<ModuleRef>,
  /// Theme path to a key of the `vars` export.
  pub theme: HashMap<String, String>,
  /// Theme path to a JS literal source (`"4px"`, `4`, `false`).
  pub values: HashMap<String, String>,
  /// `token()` name to CSS custom property.
  pub token_names: HashMap<String, String>,
  /// `token()` name to its light theme value, used as the `var()` fallback.
  pub light_values: HashMap<String, String>,
  pub mixins: Option<ModuleRef>,
  pub mixin_names: HashSet<String>,
}

impl TokenTable {
  pub fn len(&self) -> usize {
    self.theme.len() + self.values.len() + self.token_names.len() + self.mixin_names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

static SHARED_TOKEN_TABLES: LazyLock<Mutex<HashMap<PathBuf, Arc<TokenTable>>>> =
  LazyLock::new(|| Mutex::new(HashMap::new()));

/// Load `path` once per process and share it afterwards.
pub fn get_or_load_token_table<P: AsRef<Path>>(path: P) -> Result<Arc<TokenTable>> {
  let path = path.as_ref().to_path_buf();
  let mut cache = SHARED_TOKEN_TABLES.lock();

  if let Some(cached) = cache.get(&path) {
    return Ok(cached.clone());
  }

  let table = Arc::new(load_token_table(&path)?);
  tracing::debug!(path = %path.display(), entries = table.len(), "Loaded token table");
  cache.insert(path, table.clone());
  Ok(table)
}

/// Clears the shared tables (useful for testing)
pub fn clear_token_cache() {
  SHARED_TOKEN_TABLES.lock().clear();
}

pub fn load_token_table(path: &Path) -> Result<TokenTable> {
  let content =
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
  parse_token_table(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse_token_table(content: &str) -> Result<TokenTable> {
  let data: Value = from_str(content)?;
  if !data.is_object() {
    bail!("Expected an object at the top level");
  }

  let mut table = TokenTable {
    vars: module_ref(&data, "vars")?,
    mixins: module_ref(&data, "mixins")?,
    ..Default::default()
  };

  let load_strings = |map: &mut HashMap<String, String>, key: &str| {
    if let Some(values) = data.get(key).and_then(|v| v.as_object()) {
      for (k, v) in values {
        if let Some(val_str) = v.as_str() {
          map.insert(k.clone(), val_str.to_string());
        }
      }
    }
  };
  load_strings(&mut table.theme, "theme");
  load_strings(&mut table.token_names, "tokenNames");
  load_strings(&mut table.light_values, "light");

  if let Some(values) = data.get("values").and_then(|v| v.as_object()) {
    for (k, v) in values {
      let source = match v {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => v.to_string(),
        other => bail!("Theme value `{}` must be a string, number or boolean, got {}", k, other),
      };
      table.values.insert(k.clone(), source);
    }
  }

  if let Some(names) = data
    .get("mixins")
    .and_then(|m| m.get("names"))
    .and_then(|n| n.as_array())
  {
    table
      .mixin_names
      .extend(names.iter().filter_map(|name| name.as_str()).map(str::to_string));
  }

  if !table.theme.is_empty() && table.vars.is_none() {
    bail!("`theme` entries need a `vars` module to import from");
  }
  if !table.mixin_names.is_empty() && table.mixins.is_none() {
    bail!("`mixins.names` needs `source` and `export`");
  }

  Ok(table)
}

fn module_ref(data: &Value, key: &str) -> Result<Option<ModuleRef>> {
  let Some(entry) = data.get(key) else {
    return Ok(None);
  };
  let field = |name: &str| entry.get(name).and_then(|v| v.as_str());
  match (field("source"), field("export")) {
    (Some(source), Some(export)) => Ok(Some(ModuleRef {
      source: source.to_string(),
      export: export.to_string(),
    })),
    (None, None) if key == "mixins" => Ok(None),
    _ => bail!("`{}` needs both `source` and `export`", key),
  }
}
