/// Convert a CSS property name to the camelCase key used by the atomic style API.
///
/// Custom properties are kept verbatim, vendor prefixes follow the React
/// convention (`-webkit-line-clamp` -> `WebkitLineClamp`, `-ms-flex` -> `msFlex`).
pub fn to_camel_case(prop: &str) -> String {
  if prop.starts_with("--") {
    return prop.to_string();
  }

  let (mut out, rest, mut upper_next) = if let Some(rest) = prop.strip_prefix("-ms-") {
    (String::from("ms"), rest, true)
  } else if let Some(rest) = prop.strip_prefix('-') {
    (String::new(), rest, true)
  } else {
    (String::new(), prop, false)
  };

  for ch in rest.chars() {
    if ch == '-' {
      upper_next = true;
      continue;
    }
    if upper_next {
      out.extend(ch.to_uppercase());
      upper_next = false;
    } else {
      out.push(ch);
    }
  }
  out
}

pub fn to_pascal_case(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for segment in s.split(|c: char| !c.is_alphanumeric()) {
    let mut chars = segment.chars();
    if let Some(first) = chars.next() {
      out.extend(first.to_uppercase());
      out.push_str(chars.as_str());
    }
  }
  out
}

pub fn lower_first(s: &str) -> String {
  let mut chars = s.chars();
  match chars.next() {
    Some(first) => first.to_lowercase().chain(chars).collect(),
    None => String::new(),
  }
}

pub fn trim_float(n: f64) -> String {
  if (n - (n as i64 as f64)).abs() < f64::EPSILON {
    (n as i64).to_string()
  } else {
    n.to_string()
  }
}

/// Split a CSS value on top-level whitespace, keeping function arguments and
/// quoted strings together (`calc(1px + 2px) auto` is two tokens).
pub fn split_value_tokens(value: &str) -> Vec<String> {
  let mut tokens = Vec::new();
  let mut current = String::new();
  let mut depth = 0usize;
  let mut quote: Option<char> = None;

  for ch in value.chars() {
    if let Some(q) = quote {
      current.push(ch);
      if ch == q {
        quote = None;
      }
      continue;
    }
    match ch {
      '"' | '\'' => {
        quote = Some(ch);
        current.push(ch);
      }
      '(' => {
        depth += 1;
        current.push(ch);
      }
      ')' => {
        depth = depth.saturating_sub(1);
        current.push(ch);
      }
      c if c.is_whitespace() && depth == 0 => {
        if !current.is_empty() {
          tokens.push(std::mem::take(&mut current));
        }
      }
      c => current.push(c),
    }
  }
  if !current.is_empty() {
    tokens.push(current);
  }
  tokens
}

/// Canonical at-rule key: single spaces, none inside parentheses or around
/// `:`, and `, ` between queries.
pub fn normalize_at_query(query: &str) -> String {
  let collapsed = query.split_whitespace().collect::<Vec<_>>().join(" ");
  let mut out = String::with_capacity(collapsed.len());
  for ch in collapsed.chars() {
    match ch {
      ' ' if out.ends_with(['(', ':', ' ']) => {}
      ')' | ':' | ',' => {
        if out.ends_with(' ') {
          out.pop();
        }
        out.push(ch);
        if ch == ',' {
          out.push(' ');
        }
      }
      _ => out.push(ch),
    }
  }
  out
}

const LEGACY_PSEUDO_ELEMENTS: &[&str] = &["before", "after", "first-line", "first-letter"];

/// The `&`-prefixed form of a nested selector, with single-colon
/// pseudo-elements written as `::before`.
pub fn normalize_nested_selector(selector: &str) -> String {
  let selector = selector.trim();
  let mut out = String::with_capacity(selector.len() + 2);
  if !selector.starts_with('&') {
    out.push('&');
  }
  let mut rest = selector;
  while let Some(index) = rest.find(':') {
    let (head, tail) = rest.split_at(index);
    out.push_str(head);
    let name = tail.trim_start_matches(':');
    let word = name
      .split(|ch: char| !(ch.is_alphanumeric() || ch == '-'))
      .next()
      .unwrap_or_default();
    if tail.starts_with("::") || LEGACY_PSEUDO_ELEMENTS.contains(&word) {
      out.push_str("::");
    } else {
      out.push(':');
    }
    rest = name;
  }
  out.push_str(rest);
  out
}
