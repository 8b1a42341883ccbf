//! Merges resolved declarations into the component's style model.
//!
//! Rules are processed in source order. Every declaration is resolved into
//! effects, which are then placed under the rule's nested path (at-rules and
//! pseudo keys) in base, a condition bucket, a style function or one of the
//! runtime lists.

use swc_core::ecma::ast::Expr;

use crate::classify::{strip, ParamBinding};
use crate::condition::ConditionKey;
use crate::diagnostics::{Bail, ReasonCode, ResolveError};
use crate::ir::{ComponentInput, Declaration, DeclarationValue, Rule, RuleSet, SlotMap, SourceLocation, ValuePart};
use crate::model::{
  get_at_path, insert_at_path, DescendantOverride, ExtraStyle, OverrideRelation, PropMap, RuntimeStyle,
  StyleFunction, StyleModel, StyleParam, StyleValue,
};
use crate::resolve::{print_source, resolve_slot, DeclContext, Effect};
use crate::selector::{normalize_at_rule, parse_selector, SelectorKind};
use crate::session::ResolutionSession;
use crate::utils::{lower_first, to_camel_case, to_pascal_case};

/// Where the declarations of a rule land.
#[derive(Debug, Clone, Default)]
struct Scope {
  condition: ConditionKey,
  path: Vec<String>,
  /// Inside a pseudo selector already.
  pseudo: bool,
  binding: ParamBinding,
}

#[derive(Debug)]
struct OverrideTarget {
  name: String,
  target: String,
  relation: OverrideRelation,
  path: Vec<String>,
}

enum Target {
  Own(Vec<Scope>),
  Override(OverrideTarget),
}

fn bail_at<T>(reason: ReasonCode, message: impl Into<String>, location: Option<SourceLocation>) -> Result<T, ResolveError> {
  Err(Bail::new(reason, message).at(location).into())
}

/// Build the style model of one component from its rule tree.
pub(crate) fn finalize_component(
  session: &mut ResolutionSession<'_>,
  input: &ComponentInput,
) -> Result<StyleModel, ResolveError> {
  let mut finalizer = Finalizer {
    session,
    model: StyleModel::new(&input.name),
  };
  finalizer.rule_set(&input.rules, &Scope::default())?;
  Ok(finalizer.model)
}

struct Finalizer<'s, 'a> {
  session: &'s mut ResolutionSession<'a>,
  model: StyleModel,
}

impl Finalizer<'_, '_> {
  fn rule_set(&mut self, rule_set: &RuleSet, scope: &Scope) -> Result<(), ResolveError> {
    for rule in &rule_set.rules {
      let target = self
        .target(rule, &rule_set.slots, scope)
        .map_err(|err| err.map_bail(|bail| bail.at(rule.loc)))?;

      match target {
        Target::Own(scopes) => {
          let Some(first) = scopes.first() else {
            continue;
          };
          for declaration in &rule.declarations {
            let location = declaration.loc.or(rule.loc);
            let effects = self.effects(declaration, &rule_set.slots, first, location)?;
            for scope in &scopes {
              for effect in &effects {
                self.apply(effect.clone(), scope, location)?;
              }
            }
          }
        }
        Target::Override(target) => {
          for declaration in &rule.declarations {
            let location = declaration.loc.or(rule.loc);
            self.override_declaration(declaration, &rule_set.slots, scope, &target, location)?;
          }
        }
      }
    }
    Ok(())
  }

  fn target(&self, rule: &Rule, slots: &SlotMap, scope: &Scope) -> Result<Target, ResolveError> {
    let mut path = scope.path.clone();
    for at_rule in &rule.at_rules {
      path.push(normalize_at_rule(at_rule)?);
    }

    match parse_selector(&rule.selector)? {
      SelectorKind::Root => Ok(Target::Own(vec![Scope {
        path,
        ..scope.clone()
      }])),
      SelectorKind::Pseudos(pseudos) => {
        if scope.pseudo {
          return Err(
            Bail::new(
              ReasonCode::UnsupportedSelector,
              "Pseudo selectors nested inside a pseudo selector are not supported",
            )
            .with_context(rule.selector.clone())
            .into(),
          );
        }
        let scopes = pseudos
          .into_iter()
          .map(|pseudo| {
            let mut path = path.clone();
            path.push(pseudo);
            Scope {
              condition: scope.condition.clone(),
              path,
              pseudo: true,
              binding: scope.binding.clone(),
            }
          })
          .collect();
        Ok(Target::Own(scopes))
      }
      SelectorKind::Override {
        slot,
        relation,
        pseudo,
      } => {
        if !scope.condition.is_always() {
          return Err(
            Bail::new(
              ReasonCode::UnsupportedSelector,
              "Component selectors inside conditional blocks are not supported",
            )
            .with_context(rule.selector.clone())
            .into(),
          );
        }
        let expr = slots.expect_slot(slot)?;
        let target = match strip(expr) {
          Expr::Ident(ident) if self.session.is_component(&ident.sym) => ident.sym.to_string(),
          other => {
            let source = print_source(other).unwrap_or_default();
            return Err(
              Bail::new(
                ReasonCode::UnsupportedSelector,
                format!("Selector references `{}` which is not a component of this file", source),
              )
              .with_context(rule.selector.clone())
              .into(),
            );
          }
        };
        let owner = &self.model.component;
        let name = match relation {
          OverrideRelation::Descendant => format!("{}In{}", lower_first(&target), owner),
          OverrideRelation::Ancestor => format!("{}In{}", lower_first(owner), target),
        };
        path.extend(pseudo);
        Ok(Target::Override(OverrideTarget {
          name,
          target,
          relation,
          path,
        }))
      }
    }
  }

  fn effects(
    &mut self,
    declaration: &Declaration,
    slots: &SlotMap,
    scope: &Scope,
    location: Option<SourceLocation>,
  ) -> Result<Vec<Effect>, ResolveError> {
    let property = declaration.property.as_deref().map(to_camel_case);
    match (&declaration.value, property) {
      (DeclarationValue::Static(text), Some(property)) => {
        let mut value = text.trim().to_string();
        if declaration.important {
          value.push_str(" !important");
        }
        Ok(vec![Effect::Set {
          condition: scope.condition.clone(),
          property,
          value: StyleValue::Literal(value),
        }])
      }
      (DeclarationValue::Static(text), None) => bail_at(
        ReasonCode::UnsupportedBlock,
        format!("`{}` is not a declaration", text.trim()),
        location,
      ),
      (DeclarationValue::Interpolated(parts), None) => self.block_declaration(parts, slots, scope, location),
      (DeclarationValue::Interpolated(parts), Some(property)) => {
        self.value_declaration(parts, property, declaration.important, slots, scope, location)
      }
    }
  }

  /// A slot standing where a whole declaration would, e.g. `${mixin};`.
  fn block_declaration(
    &mut self,
    parts: &[ValuePart],
    slots: &SlotMap,
    scope: &Scope,
    location: Option<SourceLocation>,
  ) -> Result<Vec<Effect>, ResolveError> {
    let mut slot_ids = Vec::new();
    for part in parts {
      match part {
        ValuePart::Slot(id) => slot_ids.push(*id),
        ValuePart::Text(text) if text.trim().is_empty() => {}
        ValuePart::Text(text) => {
          return bail_at(
            ReasonCode::UnsupportedBlock,
            format!("Block interpolation is surrounded by `{}`", text.trim()),
            location,
          );
        }
      }
    }
    let [id] = slot_ids.as_slice() else {
      return bail_at(
        ReasonCode::UnsupportedBlock,
        "Several block interpolations in one statement",
        location,
      );
    };

    let expr = slots.expect_slot(*id)?;
    let ctx = DeclContext {
      location,
      ..Default::default()
    };
    resolve_slot(self.session, expr, &scope.binding, &ctx, &scope.condition)
  }

  fn value_declaration(
    &mut self,
    parts: &[ValuePart],
    property: String,
    important: bool,
    slots: &SlotMap,
    scope: &Scope,
    location: Option<SourceLocation>,
  ) -> Result<Vec<Effect>, ResolveError> {
    let important_suffix = if important { " !important" } else { "" };
    let slot_count = parts
      .iter()
      .filter(|part| matches!(part, ValuePart::Slot(_)))
      .count();

    if slot_count == 1 {
      let mut prefix = String::new();
      let mut suffix = String::new();
      let mut slot = None;
      for part in parts {
        match (part, slot) {
          (ValuePart::Slot(id), _) => slot = Some(*id),
          (ValuePart::Text(text), None) => prefix.push_str(text),
          (ValuePart::Text(text), Some(_)) => suffix.push_str(text),
        }
      }
      let Some(id) = slot else {
        return Ok(Vec::new());
      };
      suffix.push_str(important_suffix);

      let expr = slots.expect_slot(id)?;
      let ctx = DeclContext {
        property: Some(property),
        prefix,
        suffix,
        location,
      };
      let effects = resolve_slot(self.session, expr, &scope.binding, &ctx, &scope.condition)?;
      if important && effects.iter().any(|effect| !matches!(effect, Effect::Set { .. })) {
        let mut bail = Bail::new(
          ReasonCode::ImportantDynamicValue,
          "`!important` cannot be applied to a value computed at runtime",
        )
        .at(location);
        if let Some(source) = print_source(expr) {
          bail = bail.with_context(source);
        }
        return Err(bail.into());
      }
      return Ok(effects);
    }

    // Several slots: each must be a plain value under the rule's condition.
    let bare = DeclContext {
      property: Some(property.clone()),
      location,
      ..Default::default()
    };
    let mut pieces = Vec::with_capacity(parts.len());
    for part in parts {
      let id = match part {
        ValuePart::Text(text) => {
          pieces.push(StyleValue::Literal(text.clone()));
          continue;
        }
        ValuePart::Slot(id) => *id,
      };
      let expr = slots.expect_slot(id)?;
      let effects = resolve_slot(self.session, expr, &scope.binding, &bare, &scope.condition)?;
      match effects.as_slice() {
        [Effect::Set {
          condition, value, ..
        }] if *condition == scope.condition => pieces.push(value.clone()),
        _ => {
          let mut bail = Bail::new(
            ReasonCode::MultipleSlots,
            format!(
              "`{}` combines several interpolations and one of them is not a single static value",
              property
            ),
          )
          .at(location);
          if let Some(source) = print_source(expr) {
            bail = bail.with_context(source);
          }
          return Err(bail.into());
        }
      }
    }

    Ok(vec![Effect::Set {
      condition: scope.condition.clone(),
      property,
      value: StyleValue::concat(pieces).wrap("", important_suffix),
    }])
  }

  fn apply(&mut self, effect: Effect, scope: &Scope, location: Option<SourceLocation>) -> Result<(), ResolveError> {
    match effect {
      Effect::Set {
        condition,
        property,
        value,
      } => self.set(&condition, &property, &scope.path, value, location)?,
      Effect::StyleFunction {
        condition,
        property,
        value,
        params,
      } => self.style_function(&condition, &property, &scope.path, value, params),
      Effect::Runtime {
        condition,
        property,
        expr,
      } => {
        if !scope.path.is_empty() {
          return bail_at(
            ReasonCode::UnclassifiableExpression,
            "Runtime theme styles are only supported on the component root",
            location,
          );
        }
        tracing::trace!(%property, %condition, "Runtime style");
        self.model.runtime_styles.push(RuntimeStyle {
          property,
          condition,
          expr,
        });
      }
      Effect::ExtraStyles { condition, expr } => {
        if !scope.path.is_empty() {
          return bail_at(
            ReasonCode::UnsupportedBlock,
            "Style helpers inside pseudo selectors or at-rules are not supported",
            location,
          );
        }
        self.model.extra_styles.push(ExtraStyle { condition, expr });
      }
      Effect::Block {
        condition,
        rules,
        binding,
      } => {
        let inner = Scope {
          condition,
          path: scope.path.clone(),
          pseudo: scope.pseudo,
          binding,
        };
        self.rule_set(&rules, &inner)?;
      }
    }
    Ok(())
  }

  fn set(
    &mut self,
    condition: &ConditionKey,
    property: &str,
    path: &[String],
    value: StyleValue,
    location: Option<SourceLocation>,
  ) -> Result<(), ResolveError> {
    if condition.is_always() {
      insert_at_path(&mut self.model.base, property, path, value.clone(), StyleValue::Null);
      self.supersede(property, path, &value);
      return Ok(());
    }

    self.reenter_bucket(condition, property, path, location)?;
    let seed = self
      .model
      .base
      .get(property)
      .and_then(StyleValue::default_value)
      .cloned()
      .unwrap_or(StyleValue::Null);
    insert_at_path(self.model.bucket_mut(condition), property, path, value, seed);
    Ok(())
  }

  /// A bucket emits at its first position. When a condition comes back after
  /// a later bucket set `property`, its bucket moves to the end, unless
  /// something else it holds would then win over that later bucket.
  fn reenter_bucket(
    &mut self,
    condition: &ConditionKey,
    property: &str,
    path: &[String],
    location: Option<SourceLocation>,
  ) -> Result<(), ResolveError> {
    let Some(index) = self.model.buckets.get_index_of(condition) else {
      return Ok(());
    };
    let later: Vec<&PropMap> = self.model.buckets.values().skip(index + 1).collect();
    let overridden_later = |name: &str| later.iter().any(|bucket| bucket.contains_key(name));
    if !overridden_later(property) {
      return Ok(());
    }

    let pinned = self.model.buckets[index].iter().find(|(name, current)| {
      overridden_later(name)
        && (name.as_str() != property || !path.is_empty() || current.has_nested_keys())
    });
    if let Some((name, _)) = pinned {
      return bail_at(
        ReasonCode::ConditionOrderConflict,
        format!(
          "`{}` sets `{}` again after a later condition overrode it, but its earlier `{}` must stay before that condition",
          condition, property, name
        ),
        location,
      );
    }

    tracing::debug!(%condition, %property, "Moving re-entered bucket after later overrides");
    if let Some((key, bucket)) = self.model.buckets.shift_remove_index(index) {
      self.model.buckets.insert(key, bucket);
    }
    Ok(())
  }

  /// A later unconditional value overrides what earlier conditional
  /// declarations set for the same property and path.
  fn supersede(&mut self, property: &str, path: &[String], value: &StyleValue) {
    self
      .model
      .buckets
      .values_mut()
      .for_each(|bucket| supersede_in(bucket, property, path, value));
    self.model.buckets.retain(|_, bucket| !bucket.is_empty());

    self
      .model
      .style_functions
      .values_mut()
      .for_each(|function| supersede_in(&mut function.body, property, path, value));
    self
      .model
      .style_functions
      .retain(|_, function| !function.body.is_empty());

    if path.is_empty() {
      self
        .model
        .runtime_styles
        .retain(|runtime| runtime.property != property);
    }
  }

  fn style_function(
    &mut self,
    condition: &ConditionKey,
    property: &str,
    path: &[String],
    value: StyleValue,
    params: Vec<StyleParam>,
  ) {
    let name = if condition.is_always() {
      property.to_string()
    } else {
      format!("{}{}", condition.style_key(), to_pascal_case(property))
    };
    let function = self
      .model
      .style_functions
      .entry(name.clone())
      .or_insert_with(|| StyleFunction {
        name,
        condition: (!condition.is_always()).then(|| condition.clone()),
        params: Vec::new(),
        body: PropMap::new(),
      });
    for param in params {
      if !function.params.iter().any(|existing| existing.name == param.name) {
        function.params.push(param);
      }
    }
    insert_at_path(&mut function.body, property, path, value, StyleValue::Null);
  }

  fn override_declaration(
    &mut self,
    declaration: &Declaration,
    slots: &SlotMap,
    scope: &Scope,
    target: &OverrideTarget,
    location: Option<SourceLocation>,
  ) -> Result<(), ResolveError> {
    let effects = self.effects(declaration, slots, scope, location)?;
    for effect in effects {
      match effect {
        Effect::Set {
          condition,
          property,
          value,
        } if condition.is_always() => {
          let entry = self.override_entry(target);
          insert_at_path(&mut entry.props, &property, &[], value, StyleValue::Null);
        }
        _ => {
          return bail_at(
            ReasonCode::UnsupportedSelector,
            format!(
              "Only static values are supported inside selectors targeting `{}`",
              target.target
            ),
            location,
          );
        }
      }
    }
    Ok(())
  }

  fn override_entry(&mut self, target: &OverrideTarget) -> &mut DescendantOverride {
    let overrides = &mut self.model.descendant_overrides;
    let index = match overrides
      .iter()
      .position(|existing| existing.name == target.name && existing.path == target.path)
    {
      Some(index) => index,
      None => {
        tracing::debug!(name = %target.name, "Descendant override");
        overrides.push(DescendantOverride {
          name: target.name.clone(),
          target: target.target.clone(),
          relation: target.relation,
          path: target.path.clone(),
          props: PropMap::new(),
        });
        overrides.len() - 1
      }
    };
    &mut overrides[index]
  }
}

fn supersede_in(map: &mut PropMap, property: &str, path: &[String], value: &StyleValue) {
  if get_at_path(map, property, path).is_none() {
    return;
  }
  let scalar = path.is_empty()
    && map
      .get(property)
      .is_some_and(|existing| !existing.has_nested_keys());
  if scalar {
    map.shift_remove(property);
  } else {
    insert_at_path(map, property, path, value.clone(), StyleValue::Null);
  }
}
