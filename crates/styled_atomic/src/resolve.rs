//! Resolution of one classified slot into effects on the style model.

use styled_atomic_swc_runner::print_expr;
use swc_core::common::DUMMY_SP;
use swc_core::ecma::ast::{Expr, Ident, MemberProp};
use swc_core::ecma::visit::{VisitMut, VisitMutWith};

use crate::adapter::CallResolution;
use crate::block::object_to_rules;
use crate::classify::{unwrap_slot, Classification, Classifier, ParamBinding, TemplateItem};
use crate::condition::{ConditionInfo, ConditionKey, ConditionTest, Subject};
use crate::diagnostics::{bail, Bail, ReasonCode, ResolveError};
use crate::ir::{RuleSet, SourceLocation};
use crate::model::{DynamicExpr, StaticExpr, StyleParam, StyleValue};
use crate::session::ResolutionSession;

/// One consequence of a declaration, under the condition it applies in.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Effect {
  Set {
    condition: ConditionKey,
    property: String,
    value: StyleValue,
  },
  /// A nested rule block, finalized with the enclosing binding.
  Block {
    condition: ConditionKey,
    rules: RuleSet,
    binding: ParamBinding,
  },
  StyleFunction {
    condition: ConditionKey,
    property: String,
    value: StyleValue,
    params: Vec<StyleParam>,
  },
  Runtime {
    condition: ConditionKey,
    property: String,
    expr: String,
  },
  ExtraStyles {
    condition: ConditionKey,
    expr: StaticExpr,
  },
}

impl Effect {
  pub(crate) fn condition(&self) -> &ConditionKey {
    match self {
      Effect::Set { condition, .. }
      | Effect::Block { condition, .. }
      | Effect::StyleFunction { condition, .. }
      | Effect::Runtime { condition, .. }
      | Effect::ExtraStyles { condition, .. } => condition,
    }
  }
}

/// Where a slot sits inside its declaration.
#[derive(Debug, Clone, Default)]
pub(crate) struct DeclContext {
  /// camelCase property, `None` for a slot in declaration position.
  pub property: Option<String>,
  pub prefix: String,
  pub suffix: String,
  pub location: Option<SourceLocation>,
}

pub(crate) fn print_source(expr: &Expr) -> Option<String> {
  print_expr(expr).ok()
}

/// Resolve one slot expression under `condition`.
pub(crate) fn resolve_slot(
  session: &mut ResolutionSession<'_>,
  expr: &Expr,
  outer: &ParamBinding,
  ctx: &DeclContext,
  condition: &ConditionKey,
) -> Result<Vec<Effect>, ResolveError> {
  let mut effects = Vec::new();
  let result = unwrap_slot(expr, outer)
    .map_err(ResolveError::from)
    .and_then(|(binding, body)| {
      Resolver {
        session,
        binding: &binding,
        ctx,
      }
      .resolve(body, condition, &mut effects)
    });

  result.map_err(|err| {
    err.map_bail(|bail| {
      let bail = bail.at(ctx.location);
      match print_source(expr) {
        Some(source) => bail.with_context(source),
        None => bail,
      }
    })
  })?;
  Ok(effects)
}

/// Interpret the source text of a resolved expression: quoted strings and
/// numbers are plain CSS text, anything else stays an expression.
pub(crate) fn static_value(source: &str) -> StyleValue {
  let source = source.trim();
  for quote in ['"', '\''] {
    if let Some(inner) = source
      .strip_prefix(quote)
      .and_then(|rest| rest.strip_suffix(quote))
    {
      if !inner.contains(quote) {
        return StyleValue::Literal(inner.to_string());
      }
    }
  }
  if source.parse::<f64>().is_ok() {
    return StyleValue::Literal(source.to_string());
  }
  StyleValue::Expr(StaticExpr(source.to_string()))
}

/// `(path, value)` when the condition is a single theme flag test.
fn theme_flag(test: &ConditionKey) -> Option<(&[String], bool)> {
  let info = test.as_single()?;
  match (&info.subject, &info.test) {
    (Subject::Theme(path), ConditionTest::Truthy) => Some((path, true)),
    (Subject::Theme(path), ConditionTest::Falsy) => Some((path, false)),
    _ => None,
  }
}

struct Resolver<'r, 'a> {
  session: &'r mut ResolutionSession<'a>,
  binding: &'r ParamBinding,
  ctx: &'r DeclContext,
}

impl<'r, 'a> Resolver<'r, 'a> {
  fn classifier(&self) -> Classifier<'r> {
    let config = self.session.config();
    Classifier::new(self.binding, config.theme_segment(), self.ctx.property.is_some())
  }

  fn property(&self) -> Result<String, ResolveError> {
    match &self.ctx.property {
      Some(property) => Ok(property.clone()),
      None => bail(
        ReasonCode::UnsupportedBlock,
        "A value is used where a declaration block is expected",
      ),
    }
  }

  fn wrap(&self, value: StyleValue) -> StyleValue {
    value.wrap(&self.ctx.prefix, &self.ctx.suffix)
  }

  fn is_empty(&self, branch: &Expr) -> bool {
    matches!(self.classifier().classify(branch), Classification::Empty)
  }

  fn resolve(
    &mut self,
    expr: &Expr,
    condition: &ConditionKey,
    out: &mut Vec<Effect>,
  ) -> Result<(), ResolveError> {
    let classification = self.classifier().classify(expr);
    tracing::trace!(kind = classification.kind(), %condition, "Resolving slot branch");

    match classification {
      Classification::Empty => {}
      Classification::Literal(text) => {
        out.push(Effect::Set {
          condition: condition.clone(),
          property: self.property()?,
          value: self.wrap(StyleValue::Literal(text)),
        });
      }
      Classification::ThemePath(path) => {
        let value = self.resolve_theme(&path)?;
        out.push(Effect::Set {
          condition: condition.clone(),
          property: self.property()?,
          value: self.wrap(value),
        });
      }
      Classification::PropValue(prop_ref) => {
        let value = StyleValue::Dynamic(DynamicExpr {
          source: prop_ref.prop.clone(),
          params: vec![prop_ref.prop.clone()],
        });
        out.push(Effect::StyleFunction {
          condition: condition.clone(),
          property: self.property()?,
          value: self.wrap(value),
          params: vec![StyleParam {
            name: prop_ref.prop,
            default: prop_ref.default,
          }],
        });
      }
      Classification::PropExpression { expr, props } => {
        let source = self.param_source(expr)?;
        let params = props
          .iter()
          .map(|prop| StyleParam {
            name: prop.clone(),
            default: self.binding.default_for(prop),
          })
          .collect();
        out.push(Effect::StyleFunction {
          condition: condition.clone(),
          property: self.property()?,
          value: self.wrap(StyleValue::Dynamic(DynamicExpr {
            source,
            params: props,
          })),
          params,
        });
      }
      Classification::Template(items) => self.resolve_template(items, condition, out)?,
      Classification::Conditional {
        condition: test,
        consequent,
        alternate,
      } => self.resolve_conditional(&test, consequent, alternate, condition, out)?,
      Classification::ChainedTernary {
        prop,
        cases,
        default,
      } => {
        // In block position the default must not leak into the cases.
        let default_condition = if self.ctx.property.is_some() {
          condition.clone()
        } else {
          cases.iter().fold(condition.clone(), |key, (case, _)| {
            key.and(ConditionInfo::not_eq(&prop, case.clone()))
          })
        };
        self.resolve(default, &default_condition, out)?;
        for (case, branch) in cases {
          self.resolve(branch, &condition.and(ConditionInfo::eq(&prop, case)), out)?;
        }
      }
      Classification::Guarded {
        condition: test,
        rhs,
      } => self.resolve(rhs, &condition.and_key(&test), out)?,
      Classification::HelperCall(call) => self.resolve_helper(call, condition, out)?,
      Classification::Block(block) => {
        let rules = self.resolve_block(block)?;
        out.push(Effect::Block {
          condition: condition.clone(),
          rules,
          binding: self.binding.clone(),
        });
      }
      Classification::Unclassified { reason, message } => {
        return Err(Bail::new(reason, message).into());
      }
    }
    Ok(())
  }

  fn resolve_theme(&mut self, path: &[String]) -> Result<StyleValue, ResolveError> {
    match self.session.resolve_theme_path(path, self.ctx.location) {
      Some(resolution) => Ok(static_value(&resolution.expr)),
      None => bail(
        ReasonCode::UnresolvableThemePath,
        format!("No static value for theme.{}", path.join(".")),
      ),
    }
  }

  fn resolve_helper(
    &mut self,
    call: &Expr,
    condition: &ConditionKey,
    out: &mut Vec<Effect>,
  ) -> Result<(), ResolveError> {
    let ctx = self.ctx;
    match self.session.resolve_call(call, ctx.property.as_deref()) {
      CallResolution::Value { expr, css_text, .. } => {
        if ctx.property.is_none() {
          return bail(
            ReasonCode::UnresolvableCall,
            "Helper resolves to a single value but is used as a declaration block",
          );
        }
        let value = match css_text {
          Some(text) => StyleValue::Literal(text),
          None => static_value(&expr),
        };
        out.push(Effect::Set {
          condition: condition.clone(),
          property: self.property()?,
          value: self.wrap(value),
        });
      }
      CallResolution::Styles { expr, .. } => {
        if let Some(property) = &ctx.property {
          return bail(
            ReasonCode::StylesInValuePosition,
            format!("Helper resolves to a style object but is used as the value of `{}`", property),
          );
        }
        out.push(Effect::ExtraStyles {
          condition: condition.clone(),
          expr: StaticExpr(expr),
        });
      }
      CallResolution::Unresolved { reason } => {
        return bail(ReasonCode::UnresolvableCall, reason);
      }
    }
    Ok(())
  }

  fn resolve_block(&mut self, block: &Expr) -> Result<RuleSet, ResolveError> {
    match block {
      Expr::Object(object) => Ok(object_to_rules(object)?),
      other => match self.session.parse_block(other) {
        Some(rules) => Ok(rules),
        None => bail(ReasonCode::UnsupportedBlock, "CSS block could not be parsed"),
      },
    }
  }

  fn resolve_template(
    &mut self,
    items: Vec<TemplateItem<'_>>,
    condition: &ConditionKey,
    out: &mut Vec<Effect>,
  ) -> Result<(), ResolveError> {
    let bare = DeclContext {
      property: self.ctx.property.clone(),
      location: self.ctx.location,
      ..Default::default()
    };
    let mut pieces = Vec::new();
    let mut params: Vec<StyleParam> = Vec::new();
    let mut dynamic = false;

    for item in items {
      let expr = match item {
        TemplateItem::Text(text) => {
          pieces.push(StyleValue::Literal(text));
          continue;
        }
        TemplateItem::Expr(expr) => expr,
      };
      let mut inner = Vec::new();
      Resolver {
        session: &mut *self.session,
        binding: self.binding,
        ctx: &bare,
      }
      .resolve(expr, condition, &mut inner)?;

      match inner.as_slice() {
        [] => {}
        [Effect::Set {
          condition: part_condition,
          value,
          ..
        }] if part_condition == condition => pieces.push(value.clone()),
        [Effect::StyleFunction {
          condition: part_condition,
          value,
          params: part_params,
          ..
        }] if part_condition == condition => {
          pieces.push(value.clone());
          for param in part_params {
            if !params.iter().any(|existing| existing.name == param.name) {
              params.push(param.clone());
            }
          }
          dynamic = true;
        }
        _ => {
          return bail(
            ReasonCode::UnclassifiableExpression,
            "Template parts must resolve to a single unconditional value",
          )
        }
      }
    }

    let value = self.wrap(StyleValue::concat(pieces));
    let property = self.property()?;
    if dynamic {
      out.push(Effect::StyleFunction {
        condition: condition.clone(),
        property,
        value,
        params,
      });
    } else {
      out.push(Effect::Set {
        condition: condition.clone(),
        property,
        value,
      });
    }
    Ok(())
  }

  fn resolve_conditional(
    &mut self,
    test: &ConditionKey,
    consequent: &Expr,
    alternate: &Expr,
    condition: &ConditionKey,
    out: &mut Vec<Effect>,
  ) -> Result<(), ResolveError> {
    if let Some((path, when)) = theme_flag(test) {
      if let Some(flag) = self.session.static_theme_flag(path) {
        tracing::debug!(flag = %path.join("."), value = flag, "Theme flag is static");
        let branch = if flag == when { consequent } else { alternate };
        return self.resolve(branch, condition, out);
      }
      if self.ctx.property.is_some() && self.session.config().themed_runtime_fallback() {
        return self.resolve_themed(test, consequent, alternate, condition, out);
      }
    }

    let when_true = condition.and_key(test);
    let when_false = test
      .as_single()
      .map(|info| condition.and(info.negated()));
    let consequent_empty = self.is_empty(consequent);
    let alternate_empty = self.is_empty(alternate);

    if consequent_empty && alternate_empty {
      return Ok(());
    }
    if alternate_empty {
      return self.resolve(consequent, &when_true, out);
    }

    let negated = || {
      when_false.clone().ok_or_else(|| {
        ResolveError::from(Bail::new(
          ReasonCode::UnclassifiableExpression,
          format!("Cannot express the else branch of `{}`", test),
        ))
      })
    };
    if consequent_empty {
      return self.resolve(alternate, &negated()?, out);
    }

    // A value is overridden by the bucket; a block must not leak into it.
    if self.ctx.property.is_some() {
      self.resolve(alternate, condition, out)?;
    } else {
      self.resolve(alternate, &negated()?, out)?;
    }
    self.resolve(consequent, &when_true, out)
  }

  /// Resolve a branch, turning an unresolvable value into `Err(bail)`.
  fn try_branch(
    &mut self,
    branch: &Expr,
    condition: &ConditionKey,
  ) -> Result<Result<Vec<Effect>, Bail>, ResolveError> {
    let checkpoint = self.session.checkpoint();
    let mut effects = Vec::new();
    match self.resolve(branch, condition, &mut effects) {
      Ok(()) => Ok(Ok(effects)),
      Err(ResolveError::Bail(bail))
        if matches!(
          bail.reason,
          ReasonCode::UnresolvableCall | ReasonCode::UnresolvableThemePath
        ) =>
      {
        self.session.rollback(checkpoint);
        Ok(Err(bail))
      }
      Err(err) => Err(err),
    }
  }

  /// `theme.flag ? a : b` where one branch may only be computable at runtime.
  fn resolve_themed(
    &mut self,
    test: &ConditionKey,
    consequent: &Expr,
    alternate: &Expr,
    condition: &ConditionKey,
    out: &mut Vec<Effect>,
  ) -> Result<(), ResolveError> {
    let when_true = condition.and_key(test);
    let when_false = match test.as_single() {
      Some(info) => condition.and(info.negated()),
      None => return bail(ReasonCode::UnclassifiableExpression, "Compound theme condition"),
    };
    let is_plain = |effects: &[Effect]| effects.iter().all(|effect| matches!(effect, Effect::Set { .. }));

    let consequent_result = self.try_branch(consequent, &when_true)?;
    let alternate_result = self.try_branch(alternate, condition)?;

    match (consequent_result, alternate_result) {
      (Ok(consequent_effects), Ok(alternate_effects)) => {
        out.extend(alternate_effects);
        out.extend(consequent_effects);
      }
      (Ok(consequent_effects), Err(unresolved)) => {
        if !is_plain(&consequent_effects) {
          return Err(unresolved.into());
        }
        tracing::debug!(%test, "Keeping the else branch as a runtime style");
        self.resolve(consequent, condition, out)?;
        out.push(self.runtime(alternate, when_false)?);
      }
      (Err(unresolved), Ok(alternate_effects)) => {
        if !is_plain(&alternate_effects) {
          return Err(unresolved.into());
        }
        tracing::debug!(%test, "Keeping the then branch as a runtime style");
        out.extend(alternate_effects);
        out.push(self.runtime(consequent, when_true)?);
      }
      (Err(unresolved), Err(_)) => return Err(unresolved.into()),
    }
    Ok(())
  }

  fn runtime(&self, branch: &Expr, condition: ConditionKey) -> Result<Effect, ResolveError> {
    let mut expr = branch.clone();
    let theme_segment = self.session.config().theme_segment();
    expr.visit_mut_with(&mut ThemeAccessRewriter {
      binding: self.binding,
      theme_segment,
    });
    let source = print_expr(&expr).map_err(|err| {
      Bail::new(
        ReasonCode::UnclassifiableExpression,
        format!("Failed to print runtime expression: {}", err),
      )
    })?;
    let source = if self.ctx.prefix.is_empty() && self.ctx.suffix.is_empty() {
      source
    } else {
      format!("`{}${{{}}}{}`", self.ctx.prefix, source, self.ctx.suffix)
    };
    Ok(Effect::Runtime {
      condition,
      property: self.property()?,
      expr: source,
    })
  }

  /// Print a prop expression with every prop read as a bare parameter.
  fn param_source(&self, expr: &Expr) -> Result<String, ResolveError> {
    let mut expr = expr.clone();
    expr.visit_mut_with(&mut PropAccessRewriter {
      binding: self.binding,
    });
    print_expr(&expr).map_err(|err| {
      ResolveError::from(Bail::new(
        ReasonCode::UnclassifiableExpression,
        format!("Failed to print prop expression: {}", err),
      ))
    })
  }
}

fn ident_expr(name: &str) -> Expr {
  Expr::Ident(Ident::new_no_ctxt(name.into(), DUMMY_SP))
}

/// `props.theme.x` to `theme.x`, for code running under a theme hook.
struct ThemeAccessRewriter<'b> {
  binding: &'b ParamBinding,
  theme_segment: &'b str,
}

impl VisitMut for ThemeAccessRewriter<'_> {
  fn visit_mut_expr(&mut self, expr: &mut Expr) {
    if let Expr::Member(member) = expr {
      if let (Expr::Ident(root), MemberProp::Ident(prop)) = (&*member.obj, &member.prop) {
        if self.binding.is_props_object(&root.sym) && &*prop.sym == self.theme_segment {
          *expr = ident_expr(self.theme_segment);
          return;
        }
      }
    }
    if let Expr::Ident(ident) = expr {
      let renamed = self
        .binding
        .local(&ident.sym)
        .filter(|local| local.prop == self.theme_segment && *ident.sym != *self.theme_segment)
        .is_some();
      if renamed {
        *expr = ident_expr(self.theme_segment);
        return;
      }
    }
    expr.visit_mut_children_with(self);
  }
}

/// `props.width` and destructured locals to the prop name itself.
struct PropAccessRewriter<'b> {
  binding: &'b ParamBinding,
}

impl VisitMut for PropAccessRewriter<'_> {
  fn visit_mut_expr(&mut self, expr: &mut Expr) {
    if let Expr::Member(member) = expr {
      if let (Expr::Ident(root), MemberProp::Ident(prop)) = (&*member.obj, &member.prop) {
        if self.binding.is_props_object(&root.sym) {
          *expr = ident_expr(&prop.sym);
          return;
        }
      }
    }
    if let Expr::Ident(ident) = expr {
      if let Some(local) = self.binding.local(&ident.sym) {
        if local.prop != *ident.sym {
          *expr = ident_expr(&local.prop);
          return;
        }
      }
    }
    expr.visit_mut_children_with(self);
  }
}
