//! Per-component and per-file entrypoints.

use serde::Serialize;

use crate::adapter::{CssBlockParser, ExpressionResolver, ImportSpec};
use crate::cascade::preserve_cascade;
use crate::config::EngineConfig;
use crate::diagnostics::{EngineError, ResolveError, Warning};
use crate::finalize::finalize_component;
use crate::ir::{ComponentInput, FileInput};
use crate::model::{StyleModel, VariantDimension};
use crate::session::ResolutionSession;
use crate::shorthand::normalize_shorthands;
use crate::variants::{group_dimensions, group_file_dimensions};
use crate::wrapper::analyze_wrapper;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ComponentOutcome {
  Transformed(StyleModel),
  /// Left untouched. The warning explains why.
  Bailed(Warning),
}

impl ComponentOutcome {
  pub fn model(&self) -> Option<&StyleModel> {
    match self {
      ComponentOutcome::Transformed(model) => Some(model),
      ComponentOutcome::Bailed(_) => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOutput {
  pub path: String,
  pub components: Vec<ComponentOutcome>,
  /// Dimensions of all transformed components, identical ones shared.
  pub dimensions: Vec<VariantDimension>,
  pub imports: Vec<ImportSpec>,
  pub warnings: Vec<Warning>,
}

impl FileOutput {
  pub fn model(&self, component: &str) -> Option<&StyleModel> {
    self
      .components
      .iter()
      .filter_map(ComponentOutcome::model)
      .find(|model| model.component == component)
  }
}

/// Resolve one component: finalize, cascade, group, normalize shorthands and
/// decide wrapper necessity.
///
/// A bail discards everything recorded for the component and leaves exactly
/// one warning in the session. Only malformed input is an `Err`.
#[tracing::instrument(level = "debug", skip_all, fields(component = %input.name))]
pub fn transform_component(
  input: &ComponentInput,
  session: &mut ResolutionSession<'_>,
) -> Result<ComponentOutcome, EngineError> {
  let checkpoint = session.checkpoint();
  let config = session.config();

  let mut model = match finalize_component(session, input) {
    Ok(model) => model,
    Err(ResolveError::Fatal(err)) => return Err(err),
    Err(ResolveError::Bail(bail)) => {
      session.rollback(checkpoint);
      let warning = bail.into_warning(&input.name);
      tracing::warn!("Skipping {}: {}", input.name, warning);
      session.push_warning(warning.clone());
      return Ok(ComponentOutcome::Bailed(warning));
    }
  };

  for mut warning in preserve_cascade(&mut model, config) {
    warning.component = Some(input.name.clone());
    session.push_warning(warning);
  }
  group_dimensions(&mut model, &input.prop_types, config);
  normalize_shorthands(&mut model, config);

  model.wrapper = analyze_wrapper(&model, input, config);
  model.needs_wrapper = !model.wrapper.reasons.is_empty();
  tracing::debug!(
    buckets = model.buckets.len(),
    dimensions = model.dimensions.len(),
    needs_wrapper = model.needs_wrapper,
    "Resolved component"
  );
  Ok(ComponentOutcome::Transformed(model))
}

/// Resolve every component of a file in order, then share dimensions across them.
#[tracing::instrument(level = "debug", skip_all, fields(path = %file.path))]
pub fn transform_file(
  file: &FileInput,
  resolver: &dyn ExpressionResolver,
  block_parser: &dyn CssBlockParser,
  config: &EngineConfig,
) -> Result<FileOutput, EngineError> {
  let mut session = ResolutionSession::new(resolver, block_parser, config)
    .with_component_names(file.components.iter().map(|component| component.name.clone()));

  let mut components = Vec::with_capacity(file.components.len());
  for input in &file.components {
    components.push(transform_component(input, &mut session)?);
  }

  let dimensions = group_file_dimensions(components.iter_mut().filter_map(|outcome| match outcome {
    ComponentOutcome::Transformed(model) => Some(model),
    ComponentOutcome::Bailed(_) => None,
  }));

  Ok(FileOutput {
    path: file.path.clone(),
    components,
    dimensions,
    imports: session.take_imports(),
    warnings: session.take_warnings(),
  })
}
