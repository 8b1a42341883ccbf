//! Declaration resolution and variant grouping for styled component migration.
//!
//! The engine takes the parsed rule tree of one template-literal styled
//! component, classifies every interpolated slot, resolves it through an
//! [`adapter::ExpressionResolver`] and merges the results into a [`StyleModel`]
//! that a code emitter can print as static atomic styles.

pub mod adapter;
mod block;
mod cascade;
pub mod classify;
pub mod condition;
pub mod config;
pub mod diagnostics;
mod finalize;
pub mod ir;
pub mod model;
pub mod pipeline;
pub mod prop_valid;
mod resolve;
pub mod selector;
pub mod session;
pub mod shorthand;
pub mod testing;
pub mod utils;
pub mod variants;
pub mod wrapper;

pub use adapter::{CallResolution, CssBlockParser, ExpressionResolver, ImportSpec, ThemeResolution};
pub use condition::{ConditionInfo, ConditionKey};
pub use config::EngineConfig;
pub use diagnostics::{EngineError, ReasonCode, Severity, Warning};
pub use ir::{ComponentInput, Declaration, FileInput, Rule, RuleSet, SlotId, SlotMap};
pub use model::{StyleModel, StyleValue, VariantDimension};
pub use pipeline::{transform_component, transform_file, ComponentOutcome, FileOutput};
pub use session::ResolutionSession;
