//! A reference [`styled_atomic::ExpressionResolver`] backed by a JSON5 token table.

pub mod resolver;
pub mod token_table;

pub use resolver::TokenResolver;
pub use token_table::{
  clear_token_cache, get_or_load_token_table, load_token_table, parse_token_table, ModuleRef,
  TokenTable,
};
