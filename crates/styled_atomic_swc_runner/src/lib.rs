pub mod runner;

pub use runner::{parse_expr, print_expr, RunnerError};
