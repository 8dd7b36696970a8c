//! Evaluator for resolved expression trees

mod env;
mod eval;

pub use env::Environment;
pub use eval::{Evaluator, nearly_equal};
