//! Abstract Syntax Tree definitions

mod expr;
mod span;
pub mod walk;

pub use expr::*;
pub use span::*;
