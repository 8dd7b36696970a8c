//! Calculation programs over a templated arithmetic language
//!
//! Expressions reference scope variables as `{{name}}`:
//!
//! ```
//! use calcprog::{Scope, StoredExpression, evaluate};
//!
//! let scope: Scope = [("a".to_string(), 2.0), ("b".to_string(), 3.0)].into_iter().collect();
//! let value = evaluate(&StoredExpression::new("{{a}} + {{b}}"), &scope).unwrap();
//! assert_eq!(value, 5.0);
//! ```
//!
//! A [`Program`] chains named steps over named inputs and reports named
//! outputs; see [`run_program`].

pub mod ast;
pub mod builtins;
pub mod config;
pub mod error;
pub mod expression;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod program;
pub mod repl;
pub mod resolver;
pub mod template;
pub mod tree;
pub mod util;

pub use ast::Span;
pub use config::EngineConfig;
pub use error::{ErrorKind, ExprError, Result, RunError, ValidationCode, ValidationError};
pub use expression::{
    Compiled, ExpressionAnalysis, Scope, StoredExpression, analyze, analyze_tree, analyze_with, evaluate,
    evaluate_tree, evaluate_with,
};
pub use program::{
    OutputResult, Program, RunTrace, run_program, run_program_traced, run_program_with, validate_program,
    validate_program_with,
};
pub use template::extract_variables;
pub use tree::TreeExpr;
