//! The single-expression contract: analyze and evaluate
//!
//! Every expression passes through the same pipeline whichever entry point
//! is used:
//!
//! ```text
//! {{name}} text -> template rewrite -> tokens -> AST -> depth check -> resolve
//! JSON tree ----------------------------------> AST -> depth check -> resolve
//! ```
//!
//! Only an expression that made it through [`Compiled::new`] (or
//! [`Compiled::from_tree`]) is ever evaluated.

use crate::ast::walk::depth;
use crate::ast::{Expr, Spanned};
use crate::config::EngineConfig;
use crate::error::{ExprError, Result};
use crate::interp::{Environment, Evaluator};
use crate::lexer::tokenize;
use crate::parser::parse;
use crate::resolver::resolve;
use crate::template::{Template, extract_variables};
use crate::tree::TreeExpr;
use crate::util::find_similar_name;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Variable name to value, in binding order
pub type Scope = IndexMap<String, f64>;

/// The only stored-expression format version understood
pub const CURRENT_VERSION: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct ExpressionVersion(u64);

impl Default for ExpressionVersion {
    fn default() -> Self {
        ExpressionVersion(CURRENT_VERSION)
    }
}

impl TryFrom<u64> for ExpressionVersion {
    type Error = String;

    fn try_from(version: u64) -> std::result::Result<Self, Self::Error> {
        if version == CURRENT_VERSION {
            Ok(ExpressionVersion(version))
        } else {
            Err(format!("unsupported expression version {version}, expected {CURRENT_VERSION}"))
        }
    }
}

impl From<ExpressionVersion> for u64 {
    fn from(version: ExpressionVersion) -> u64 {
        version.0
    }
}

/// A versioned expression as saved by an editor.
/// An empty `source` means "not written yet".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredExpression {
    #[serde(default)]
    pub version: ExpressionVersion,
    #[serde(default)]
    pub source: String,
}

impl StoredExpression {
    pub fn new(source: impl Into<String>) -> Self {
        StoredExpression {
            version: ExpressionVersion::default(),
            source: source.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.source.trim().is_empty()
    }
}

/// Result of [`analyze`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionAnalysis {
    pub variables: Vec<String>,
    pub error: Option<String>,
}

/// A parsed and resolved expression, ready to evaluate against any scope
#[derive(Debug, Clone)]
pub struct Compiled {
    ast: Spanned<Expr>,
    template: Template,
    variables: Vec<String>,
}

impl Compiled {
    /// Compile `{{name}}` source text. Error spans refer to `source`.
    pub fn new(source: &str, config: &EngineConfig) -> Result<Self> {
        if source.trim().is_empty() {
            return Err(ExprError::EmptySource);
        }
        let template = Template::rewrite(source);
        let ast = compile_text(template.internal(), config)
            .map_err(|e| e.map_span(|span| template.to_original(span)))?;
        Ok(Compiled {
            ast,
            variables: extract_variables(source),
            template,
        })
    }

    /// Compile a JSON expression tree
    pub fn from_tree(tree: &TreeExpr, config: &EngineConfig) -> Result<Self> {
        let ast = tree.lower()?;
        check_depth(&ast, config)?;
        resolve(&ast)?;
        Ok(Compiled {
            ast,
            template: Template::rewrite(""),
            variables: tree.variables(),
        })
    }

    /// Sorted distinct variable names the expression references
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn evaluate(&self, scope: &Scope) -> Result<f64> {
        let env = Environment::from_scope(scope.iter());
        Evaluator::new(&env)
            .evaluate(&self.ast)
            .map_err(|e| e.map_span(|span| self.template.to_original(span)))
    }
}

fn compile_text(internal: &str, config: &EngineConfig) -> Result<Spanned<Expr>> {
    let ast = parse(tokenize(internal)?)?;
    check_depth(&ast, config)?;
    resolve(&ast)?;
    Ok(ast)
}

fn check_depth(ast: &Spanned<Expr>, config: &EngineConfig) -> Result<()> {
    if depth(ast) > config.max_depth {
        return Err(ExprError::parse("expression nested too deeply", ast.span));
    }
    Ok(())
}

/// Variables and the first problem with `source`, if any.
///
/// Variables come from a textual scan, so they are reported even when the
/// source does not parse. Blank source is valid and has no variables.
pub fn analyze(source: &str) -> ExpressionAnalysis {
    analyze_with(source, &EngineConfig::default())
}

pub fn analyze_with(source: &str, config: &EngineConfig) -> ExpressionAnalysis {
    if source.trim().is_empty() {
        return ExpressionAnalysis {
            variables: Vec::new(),
            error: None,
        };
    }
    ExpressionAnalysis {
        variables: extract_variables(source),
        error: Compiled::new(source, config).err().map(|e| e.to_string()),
    }
}

/// Sorted distinct variable names of a tree expression
pub fn analyze_tree(tree: &TreeExpr) -> Vec<String> {
    tree.variables()
}

/// Evaluate a stored expression against `scope` to a finite number
pub fn evaluate(expression: &StoredExpression, scope: &Scope) -> Result<f64> {
    evaluate_with(expression, scope, &EngineConfig::default())
}

pub fn evaluate_with(expression: &StoredExpression, scope: &Scope, config: &EngineConfig) -> Result<f64> {
    Compiled::new(&expression.source, config)
        .map_err(|e| suggest_from_scope(e, scope))?
        .evaluate(scope)
}

pub fn evaluate_tree(tree: &TreeExpr, scope: &Scope, config: &EngineConfig) -> Result<f64> {
    Compiled::from_tree(tree, config)?.evaluate(scope)
}

/// A bare word naming (or close to) a scope variable most likely meant
/// `{{variable}}`; an exact scope match beats a builtin lookalike
fn suggest_from_scope(error: ExprError, scope: &Scope) -> ExprError {
    let ExprError::UnknownSymbol { name, suggestion, .. } = &error else {
        return error;
    };
    let names: Vec<&str> = scope.keys().map(String::as_str).collect();
    let candidate = if scope.contains_key(name) {
        Some(name.clone())
    } else if suggestion.is_none() {
        find_similar_name(name, &names, 2).map(str::to_string)
    } else {
        return error;
    };
    error.with_suggestion(candidate.as_deref())
}
