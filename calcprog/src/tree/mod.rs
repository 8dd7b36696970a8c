//! Tree-shaped expression syntax
//!
//! An alternate concrete syntax for the same arithmetic language, written
//! as JSON: numbers are literals, strings are bare variable names, and
//! `[Head, arg, ...]` arrays are operations.
//!
//! ```json
//! ["If", ["Equal", "solAiops", 1], ["Multiply", "p345Count", 0.7], "p345Count"]
//! ```
//!
//! Trees lower to the ordinary AST, so they share symbol resolution and
//! evaluation with `{{name}}` text.

use crate::ast::{BinOp, Expr, Span, Spanned, UnOp};
use crate::error::{ExprError, Result};
use crate::template::{internal_name, is_identifier};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// A JSON expression tree. Objects are never trees: they are stored
/// `{version, source}` expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct TreeExpr(pub Value);

impl TryFrom<Value> for TreeExpr {
    type Error = String;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        if value.is_object() {
            return Err(format!("expected a number, a name or [head, ...args], found {value}"));
        }
        Ok(TreeExpr(value))
    }
}

impl From<TreeExpr> for Value {
    fn from(tree: TreeExpr) -> Value {
        tree.0
    }
}

impl TreeExpr {
    pub fn new(value: Value) -> Self {
        TreeExpr(value)
    }

    /// Lower to an AST whose variables use internal names
    pub fn lower(&self) -> Result<Spanned<Expr>> {
        lower(&self.0)
    }

    /// Sorted distinct variable names; unreadable parts are skipped
    pub fn variables(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        collect_symbols(&self.0, &mut names);
        names.into_iter().collect()
    }
}

fn at(node: Expr) -> Spanned<Expr> {
    Spanned::new(node, Span::point(0))
}

fn symbol_constant(name: &str) -> Option<&'static str> {
    match name {
        "Pi" => Some("pi"),
        "ExponentialE" => Some("e"),
        "True" => Some("true"),
        "False" => Some("false"),
        _ => None,
    }
}

fn binary_op(head: &str) -> Option<BinOp> {
    Some(match head {
        "Add" => BinOp::Add,
        "Subtract" => BinOp::Sub,
        "Multiply" => BinOp::Mul,
        "Divide" => BinOp::Div,
        "Mod" => BinOp::Mod,
        "Power" => BinOp::Pow,
        "Equal" => BinOp::Eq,
        "NotEqual" => BinOp::Ne,
        "Less" => BinOp::Lt,
        "LessEqual" => BinOp::Le,
        "Greater" => BinOp::Gt,
        "GreaterEqual" => BinOp::Ge,
        "And" => BinOp::And,
        "Or" => BinOp::Or,
        _ => return None,
    })
}

/// Heads that fold left over any number (>= 2) of operands
fn is_variadic(op: BinOp) -> bool {
    matches!(op, BinOp::Add | BinOp::Mul | BinOp::And | BinOp::Or)
}

fn function_name(head: &str) -> Option<&'static str> {
    Some(match head {
        "Abs" => "abs",
        "Sqrt" => "sqrt",
        "Exp" => "exp",
        "Ln" => "log",
        "Log" => "log10",
        "Floor" => "floor",
        "Ceil" => "ceil",
        "Round" => "round",
        "Min" => "min",
        "Max" => "max",
        _ => return None,
    })
}

fn lower(value: &Value) -> Result<Spanned<Expr>> {
    stacker::maybe_grow(32 * 1024, 1024 * 1024, || match value {
        Value::Number(n) => n
            .as_f64()
            .map(|n| at(Expr::Number(n)))
            .ok_or_else(|| ExprError::tree(format!("number {n} is out of range"))),
        Value::String(name) => lower_symbol(name),
        Value::Array(items) => lower_operation(items),
        other => Err(ExprError::tree(format!(
            "expected a number, a name or [head, ...args], found {other}"
        ))),
    })
}

fn lower_symbol(name: &str) -> Result<Spanned<Expr>> {
    if let Some(constant) = symbol_constant(name) {
        return Ok(at(Expr::Symbol(constant.to_string())));
    }
    if !is_identifier(name) {
        return Err(ExprError::tree(format!("\"{name}\" is not a valid name")));
    }
    Ok(at(Expr::Symbol(internal_name(name))))
}

fn lower_operation(items: &[Value]) -> Result<Spanned<Expr>> {
    let Some((Value::String(head), rest)) = items.split_first() else {
        return Err(ExprError::tree("operation must start with a head name"));
    };
    let args = rest.iter().map(lower).collect::<Result<Vec<_>>>()?;
    let count = args.len();

    match head.as_str() {
        "Negate" => {
            let [arg] = <[_; 1]>::try_from(args).map_err(|args| arity_error_for(head, "1", args.len()))?;
            Ok(at(Expr::unary(UnOp::Neg, arg)))
        }
        "Not" => {
            let [arg] = <[_; 1]>::try_from(args).map_err(|args| arity_error_for(head, "1", args.len()))?;
            Ok(at(Expr::unary(UnOp::Not, arg)))
        }
        "Subtract" if args.len() == 1 => {
            let [arg] = <[_; 1]>::try_from(args).map_err(|args| arity_error_for(head, "1", args.len()))?;
            Ok(at(Expr::unary(UnOp::Neg, arg)))
        }
        "If" => {
            let [cond, then_branch, else_branch] =
                <[_; 3]>::try_from(args).map_err(|args| arity_error_for(head, "3", args.len()))?;
            Ok(at(Expr::Conditional {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            }))
        }
        _ => {
            if let Some(op) = binary_op(head) {
                if is_variadic(op) {
                    let mut operands = args.into_iter();
                    let first = operands
                        .next()
                        .filter(|_| count >= 2)
                        .ok_or_else(|| arity_error_for(head, "at least 2", count))?;
                    return Ok(operands.fold(first, |acc, next| at(Expr::binary(acc, op, next))));
                }
                let [left, right] = <[_; 2]>::try_from(args).map_err(|args| arity_error_for(head, "2", args.len()))?;
                return Ok(at(Expr::binary(left, op, right)));
            }
            if let Some(func) = function_name(head) {
                return Ok(at(Expr::Call {
                    func: Spanned::new(func.to_string(), Span::point(0)),
                    args,
                }));
            }
            Err(ExprError::tree(format!("unknown operation \"{head}\"")))
        }
    }
}

fn arity_error_for(head: &str, expected: &str, got: usize) -> ExprError {
    ExprError::tree(format!("{head} expects {expected} operand(s), got {got}"))
}

fn collect_symbols(value: &Value, names: &mut BTreeSet<String>) {
    match value {
        Value::String(name) if symbol_constant(name).is_none() && is_identifier(name) => {
            names.insert(name.clone());
        }
        Value::Array(items) => {
            // skip the head
            for item in items.iter().skip(1) {
                collect_symbols(item, names);
            }
        }
        _ => {}
    }
}
