//! Expression evaluator

use super::env::Environment;
use crate::ast::{BinOp, Expr, Spanned, UnOp};
use crate::builtins;
use crate::error::{ExprError, Result};
use crate::template::original_name;
use crate::util::find_similar_name;

/// Stack growth parameters for deeply nested expressions
const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_SIZE: usize = 1024 * 1024;

/// Relative and absolute tolerance for `==`, as used by comparisons
const REL_EPSILON: f64 = 1e-12;
const ABS_EPSILON: f64 = 1e-15;

/// Evaluates a resolved AST against one environment.
///
/// Holds no state beyond a borrowed environment; the same tree and
/// environment always produce the same result.
pub struct Evaluator<'env> {
    env: &'env Environment,
}

impl<'env> Evaluator<'env> {
    pub fn new(env: &'env Environment) -> Self {
        Evaluator { env }
    }

    /// Evaluate to a finite number
    pub fn evaluate(&self, expr: &Spanned<Expr>) -> Result<f64> {
        let value = self.eval(expr)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ExprError::NonFiniteResult { value })
        }
    }

    fn eval(&self, expr: &Spanned<Expr>) -> Result<f64> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.eval_inner(expr))
    }

    fn eval_inner(&self, expr: &Spanned<Expr>) -> Result<f64> {
        match &expr.node {
            Expr::Number(n) => Ok(*n),

            Expr::Str(_) => Err(ExprError::NonNumericLiteral { span: expr.span }),

            Expr::Symbol(name) => self.lookup(name, expr),

            Expr::Binary { left, op, right } => match op {
                BinOp::And => {
                    if !truthy(self.eval(left)?) {
                        return Ok(0.0);
                    }
                    Ok(bool_value(truthy(self.eval(right)?)))
                }
                BinOp::Or => {
                    if truthy(self.eval(left)?) {
                        return Ok(1.0);
                    }
                    Ok(bool_value(truthy(self.eval(right)?)))
                }
                _ => {
                    let lval = self.eval(left)?;
                    let rval = self.eval(right)?;
                    Ok(eval_binary(*op, lval, rval))
                }
            },

            Expr::Unary { op, expr: inner } => {
                let val = self.eval(inner)?;
                Ok(match op {
                    UnOp::Neg => -val,
                    UnOp::Plus => val,
                    UnOp::Not => bool_value(!truthy(val)),
                    UnOp::Factorial => builtins::factorial(val),
                })
            }

            Expr::Conditional {
                cond,
                then_branch,
                else_branch,
            } => {
                if truthy(self.eval(cond)?) {
                    self.eval(then_branch)
                } else {
                    self.eval(else_branch)
                }
            }

            Expr::Call { func, args } => {
                let Some(builtin) = builtins::function(&func.node) else {
                    return Err(ExprError::NotCallable {
                        name: original_name(&func.node).unwrap_or(&func.node).to_string(),
                        span: func.span,
                    });
                };
                if !builtin.arity.accepts(args.len()) {
                    return Err(ExprError::Arity {
                        name: func.node.clone(),
                        expected: builtin.arity.to_string(),
                        got: args.len(),
                        span: expr.span,
                    });
                }
                let values = args.iter().map(|arg| self.eval(arg)).collect::<Result<Vec<_>>>()?;
                Ok((builtin.func)(&values))
            }
        }
    }

    fn lookup(&self, name: &str, expr: &Spanned<Expr>) -> Result<f64> {
        if let Some(var) = original_name(name) {
            return self.env.get(name).ok_or_else(|| {
                let names = self.env.names();
                ExprError::unbound(var, Some(expr.span))
                    .with_suggestion(find_similar_name(var, &names, 2))
            });
        }
        if let Some(value) = builtins::constant(name) {
            return Ok(value);
        }
        if builtins::is_reserved(name) {
            return Err(ExprError::unknown_symbol(name, Some(expr.span)));
        }
        if builtins::function(name).is_some() {
            // a function used as a value has no numeric result
            return Err(ExprError::NonFiniteResult { value: f64::NAN });
        }
        Err(ExprError::unknown_symbol(name, Some(expr.span)))
    }
}

fn eval_binary(op: BinOp, l: f64, r: f64) -> f64 {
    match op {
        BinOp::Add => l + r,
        BinOp::Sub => l - r,
        BinOp::Mul => l * r,
        BinOp::Div => l / r,
        BinOp::Mod => builtins::modulo(l, r),
        BinOp::Pow => l.powf(r),
        BinOp::Eq => bool_value(nearly_equal(l, r)),
        BinOp::Ne => bool_value(!nearly_equal(l, r)),
        BinOp::Lt => bool_value(l < r && !nearly_equal(l, r)),
        BinOp::Gt => bool_value(l > r && !nearly_equal(l, r)),
        BinOp::Le => bool_value(l <= r || nearly_equal(l, r)),
        BinOp::Ge => bool_value(l >= r || nearly_equal(l, r)),
        BinOp::And => bool_value(truthy(l) && truthy(r)),
        BinOp::Or => bool_value(truthy(l) || truthy(r)),
    }
}

/// Equality with a relative tolerance, so `0.1 + 0.2 == 0.3` holds
pub fn nearly_equal(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    let diff = (a - b).abs();
    diff <= ABS_EPSILON || diff <= REL_EPSILON * a.abs().max(b.abs())
}

fn truthy(value: f64) -> bool {
    value != 0.0 && !value.is_nan()
}

fn bool_value(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn eval_with(source: &str, env: &Environment) -> Result<f64> {
        let ast = parse(tokenize(source)?)?;
        Evaluator::new(env).evaluate(&ast)
    }

    fn eval(source: &str) -> f64 {
        eval_with(source, &Environment::new()).unwrap()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("1 + 2 * 3"), 7.0);
        assert_eq!(eval("(1 + 2) * 3"), 9.0);
        assert_eq!(eval("10 - 4 - 3"), 3.0);
        assert_eq!(eval("12 / 3 / 2"), 2.0);
    }

    #[test]
    fn test_power_is_right_associative_and_binds_tighter_than_negation() {
        assert_eq!(eval("2 ^ 3 ^ 2"), 512.0);
        assert_eq!(eval("-2 ^ 2"), -4.0);
        assert_eq!(eval("2 ^ -1"), 0.5);
    }

    #[test]
    fn test_comparisons_yield_numbers() {
        assert_eq!(eval("3 > 2"), 1.0);
        assert_eq!(eval("3 < 2"), 0.0);
        assert_eq!(eval("(3 >= 3) + (2 <= 1)"), 1.0);
        assert_eq!(eval("0.1 + 0.2 == 0.3"), 1.0);
        assert_eq!(eval("1 != 1"), 0.0);
    }

    #[test]
    fn test_logical_and_conditional() {
        assert_eq!(eval("1 and 0"), 0.0);
        assert_eq!(eval("0 or 5"), 1.0);
        assert_eq!(eval("not 0"), 1.0);
        assert_eq!(eval("2 > 1 ? 10 : 20"), 10.0);
        assert_eq!(eval("0 ? 1 : 0 ? 2 : 3"), 3.0);
    }

    #[test]
    fn test_modulo_and_factorial() {
        assert_eq!(eval("7 % 3"), 1.0);
        assert_eq!(eval("-7 % 3"), 2.0);
        assert_eq!(eval("4!"), 24.0);
        assert_eq!(eval("2 ^ 3!"), 64.0);
    }

    #[test]
    fn test_builtin_calls_and_constants() {
        assert_eq!(eval("sqrt(16) + abs(-2)"), 6.0);
        assert_eq!(eval("max(1, 5, 3)"), 5.0);
        assert_eq!(eval("true + true"), 2.0);
        assert!((eval("cos(pi)") + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_variables_from_environment() {
        let mut env = Environment::new();
        env.define("a", 2.0);
        env.define("b", 3.0);
        assert_eq!(eval_with("__v_a * __v_b", &env).unwrap(), 6.0);
    }

    #[test]
    fn test_unbound_variable_reports_user_name() {
        let mut env = Environment::new();
        env.define("rate", 1.0);
        let err = eval_with("__v_rte + 1", &env).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownSymbol);
        assert_eq!(err.symbol(), Some("rte"));
        assert_eq!(err.suggestion(), Some("rate"));
    }

    #[test]
    fn test_reserved_symbol_has_no_value() {
        let err = eval_with("end", &Environment::new()).unwrap_err();
        assert_eq!(err.symbol(), Some("end"));
    }

    #[test]
    fn test_non_finite_results() {
        let env = Environment::new();
        for source in ["1 / 0", "0 / 0", "log(0)", "sqrt(-1)", "sqrt"] {
            let err = eval_with(source, &env).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NonFiniteResult, "{source}");
        }
    }

    #[test]
    fn test_intermediate_infinity_can_still_yield_finite() {
        assert_eq!(eval("1 / 0 > 5"), 1.0);
    }

    #[test]
    fn test_deep_nesting_does_not_overflow() {
        let source = format!("{}1", "-".repeat(2000));
        assert_eq!(eval(&source), 1.0);
    }

    #[test]
    fn test_nearly_equal() {
        assert!(nearly_equal(1.0, 1.0 + 1e-14));
        assert!(!nearly_equal(1.0, 1.0001));
        assert!(!nearly_equal(f64::NAN, f64::NAN));
        assert!(nearly_equal(f64::INFINITY, f64::INFINITY));
    }
}
