//! Symbol resolution over a parsed expression
//!
//! Runs after parsing succeeds and before anything is evaluated. Three
//! passes, each fail-fast:
//!
//! 1. every free symbol is a rewritten variable, a builtin, or reserved;
//! 2. no quoted text literal appears anywhere;
//! 3. every call targets a builtin function with an accepted arity.

use crate::ast::walk::walk;
use crate::ast::{Expr, Spanned};
use crate::builtins;
use crate::error::{ExprError, Result};
use crate::template::VARIABLE_PREFIX;
use crate::util::find_similar_name;
use std::ops::ControlFlow;

/// Maximum edit distance for "did you mean" suggestions
const SUGGESTION_THRESHOLD: usize = 2;

/// Check that a symbol name may appear in an expression
pub fn is_allowed_symbol(name: &str) -> bool {
    name.starts_with(VARIABLE_PREFIX) || builtins::is_allowed(name)
}

/// Run every resolution pass over `expr`
pub fn resolve(expr: &Spanned<Expr>) -> Result<()> {
    if let Some(bad) = find_unknown_symbol(expr) {
        let names = builtins::names();
        let suggestion = find_similar_name(&bad.node, &names, SUGGESTION_THRESHOLD);
        return Err(ExprError::unknown_symbol(bad.node, Some(bad.span)).with_suggestion(suggestion));
    }
    if let Some(literal) = find_string_literal(expr) {
        return Err(ExprError::NonNumericLiteral { span: literal });
    }
    check_calls(expr)
}

/// First symbol (pre-order) that is not allowed. Call targets count as
/// symbols, visited before their arguments.
pub fn find_unknown_symbol(expr: &Spanned<Expr>) -> Option<Spanned<String>> {
    let found = walk(expr, &mut |node| match &node.node {
        Expr::Symbol(name) if !is_allowed_symbol(name) => {
            ControlFlow::Break(Spanned::new(name.clone(), node.span))
        }
        Expr::Call { func, .. } if !is_allowed_symbol(&func.node) => ControlFlow::Break(func.clone()),
        _ => ControlFlow::Continue(()),
    });
    match found {
        ControlFlow::Break(bad) => Some(bad),
        ControlFlow::Continue(()) => None,
    }
}

fn find_string_literal(expr: &Spanned<Expr>) -> Option<crate::ast::Span> {
    match walk(expr, &mut |node| match &node.node {
        Expr::Str(_) => ControlFlow::Break(node.span),
        _ => ControlFlow::Continue(()),
    }) {
        ControlFlow::Break(span) => Some(span),
        ControlFlow::Continue(()) => None,
    }
}

fn check_calls(expr: &Spanned<Expr>) -> Result<()> {
    match walk(expr, &mut |node| {
        let Expr::Call { func, args } = &node.node else {
            return ControlFlow::Continue(());
        };
        match builtins::function(&func.node) {
            Some(builtin) if builtin.arity.accepts(args.len()) => ControlFlow::Continue(()),
            Some(builtin) => ControlFlow::Break(ExprError::Arity {
                name: func.node.clone(),
                expected: builtin.arity.to_string(),
                got: args.len(),
                span: node.span,
            }),
            None => ControlFlow::Break(ExprError::NotCallable {
                name: crate::template::original_name(&func.node)
                    .unwrap_or(&func.node)
                    .to_string(),
                span: func.span,
            }),
        }
    }) {
        ControlFlow::Break(err) => Err(err),
        ControlFlow::Continue(()) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn resolve_src(source: &str) -> Result<()> {
        let ast = parse(tokenize(source)?)?;
        resolve(&ast)
    }

    #[test]
    fn test_variables_and_builtins_resolve() {
        assert!(resolve_src("__v_a + sqrt(__v_b) * pi").is_ok());
        assert!(resolve_src("max(1, 2, 3) + end").is_ok());
    }

    #[test]
    fn test_first_unknown_symbol_wins() {
        let err = resolve_src("__v_a + foo + bar").unwrap_err();
        assert_eq!(err.symbol(), Some("foo"));
    }

    #[test]
    fn test_unknown_function_is_unknown_symbol() {
        let err = resolve_src("frobnicate(1)").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownSymbol);
        assert_eq!(err.symbol(), Some("frobnicate"));
    }

    #[test]
    fn test_unknown_symbol_suggests_builtin() {
        let err = resolve_src("sqr(4)").unwrap_err();
        assert_eq!(err.suggestion(), Some("sqrt"));
    }

    #[test]
    fn test_unknown_symbol_checked_before_string_literals() {
        let err = resolve_src("\"text\" + nope").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownSymbol);
    }

    #[test]
    fn test_string_literal_rejected() {
        let err = resolve_src("1 + 'abc'").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NonNumericLiteral);
        assert_eq!(err.span(), Some(crate::ast::Span::new(4, 9)));
    }

    #[test]
    fn test_arity_checked() {
        let err = resolve_src("sqrt(1, 2)").unwrap_err();
        assert!(matches!(err, ExprError::Arity { ref name, got: 2, .. } if name == "sqrt"));
        assert_eq!(err.kind(), ErrorKind::InvalidCall);
    }

    #[test]
    fn test_calling_a_variable_is_not_callable() {
        let err = resolve_src("__v_rate(2)").unwrap_err();
        assert_eq!(err, ExprError::NotCallable { name: "rate".to_string(), span: crate::ast::Span::new(0, 8) });
    }
}
