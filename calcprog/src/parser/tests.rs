//! Parser tests for the arithmetic grammar

use crate::ast::{BinOp, Expr, Span, Spanned, UnOp};
use crate::error::ErrorKind;
use crate::lexer::tokenize;
use crate::parser::parse;

/// Helper to parse an expression and return the AST
fn parse_expr(source: &str) -> crate::error::Result<Spanned<Expr>> {
    parse(tokenize(source)?)
}

/// Helper to parse and expect success
fn parse_ok(source: &str) -> Spanned<Expr> {
    parse_expr(source).expect("Parse should succeed")
}

/// Helper to check if parsing fails
fn parse_fails(source: &str) -> bool {
    parse_expr(source).is_err()
}

/// Fully parenthesized rendering, to compare shapes without spans
fn shape(expr: &Spanned<Expr>) -> String {
    match &expr.node {
        Expr::Number(n) => n.to_string(),
        Expr::Str(s) => format!("{s:?}"),
        Expr::Symbol(name) => name.clone(),
        Expr::Binary { left, op, right } => format!("({} {op} {})", shape(left), shape(right)),
        Expr::Unary { op: UnOp::Factorial, expr } => format!("({}!)", shape(expr)),
        Expr::Unary { op: UnOp::Not, expr } => format!("(not {})", shape(expr)),
        Expr::Unary { op, expr } => format!("({op}{})", shape(expr)),
        Expr::Conditional {
            cond,
            then_branch,
            else_branch,
        } => format!("({} ? {} : {})", shape(cond), shape(then_branch), shape(else_branch)),
        Expr::Call { func, args } => {
            let args: Vec<String> = args.iter().map(shape).collect();
            format!("{}({})", func.node, args.join(", "))
        }
    }
}

fn shape_of(source: &str) -> String {
    shape(&parse_ok(source))
}

// ============================================
// Literals and atoms
// ============================================

#[test]
fn test_parse_number_forms() {
    for (source, value) in [("42", 42.0), ("1.5", 1.5), (".5", 0.5), ("1.", 1.0), ("1e3", 1000.0), ("2.5E-2", 0.025)] {
        let expr = parse_ok(source);
        assert_eq!(expr.node, Expr::Number(value), "{source}");
    }
}

#[test]
fn test_parse_string_literal() {
    let expr = parse_ok("'abc'");
    assert_eq!(expr.node, Expr::Str("abc".to_string()));
    assert_eq!(expr.span, Span::new(0, 5));
}

#[test]
fn test_parse_symbol_and_call() {
    let expr = parse_ok("__v_rate");
    assert_eq!(expr.node, Expr::Symbol("__v_rate".to_string()));

    let expr = parse_ok("max(1, __v_a, 3)");
    let Expr::Call { func, args } = &expr.node else {
        panic!("Expected Call");
    };
    assert_eq!(func.node, "max");
    assert_eq!(func.span, Span::new(0, 3));
    assert_eq!(args.len(), 3);
    assert_eq!(expr.span, Span::new(0, 16));
}

#[test]
fn test_parse_call_without_arguments() {
    assert_eq!(shape_of("f()"), "f()");
}

// ============================================
// Precedence and associativity
// ============================================

#[test]
fn test_parse_arithmetic_precedence() {
    assert_eq!(shape_of("1 + 2 * 3"), "(1 + (2 * 3))");
    assert_eq!(shape_of("(1 + 2) * 3"), "((1 + 2) * 3)");
    assert_eq!(shape_of("1 - 2 - 3"), "((1 - 2) - 3)");
    assert_eq!(shape_of("8 / 4 % 3"), "((8 / 4) % 3)");
}

#[test]
fn test_parse_power() {
    assert_eq!(shape_of("2 ^ 3 ^ 2"), "(2 ^ (3 ^ 2))");
    assert_eq!(shape_of("-2 ^ 2"), "(-(2 ^ 2))");
    assert_eq!(shape_of("2 ^ -1"), "(2 ^ (-1))");
    assert_eq!(shape_of("2 * 3 ^ 2"), "(2 * (3 ^ 2))");
}

#[test]
fn test_parse_factorial_binds_tightest() {
    assert_eq!(shape_of("3!"), "(3!)");
    assert_eq!(shape_of("2 ^ 3!"), "(2 ^ (3!))");
    assert_eq!(shape_of("-3!"), "(-(3!))");
}

#[test]
fn test_parse_comparison_and_logic() {
    assert_eq!(shape_of("1 + 1 == 2"), "((1 + 1) == 2)");
    assert_eq!(shape_of("a < b and c >= d or e"), "(((a < b) and (c >= d)) or e)");
    assert_eq!(shape_of("not a and b"), "((not a) and b)");
    assert_eq!(shape_of("1 != 2"), "(1 != 2)");
}

#[test]
fn test_parse_conditional_is_right_associative() {
    assert_eq!(shape_of("a ? 1 : b ? 2 : 3"), "(a ? 1 : (b ? 2 : 3))");
    assert_eq!(shape_of("a > 1 ? x + 1 : y"), "((a > 1) ? (x + 1) : y)");
}

#[test]
fn test_parse_unary_plus() {
    assert_eq!(shape_of("+ 4"), "(+4)");
    assert_eq!(shape_of("1 - -2"), "(1 - (-2))");
}

// ============================================
// Spans
// ============================================

#[test]
fn test_binary_span_covers_both_operands() {
    let expr = parse_ok("  12 + 345 ");
    assert_eq!(expr.span, Span::new(2, 10));
}

#[test]
fn test_operator_kinds() {
    let expr = parse_ok("a % b");
    assert!(matches!(expr.node, Expr::Binary { op: BinOp::Mod, .. }));
}

// ============================================
// Errors
// ============================================

#[test]
fn test_parse_errors() {
    assert!(parse_fails(""));
    assert!(parse_fails("1 +"));
    assert!(parse_fails("(1 + 2"));
    assert!(parse_fails("1 2"));
    assert!(parse_fails("a ? b"));
    assert!(parse_fails("* 3"));
}

#[test]
fn test_unexpected_end_message() {
    let err = parse_expr("1 +").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert!(err.to_string().starts_with("Unexpected end of expression"));
    assert_eq!(err.span(), Some(Span::point(3)));
}

#[test]
fn test_unexpected_token_message() {
    let err = parse_expr("1 + )").unwrap_err();
    assert!(err.to_string().starts_with("Unexpected `)`"), "{err}");
    assert_eq!(err.span(), Some(Span::new(4, 5)));
}

#[test]
fn test_unexpected_character() {
    let err = parse_expr("1 # 2").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert_eq!(err.span(), Some(Span::new(2, 3)));
}
