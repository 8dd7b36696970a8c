//! Pre-order traversal over expression trees

use super::{Expr, Spanned};
use std::ops::ControlFlow;

/// Visit `root` and every descendant in pre-order, stopping at the first
/// `Break`. Call nodes visit their callee name as part of the call node.
pub fn walk<B>(
    root: &Spanned<Expr>,
    visit: &mut impl FnMut(&Spanned<Expr>) -> ControlFlow<B>,
) -> ControlFlow<B> {
    stacker::maybe_grow(32 * 1024, 1024 * 1024, || {
        visit(root)?;
        match &root.node {
            Expr::Number(_) | Expr::Str(_) | Expr::Symbol(_) => ControlFlow::Continue(()),
            Expr::Binary { left, right, .. } => {
                walk(left, visit)?;
                walk(right, visit)
            }
            Expr::Unary { expr, .. } => walk(expr, visit),
            Expr::Conditional {
                cond,
                then_branch,
                else_branch,
            } => {
                walk(cond, visit)?;
                walk(then_branch, visit)?;
                walk(else_branch, visit)
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    walk(arg, visit)?;
                }
                ControlFlow::Continue(())
            }
        }
    })
}

/// Nesting depth of an expression tree; a lone literal has depth 1
pub fn depth(root: &Spanned<Expr>) -> usize {
    stacker::maybe_grow(32 * 1024, 1024 * 1024, || {
        1 + match &root.node {
            Expr::Number(_) | Expr::Str(_) | Expr::Symbol(_) => 0,
            Expr::Binary { left, right, .. } => depth(left).max(depth(right)),
            Expr::Unary { expr, .. } => depth(expr),
            Expr::Conditional {
                cond,
                then_branch,
                else_branch,
            } => depth(cond).max(depth(then_branch)).max(depth(else_branch)),
            Expr::Call { args, .. } => args.iter().map(depth).max().unwrap_or(0),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinOp, Span};

    fn num(n: f64) -> Spanned<Expr> {
        Spanned::new(Expr::Number(n), Span::point(0))
    }

    fn sym(name: &str) -> Spanned<Expr> {
        Spanned::new(Expr::Symbol(name.to_string()), Span::point(0))
    }

    #[test]
    fn test_walk_visits_in_pre_order() {
        let tree = Spanned::new(Expr::binary(sym("a"), BinOp::Add, sym("b")), Span::point(0));
        let mut seen = Vec::new();
        let _ = walk::<()>(&tree, &mut |node| {
            if let Expr::Symbol(name) = &node.node {
                seen.push(name.clone());
            }
            ControlFlow::Continue(())
        });
        assert_eq!(seen, vec!["a", "b"]);
    }

    #[test]
    fn test_walk_stops_at_first_break() {
        let tree = Spanned::new(Expr::binary(sym("a"), BinOp::Add, sym("b")), Span::point(0));
        let found = walk(&tree, &mut |node| match &node.node {
            Expr::Symbol(name) => ControlFlow::Break(name.clone()),
            _ => ControlFlow::Continue(()),
        });
        assert_eq!(found, ControlFlow::Break("a".to_string()));
    }

    #[test]
    fn test_depth() {
        assert_eq!(depth(&num(1.0)), 1);
        let nested = Spanned::new(Expr::binary(num(1.0), BinOp::Mul, num(2.0)), Span::point(0));
        assert_eq!(depth(&nested), 2);
    }
}
