//! Expression AST nodes

use super::{Span, Spanned};

/// Expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal
    Number(f64),
    /// Quoted text literal; rejected before evaluation
    Str(String),

    /// Free identifier: a rewritten variable reference, a builtin
    /// constant, or a reserved name
    Symbol(String),

    /// Binary operation
    Binary {
        left: Box<Spanned<Expr>>,
        op: BinOp,
        right: Box<Spanned<Expr>>,
    },

    /// Unary operation (prefix `-`, `+`, `not`, postfix `!`)
    Unary {
        op: UnOp,
        expr: Box<Spanned<Expr>>,
    },

    /// Conditional: cond ? then_branch : else_branch
    Conditional {
        cond: Box<Spanned<Expr>>,
        then_branch: Box<Spanned<Expr>>,
        else_branch: Box<Spanned<Expr>>,
    },

    /// Builtin function call
    Call {
        func: Spanned<String>,
        args: Vec<Spanned<Expr>>,
    },
}

impl Expr {
    pub fn binary(left: Spanned<Expr>, op: BinOp, right: Spanned<Expr>) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnOp, expr: Spanned<Expr>) -> Self {
        Expr::Unary {
            op,
            expr: Box::new(expr),
        }
    }
}

/// Iterative teardown: rejected input may nest deeper than the call stack
impl Drop for Expr {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut child) = pending.pop() {
            child.node.detach_children(&mut pending);
        }
    }
}

impl Expr {
    fn detach_children(&mut self, pending: &mut Vec<Spanned<Expr>>) {
        match self {
            Expr::Number(_) | Expr::Str(_) | Expr::Symbol(_) => {}
            Expr::Binary { left, right, .. } => {
                detach(left, pending);
                detach(right, pending);
            }
            Expr::Unary { expr, .. } => detach(expr, pending),
            Expr::Conditional {
                cond,
                then_branch,
                else_branch,
            } => {
                detach(cond, pending);
                detach(then_branch, pending);
                detach(else_branch, pending);
            }
            Expr::Call { args, .. } => pending.append(args),
        }
    }
}

fn detach(slot: &mut Spanned<Expr>, pending: &mut Vec<Spanned<Expr>>) {
    pending.push(std::mem::replace(slot, Spanned::new(Expr::Number(0.0), Span::point(0))));
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,

    // Comparison, yields 1 or 0
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,

    // Logical, yields 1 or 0
    And,
    Or,
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinOp::Add => write!(f, "+"),
            BinOp::Sub => write!(f, "-"),
            BinOp::Mul => write!(f, "*"),
            BinOp::Div => write!(f, "/"),
            BinOp::Mod => write!(f, "%"),
            BinOp::Pow => write!(f, "^"),
            BinOp::Eq => write!(f, "=="),
            BinOp::Ne => write!(f, "!="),
            BinOp::Lt => write!(f, "<"),
            BinOp::Gt => write!(f, ">"),
            BinOp::Le => write!(f, "<="),
            BinOp::Ge => write!(f, ">="),
            BinOp::And => write!(f, "and"),
            BinOp::Or => write!(f, "or"),
        }
    }
}

/// Unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    /// Negation (-)
    Neg,
    /// Unary plus (+), numeric identity
    Plus,
    /// Logical not
    Not,
    /// Postfix factorial (!)
    Factorial,
}

impl std::fmt::Display for UnOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnOp::Neg => write!(f, "-"),
            UnOp::Plus => write!(f, "+"),
            UnOp::Not => write!(f, "not"),
            UnOp::Factorial => write!(f, "!"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropping_a_very_deep_chain() {
        let mut expr = Spanned::new(Expr::Number(1.0), Span::point(0));
        for _ in 0..200_000 {
            expr = Spanned::new(Expr::unary(UnOp::Neg, expr), Span::point(0));
        }
        drop(expr);
    }

    #[test]
    fn test_clone_survives_original_drop() {
        let original = Spanned::new(
            Expr::binary(
                Spanned::new(Expr::Number(1.0), Span::point(0)),
                BinOp::Add,
                Spanned::new(Expr::Symbol("a".to_string()), Span::point(0)),
            ),
            Span::point(0),
        );
        let copy = original.clone();
        drop(original);
        let Expr::Binary { right, .. } = &copy.node else {
            panic!("Expected Binary");
        };
        assert_eq!(right.node, Expr::Symbol("a".to_string()));
    }
}
