//! Lexer implementation using logos

mod token;

pub use token::Token;

use crate::ast::Span;
use crate::error::{ExprError, Result};
use logos::Logos;

/// Tokenize (rewritten) expression source
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span::new(lexer.span().start, lexer.span().end);
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(_) => {
                return Err(ExprError::parse(
                    format!("Unexpected character {:?}", lexer.slice()),
                    span,
                ));
            }
        }
    }

    Ok(tokens)
}
