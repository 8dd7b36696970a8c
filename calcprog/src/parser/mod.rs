//! Parser implementation using lalrpop

use crate::ast::{Expr, Span, Spanned};
use crate::error::{ExprError, Result};
use crate::lexer::Token;
use lalrpop_util::ParseError;

#[cfg(test)]
mod tests;

lalrpop_util::lalrpop_mod!(
    #[allow(clippy::all)]
    grammar,
    "/parser/grammar.rs"
);

/// Parse tokens of a rewritten expression into an AST
pub fn parse(tokens: Vec<(Token, Span)>) -> Result<Spanned<Expr>> {
    let end = tokens.last().map(|(_, span)| span.end).unwrap_or(0);
    let token_iter = tokens
        .into_iter()
        .map(|(tok, span)| (span.start, tok, span.end));

    grammar::ExpressionParser::new()
        .parse(token_iter)
        .map_err(|e| {
            let (message, span) = describe(e, end);
            ExprError::parse(message, span)
        })
}

fn describe(error: ParseError<usize, Token, &'static str>, end: usize) -> (String, Span) {
    match error {
        ParseError::InvalidToken { location } => {
            ("Invalid token".to_string(), Span::new(location, location + 1))
        }
        ParseError::UnrecognizedEof { expected, .. } => (
            format!("Unexpected end of expression{}", expected_hint(&expected)),
            Span::point(end),
        ),
        ParseError::UnrecognizedToken {
            token: (start, tok, stop),
            expected,
        } => (
            format!("Unexpected `{tok}`{}", expected_hint(&expected)),
            Span::new(start, stop),
        ),
        ParseError::ExtraToken {
            token: (start, tok, stop),
        } => (format!("Unexpected `{tok}`"), Span::new(start, stop)),
        ParseError::User { error } => (error.to_string(), Span::point(0)),
    }
}

/// Terminal names come back quoted (`"\")\""`); strip them for display
fn expected_hint(expected: &[String]) -> String {
    if expected.is_empty() {
        return String::new();
    }
    let names: Vec<String> = expected
        .iter()
        .map(|name| match name.as_str() {
            "Number" => "a number".to_string(),
            "Ident" => "a name".to_string(),
            "Str" => "text".to_string(),
            quoted => format!("`{}`", quoted.trim_matches('"')),
        })
        .collect();
    format!(", expected {}", names.join(" or "))
}
