//! Error types and reporting

use crate::ast::Span;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ExprError>;

/// Failure to analyze or evaluate a single expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("{message}")]
    Parse { message: String, span: Span },

    #[error("Unknown symbol \"{name}\". Reference inputs as {{{{{name}}}}}.")]
    UnknownSymbol {
        name: String,
        span: Option<Span>,
        suggestion: Option<String>,
    },

    /// A `{{name}}` reference with no binding in the scope
    #[error("No value for {{{{{name}}}}} in scope")]
    Unbound {
        name: String,
        span: Option<Span>,
        suggestion: Option<String>,
    },

    #[error("Expressions must resolve to numeric values, not quoted text.")]
    NonNumericLiteral { span: Span },

    #[error("No expression")]
    EmptySource,

    #[error("Expression did not resolve to a finite number")]
    NonFiniteResult { value: f64 },

    #[error("Function {name} expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: String,
        got: usize,
        span: Span,
    },

    #[error("\"{name}\" is not a function")]
    NotCallable { name: String, span: Span },

    /// Malformed tree-syntax expression
    #[error("Invalid expression tree: {message}")]
    Tree { message: String },
}

/// The expression error taxonomy, without payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Parse,
    UnknownSymbol,
    NonNumericLiteral,
    EmptySource,
    NonFiniteResult,
    InvalidCall,
}

impl ExprError {
    pub fn parse(message: impl Into<String>, span: Span) -> Self {
        Self::Parse {
            message: message.into(),
            span,
        }
    }

    pub fn unknown_symbol(name: impl Into<String>, span: Option<Span>) -> Self {
        Self::UnknownSymbol {
            name: name.into(),
            span,
            suggestion: None,
        }
    }

    pub fn unbound(name: impl Into<String>, span: Option<Span>) -> Self {
        Self::Unbound {
            name: name.into(),
            span,
            suggestion: None,
        }
    }

    pub fn tree(message: impl Into<String>) -> Self {
        Self::Tree {
            message: message.into(),
        }
    }

    /// Attach a "did you mean" candidate to an unknown-symbol error
    pub fn with_suggestion(mut self, candidate: Option<&str>) -> Self {
        if let Self::UnknownSymbol { suggestion, .. } | Self::Unbound { suggestion, .. } = &mut self {
            *suggestion = candidate.map(str::to_string);
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse { .. } | Self::Tree { .. } => ErrorKind::Parse,
            Self::UnknownSymbol { .. } | Self::Unbound { .. } => ErrorKind::UnknownSymbol,
            Self::NonNumericLiteral { .. } => ErrorKind::NonNumericLiteral,
            Self::EmptySource => ErrorKind::EmptySource,
            Self::NonFiniteResult { .. } => ErrorKind::NonFiniteResult,
            Self::Arity { .. } | Self::NotCallable { .. } => ErrorKind::InvalidCall,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Parse { span, .. }
            | Self::NonNumericLiteral { span }
            | Self::Arity { span, .. }
            | Self::NotCallable { span, .. } => Some(*span),
            Self::UnknownSymbol { span, .. } | Self::Unbound { span, .. } => *span,
            Self::EmptySource | Self::NonFiniteResult { .. } | Self::Tree { .. } => None,
        }
    }

    /// Offending identifier, when the error is about one
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Self::UnknownSymbol { name, .. }
            | Self::Unbound { name, .. }
            | Self::Arity { name, .. }
            | Self::NotCallable { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::UnknownSymbol { suggestion, .. } | Self::Unbound { suggestion, .. } => suggestion.as_deref(),
            _ => None,
        }
    }

    /// Rewrite the span (if any) through `f`; used to map positions in
    /// rewritten source back to what the user typed
    pub(crate) fn map_span(mut self, f: impl Fn(Span) -> Span) -> Self {
        match &mut self {
            Self::Parse { span, .. }
            | Self::NonNumericLiteral { span }
            | Self::Arity { span, .. }
            | Self::NotCallable { span, .. } => *span = f(*span),
            Self::UnknownSymbol { span: Some(span), .. } | Self::Unbound { span: Some(span), .. } => *span = f(*span),
            _ => {}
        }
        self
    }
}

/// Program-level validation failure codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    NoSteps,
    InvalidInput,
    NoOutputs,
    StepExprMissing,
    UnresolvedOutputRef,
    DuplicateName,
    UnresolvedStepRef,
}

impl std::fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            Self::NoSteps => "NO_STEPS",
            Self::InvalidInput => "INVALID_INPUT",
            Self::NoOutputs => "NO_OUTPUTS",
            Self::StepExprMissing => "STEP_EXPR_MISSING",
            Self::UnresolvedOutputRef => "UNRESOLVED_OUTPUT_REF",
            Self::DuplicateName => "DUPLICATE_NAME",
            Self::UnresolvedStepRef => "UNRESOLVED_STEP_REF",
        };
        f.write_str(code)
    }
}

/// Structural problem with a Program, found before any evaluation
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ValidationError {
    pub code: ValidationCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl ValidationError {
    pub fn new(code: ValidationCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            index: None,
        }
    }

    pub fn at(code: ValidationCode, index: usize, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            index: Some(index),
        }
    }
}

/// Failure of a whole program run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Step {index} ({name}) failed: {source}")]
    Step {
        index: usize,
        name: String,
        #[source]
        source: ExprError,
    },
}

/// Report an expression error with ariadne
pub fn report_error(filename: &str, source: &str, error: &ExprError) -> std::io::Result<()> {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let kind = match error.kind() {
        ErrorKind::Parse => "Parse",
        ErrorKind::UnknownSymbol => "Unknown symbol",
        ErrorKind::NonNumericLiteral => "Literal",
        ErrorKind::EmptySource => "Empty expression",
        ErrorKind::NonFiniteResult => "Evaluation",
        ErrorKind::InvalidCall => "Call",
    };

    if let Some(span) = error.span() {
        let mut range: std::ops::Range<usize> = span.into();
        range.end = range.end.max(range.start + 1).min(source.len().max(1));
        let mut report = Report::build(ReportKind::Error, (filename, range.clone()))
            .with_message(format!("{kind} error"))
            .with_label(
                Label::new((filename, range))
                    .with_message(error.to_string())
                    .with_color(Color::Red),
            );
        if let Some(suggestion) = error.suggestion() {
            report = report.with_help(format!("did you mean `{{{{{suggestion}}}}}`?"));
        }
        report.finish().eprint((filename, Source::from(source)))
    } else {
        Report::build(ReportKind::Error, (filename, 0..0))
            .with_message(format!("{kind} error: {error}"))
            .finish()
            .eprint((filename, Source::from(source)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_symbol_message() {
        let err = ExprError::unknown_symbol("rate", None);
        insta::assert_snapshot!(err.to_string(), @r#"Unknown symbol "rate". Reference inputs as {{rate}}."#);
        assert_eq!(err.kind(), ErrorKind::UnknownSymbol);
        assert_eq!(err.symbol(), Some("rate"));
    }

    #[test]
    fn test_unbound_reference_message() {
        let err = ExprError::unbound("missing", None).with_suggestion(Some("mising"));
        insta::assert_snapshot!(err.to_string(), @"No value for {{missing}} in scope");
        assert_eq!(err.kind(), ErrorKind::UnknownSymbol);
        assert_eq!(err.symbol(), Some("missing"));
        assert_eq!(err.suggestion(), Some("mising"));
    }

    #[test]
    fn test_with_suggestion_only_touches_unknown_symbol() {
        let err = ExprError::unknown_symbol("sqr", None).with_suggestion(Some("sqrt"));
        assert_eq!(err.suggestion(), Some("sqrt"));

        let err = ExprError::EmptySource.with_suggestion(Some("sqrt"));
        assert_eq!(err.suggestion(), None);
    }

    #[test]
    fn test_map_span() {
        let err = ExprError::parse("bad", Span::new(2, 3)).map_span(|s| Span::new(s.start + 10, s.end + 10));
        assert_eq!(err.span(), Some(Span::new(12, 13)));
    }

    #[test]
    fn test_tree_errors_are_parse_kind() {
        assert_eq!(ExprError::tree("bad head").kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_validation_error_display_and_json() {
        let err = ValidationError::at(ValidationCode::UnresolvedOutputRef, 2, "output 2 references missing step");
        assert_eq!(err.to_string(), "UNRESOLVED_OUTPUT_REF: output 2 references missing step");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "UNRESOLVED_OUTPUT_REF");
        assert_eq!(json["index"], 2);
    }

    #[test]
    fn test_validation_error_without_index_omits_it() {
        let json = serde_json::to_value(ValidationError::new(ValidationCode::NoSteps, "x")).unwrap();
        assert!(json.get("index").is_none());
    }
}
