//! `{{name}}` variable templating
//!
//! User-facing expressions reference scope variables as `{{name}}`. Before
//! the arithmetic grammar sees the text, every reference is rewritten to a
//! plain identifier carrying [`VARIABLE_PREFIX`], which no builtin uses.
//! The rewrite remembers where each reference came from so diagnostics can
//! point at the user's own text.

use crate::ast::Span;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Prefix marking an identifier as a rewritten variable reference
pub const VARIABLE_PREFIX: &str = "__v_";

static VAR_DECORATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([a-zA-Z_][a-zA-Z0-9_]*)\}\}").expect("variable decoration pattern is valid")
});

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("identifier pattern is valid"));

/// Sorted, deduplicated variable names referenced as `{{name}}`.
///
/// Purely textual: succeeds on sources that would not parse.
pub fn extract_variables(source: &str) -> Vec<String> {
    VAR_DECORATION_RE
        .captures_iter(source)
        .map(|caps| caps[1].to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Whether `name` is a valid variable/step identifier
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name)
}

/// Internal identifier for a user variable name
pub fn internal_name(name: &str) -> String {
    format!("{VARIABLE_PREFIX}{name}")
}

/// User variable name behind an internal identifier, if it is one
pub fn original_name(internal: &str) -> Option<&str> {
    internal.strip_prefix(VARIABLE_PREFIX)
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// One `{{name}}` occurrence and where it landed in the rewritten text,
/// including any separating space after it
#[derive(Debug, Clone, PartialEq)]
struct Rewrite {
    original: Span,
    internal: Span,
}

/// Source text with variable references rewritten to internal identifiers
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    internal: String,
    rewrites: Vec<Rewrite>,
    variables: Vec<String>,
}

impl Template {
    pub fn rewrite(source: &str) -> Self {
        let mut internal = String::with_capacity(source.len());
        let mut rewrites = Vec::new();
        let mut variables: Vec<String> = Vec::new();
        let mut last = 0;

        for caps in VAR_DECORATION_RE.captures_iter(source) {
            let whole = caps.get(0).expect("group 0 always participates");
            let name = &caps[1];

            internal.push_str(&source[last..whole.start()]);
            // keep neighbouring identifier text from fusing with the rewrite
            if internal.chars().next_back().is_some_and(is_identifier_char) {
                internal.push(' ');
            }
            let start = internal.len();
            internal.push_str(VARIABLE_PREFIX);
            internal.push_str(name);
            if source[whole.end()..].chars().next().is_some_and(is_identifier_char) {
                internal.push(' ');
            }
            rewrites.push(Rewrite {
                original: Span::new(whole.start(), whole.end()),
                internal: Span::new(start, internal.len()),
            });

            if !variables.iter().any(|v| v == name) {
                variables.push(name.to_string());
            }
            last = whole.end();
        }
        internal.push_str(&source[last..]);

        Template {
            internal,
            rewrites,
            variables,
        }
    }

    /// The rewritten text handed to the lexer
    pub fn internal(&self) -> &str {
        &self.internal
    }

    /// Distinct variable names in first-appearance order
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Map a span in the rewritten text back to the user's source.
    /// A span touching part of a rewritten identifier widens to the whole
    /// `{{name}}`.
    pub fn to_original(&self, span: Span) -> Span {
        Span::new(self.map_start(span.start), self.map_end(span.end))
    }

    fn map_start(&self, pos: usize) -> usize {
        let mut mapped = pos;
        for rw in &self.rewrites {
            if pos < rw.internal.start {
                break;
            }
            if pos < rw.internal.end {
                return rw.original.start;
            }
            mapped = pos - rw.internal.end + rw.original.end;
        }
        mapped
    }

    fn map_end(&self, pos: usize) -> usize {
        let mut mapped = pos;
        for rw in &self.rewrites {
            if pos <= rw.internal.start {
                break;
            }
            if pos <= rw.internal.end {
                return rw.original.end;
            }
            mapped = pos - rw.internal.end + rw.original.end;
        }
        mapped
    }
}
