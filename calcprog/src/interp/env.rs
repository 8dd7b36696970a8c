//! Environment for variable bindings

use crate::template::{internal_name, original_name};
use indexmap::IndexMap;

/// Bindings keyed by internal (prefixed) variable name, in binding order
#[derive(Debug, Clone, Default)]
pub struct Environment {
    bindings: IndexMap<String, f64>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from user-facing `(name, value)` pairs, prefixing every key
    pub fn from_scope<'a>(scope: impl IntoIterator<Item = (&'a String, &'a f64)>) -> Self {
        Environment {
            bindings: scope
                .into_iter()
                .map(|(name, value)| (internal_name(name), *value))
                .collect(),
        }
    }

    /// Define a variable by its user-facing name
    pub fn define(&mut self, name: &str, value: f64) {
        self.bindings.insert(internal_name(name), value);
    }

    /// Look up by internal name
    pub fn get(&self, internal: &str) -> Option<f64> {
        self.bindings.get(internal).copied()
    }

    /// User-facing names of every binding in binding order, for suggestions
    pub fn names(&self) -> Vec<&str> {
        self.bindings.keys().filter_map(|k| original_name(k)).collect()
    }
}
