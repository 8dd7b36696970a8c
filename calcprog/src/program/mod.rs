//! Calculation programs: named inputs, ordered steps, named outputs
//!
//! A [`Program`] is built wholesale by an editor and never mutated while it
//! runs. [`validate_program`] checks its structure; [`run_program`]
//! evaluates steps in order, each one extending the scope seen by the
//! next, then evaluates every output against the final scope.

mod run;
mod validate;

pub use run::{OutputResult, RunState, RunTrace, StepTrace, run_program, run_program_traced, run_program_with};
pub use validate::{validate_program, validate_program_with};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::expression::{Compiled, StoredExpression};
use crate::template::is_identifier;
use crate::tree::TreeExpr;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Display group used when an input or output names none
pub const DEFAULT_GROUP: &str = "General";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Integer,
    Float,
    Boolean,
}

impl ValueType {
    /// Coerce a computed number to this type: integers round to nearest,
    /// booleans become 0 or 1
    pub fn normalize(self, value: f64) -> f64 {
        match self {
            ValueType::Integer => value.round(),
            ValueType::Float => value,
            ValueType::Boolean => {
                if value != 0.0 && !value.is_nan() {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Bool(bool),
    Number(f64),
}

impl DefaultValue {
    pub fn as_number(self) -> f64 {
        match self {
            DefaultValue::Bool(true) => 1.0,
            DefaultValue::Bool(false) => 0.0,
            DefaultValue::Number(n) => n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    /// Editor increment hint; never evaluated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default)]
    pub default: Option<DefaultValue>,
}

impl ProgramInput {
    pub fn new(name: impl Into<String>, value_type: ValueType, default: DefaultValue) -> Self {
        ProgramInput {
            name: name.into(),
            description: String::new(),
            value_type,
            group: None,
            units: None,
            step: None,
            default: Some(default),
        }
    }

    pub fn display_group(&self) -> &str {
        self.group.as_deref().unwrap_or(DEFAULT_GROUP)
    }

    /// The scope value this input starts a run with
    pub fn initial_value(&self) -> Option<f64> {
        self.default.map(DefaultValue::as_number)
    }

    /// The input as an editor writes it back: integer defaults truncated
    pub fn normalized(&self) -> Self {
        let default = match (self.value_type, self.default) {
            (ValueType::Integer, Some(DefaultValue::Number(n))) => Some(DefaultValue::Number(n.trunc())),
            (_, default) => default,
        };
        ProgramInput {
            default,
            ..self.clone()
        }
    }
}

/// A step's expression in either concrete syntax
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StepExpression {
    Stored(StoredExpression),
    Tree(TreeExpr),
}

/// Objects are stored expressions and anything else is a tree, so a bad
/// stored expression reports its own error instead of a tree error
impl<'de> Deserialize<'de> for StepExpression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if value.is_object() {
            StoredExpression::deserialize(value)
                .map(StepExpression::Stored)
                .map_err(serde::de::Error::custom)
        } else {
            TreeExpr::try_from(value)
                .map(StepExpression::Tree)
                .map_err(serde::de::Error::custom)
        }
    }
}

impl StepExpression {
    /// Blank text has no value yet; the runner skips it
    pub fn is_blank(&self) -> bool {
        match self {
            StepExpression::Stored(expr) => expr.is_blank(),
            StepExpression::Tree(_) => false,
        }
    }

    /// Sorted distinct variable names referenced
    pub fn variables(&self) -> Vec<String> {
        match self {
            StepExpression::Stored(expr) => crate::template::extract_variables(&expr.source),
            StepExpression::Tree(tree) => tree.variables(),
        }
    }

    pub fn compile(&self, config: &EngineConfig) -> Result<Compiled> {
        match self {
            StepExpression::Stored(expr) => Compiled::new(&expr.source, config),
            StepExpression::Tree(tree) => Compiled::from_tree(tree, config),
        }
    }
}

impl From<StoredExpression> for StepExpression {
    fn from(expr: StoredExpression) -> Self {
        StepExpression::Stored(expr)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramStep {
    #[serde(default, alias = "let")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "expr")]
    pub expression: Option<StepExpression>,
}

impl ProgramStep {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        ProgramStep {
            name: name.into(),
            description: String::new(),
            expression: Some(StoredExpression::new(source).into()),
        }
    }

    pub fn tree(name: impl Into<String>, tree: serde_json::Value) -> Self {
        ProgramStep {
            name: name.into(),
            description: String::new(),
            expression: Some(StepExpression::Tree(TreeExpr::new(tree))),
        }
    }
}

/// What an output shows: a step name, inline `{{name}}` text, or an
/// inline tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputValue {
    Text(String),
    Tree(TreeExpr),
}

impl OutputValue {
    /// The step this output names directly, if it is a plain reference
    pub fn step_ref(&self) -> Option<&str> {
        match self {
            OutputValue::Text(text) if is_identifier(text.trim()) => Some(text.trim()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramOutput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(rename = "type", default = "default_output_type")]
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default)]
    pub value: Option<OutputValue>,
}

fn default_output_type() -> ValueType {
    ValueType::Float
}

impl ProgramOutput {
    pub fn new(name: impl Into<String>, value_type: ValueType, value: impl Into<String>) -> Self {
        ProgramOutput {
            name: name.into(),
            description: String::new(),
            group: None,
            value_type,
            units: None,
            value: Some(OutputValue::Text(value.into())),
        }
    }

    pub fn display_group(&self) -> &str {
        self.group.as_deref().unwrap_or(DEFAULT_GROUP)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub inputs: Vec<ProgramInput>,
    #[serde(default)]
    pub steps: Vec<ProgramStep>,
    #[serde(default)]
    pub outputs: Vec<ProgramOutput>,
}

impl Program {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
