//! Program execution
//!
//! A run is one synchronous pass: validate, evaluate every step in order,
//! then evaluate every output. A failing step aborts the run; a failing
//! output is recorded and the remaining outputs still run.

use super::{OutputValue, Program, ProgramOutput};
use crate::config::EngineConfig;
use crate::error::{ExprError, RunError};
use crate::expression::{Compiled, Scope, evaluate_tree};
use crate::template::is_identifier;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Where a run is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Validating,
    Evaluating(usize),
    Done,
}

/// One output's outcome; exactly one of `value` and `error` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputResult {
    pub output_name: String,
    pub value: Option<f64>,
    pub error: Option<String>,
}

impl OutputResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// A step's value, or `None` when its expression was blank and skipped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepTrace {
    pub name: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunTrace {
    pub steps: Vec<StepTrace>,
    /// Inputs followed by step results, in binding order
    pub scope: Scope,
    pub outputs: Vec<OutputResult>,
}

/// Run with the default engine configuration
pub fn run_program(program: &Program) -> Result<Vec<OutputResult>, RunError> {
    run_program_with(program, &EngineConfig::default())
}

pub fn run_program_with(program: &Program, config: &EngineConfig) -> Result<Vec<OutputResult>, RunError> {
    run_program_traced(program, config).map(|trace| trace.outputs)
}

/// Run and keep every intermediate value
pub fn run_program_traced(program: &Program, config: &EngineConfig) -> Result<RunTrace, RunError> {
    Runner::new(program, config).run()
}

struct Runner<'p> {
    program: &'p Program,
    config: &'p EngineConfig,
    state: RunState,
    scope: Scope,
}

impl<'p> Runner<'p> {
    fn new(program: &'p Program, config: &'p EngineConfig) -> Self {
        Runner {
            program,
            config,
            state: RunState::Validating,
            scope: Scope::new(),
        }
    }

    fn run(mut self) -> Result<RunTrace, RunError> {
        super::validate_program_with(self.program, self.config)?;

        for input in &self.program.inputs {
            if let Some(value) = input.initial_value() {
                self.scope.insert(input.name.clone(), value);
            }
        }

        let mut steps = Vec::with_capacity(self.program.steps.len());
        for index in 0..self.program.steps.len() {
            self.transition(RunState::Evaluating(index));
            steps.push(self.evaluate_step(index)?);
        }

        let outputs: Vec<OutputResult> = self
            .program
            .outputs
            .iter()
            .map(|output| self.evaluate_output(output))
            .collect();

        self.transition(RunState::Done);
        let failed = outputs.iter().filter(|o| !o.is_ok()).count();
        info!("Program run complete: {} output(s), {} failed", outputs.len(), failed);

        Ok(RunTrace {
            steps,
            scope: self.scope,
            outputs,
        })
    }

    fn transition(&mut self, next: RunState) {
        debug!("Run state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn evaluate_step(&mut self, index: usize) -> Result<StepTrace, RunError> {
        let step = &self.program.steps[index];
        let fail = |source: ExprError| RunError::Step {
            index,
            name: step.name.clone(),
            source,
        };
        let expression = step
            .expression
            .as_ref()
            .ok_or_else(|| fail(ExprError::EmptySource))?;

        if expression.is_blank() {
            debug!("Step {} ({}) is blank, skipped", index, step.name);
            return Ok(StepTrace {
                name: step.name.clone(),
                value: None,
            });
        }

        let value = expression
            .compile(self.config)
            .and_then(|compiled| compiled.evaluate(&self.scope))
            .map_err(fail)?;
        debug!("Step {} ({}) = {}", index, step.name, value);
        self.scope.insert(step.name.clone(), value);

        Ok(StepTrace {
            name: step.name.clone(),
            value: Some(value),
        })
    }

    fn evaluate_output(&self, output: &ProgramOutput) -> OutputResult {
        let result = match &output.value {
            Some(value) => self.output_value(value),
            None => Err(ExprError::EmptySource),
        };
        match result {
            Ok(value) => {
                let value = output.value_type.normalize(value);
                debug!("Output {} = {}", output.name, value);
                OutputResult {
                    output_name: output.name.clone(),
                    value: Some(value),
                    error: None,
                }
            }
            Err(err) => {
                warn!("Output {} failed: {}", output.name, err);
                OutputResult {
                    output_name: output.name.clone(),
                    value: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    fn output_value(&self, value: &OutputValue) -> crate::error::Result<f64> {
        match value {
            OutputValue::Text(text) if is_identifier(text.trim()) => {
                let name = text.trim();
                self.scope
                    .get(name)
                    .copied()
                    .ok_or_else(|| ExprError::unbound(name, None))
            }
            OutputValue::Text(text) => Compiled::new(text, self.config)?.evaluate(&self.scope),
            OutputValue::Tree(tree) => evaluate_tree(tree, &self.scope, self.config),
        }
    }
}
