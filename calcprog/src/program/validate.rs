//! Structural program validation
//!
//! Checks run in a fixed order and the first failure wins. Nothing here
//! evaluates an expression.

use super::Program;
use crate::config::EngineConfig;
use crate::error::{ValidationCode, ValidationError};
use crate::template::is_identifier;
use std::collections::{HashMap, HashSet};

pub fn validate_program(program: &Program) -> Result<(), ValidationError> {
    validate_program_with(program, &EngineConfig::default())
}

pub fn validate_program_with(program: &Program, config: &EngineConfig) -> Result<(), ValidationError> {
    check_steps_present(program)?;
    check_inputs(program)?;
    check_outputs_present(program)?;
    check_step_expressions(program)?;
    check_output_refs(program)?;
    check_unique_names(program)?;
    if config.strict_step_refs {
        check_step_refs(program)?;
    }
    Ok(())
}

fn check_steps_present(program: &Program) -> Result<(), ValidationError> {
    if program.steps.is_empty() {
        return Err(ValidationError::new(ValidationCode::NoSteps, "Program has no steps"));
    }
    Ok(())
}

fn check_inputs(program: &Program) -> Result<(), ValidationError> {
    for (index, input) in program.inputs.iter().enumerate() {
        if !is_identifier(&input.name) {
            let message = if input.name.is_empty() {
                format!("Input {index} has no name")
            } else {
                format!("Input {index} name \"{}\" is not a valid identifier", input.name)
            };
            return Err(ValidationError::at(ValidationCode::InvalidInput, index, message));
        }
        if input.default.is_none() {
            return Err(ValidationError::at(
                ValidationCode::InvalidInput,
                index,
                format!("Input \"{}\" has no default value", input.name),
            ));
        }
    }
    Ok(())
}

fn check_outputs_present(program: &Program) -> Result<(), ValidationError> {
    if program.outputs.is_empty() {
        return Err(ValidationError::new(ValidationCode::NoOutputs, "Program has no outputs"));
    }
    Ok(())
}

fn check_step_expressions(program: &Program) -> Result<(), ValidationError> {
    for (index, step) in program.steps.iter().enumerate() {
        if step.name.is_empty() {
            return Err(ValidationError::at(
                ValidationCode::StepExprMissing,
                index,
                format!("Step {index} has no name"),
            ));
        }
        if step.expression.is_none() {
            return Err(ValidationError::at(
                ValidationCode::StepExprMissing,
                index,
                format!("Step \"{}\" has no expression", step.name),
            ));
        }
    }
    Ok(())
}

fn check_output_refs(program: &Program) -> Result<(), ValidationError> {
    let step_names: HashSet<&str> = program.steps.iter().map(|s| s.name.as_str()).collect();
    for (index, output) in program.outputs.iter().enumerate() {
        let Some(value) = &output.value else {
            return Err(ValidationError::at(
                ValidationCode::UnresolvedOutputRef,
                index,
                format!("Output \"{}\" has no value", output.name),
            ));
        };
        if let Some(name) = value.step_ref() {
            if !step_names.contains(name) {
                return Err(ValidationError::at(
                    ValidationCode::UnresolvedOutputRef,
                    index,
                    format!("Output \"{}\" references unknown step \"{name}\"", output.name),
                ));
            }
        }
    }
    Ok(())
}

/// Input names unique; step names unique and disjoint from inputs
fn check_unique_names(program: &Program) -> Result<(), ValidationError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for (index, input) in program.inputs.iter().enumerate() {
        if !seen.insert(&input.name) {
            return Err(ValidationError::at(
                ValidationCode::DuplicateName,
                index,
                format!("Input name \"{}\" is used more than once", input.name),
            ));
        }
    }
    for (index, step) in program.steps.iter().enumerate() {
        if !seen.insert(&step.name) {
            return Err(ValidationError::at(
                ValidationCode::DuplicateName,
                index,
                format!("Step name \"{}\" is already used by an input or earlier step", step.name),
            ));
        }
    }
    Ok(())
}

/// Every step may only see inputs and earlier steps that produce a value
fn check_step_refs(program: &Program) -> Result<(), ValidationError> {
    #[derive(Clone, Copy)]
    enum Binding {
        Input,
        Step,
        BlankStep,
    }

    let mut visible: HashMap<&str, Binding> =
        program.inputs.iter().map(|input| (input.name.as_str(), Binding::Input)).collect();
    let declared: HashSet<&str> = program.steps.iter().map(|s| s.name.as_str()).collect();

    for (index, step) in program.steps.iter().enumerate() {
        let Some(expression) = &step.expression else {
            continue;
        };
        for name in expression.variables() {
            let problem = match visible.get(name.as_str()) {
                Some(Binding::Input | Binding::Step) => continue,
                Some(Binding::BlankStep) => format!("references \"{name}\", whose expression is empty"),
                None if name == step.name => format!("references itself as \"{name}\""),
                None if declared.contains(name.as_str()) => {
                    format!("references \"{name}\" before it is computed")
                }
                None => format!("references unknown name \"{name}\""),
            };
            return Err(ValidationError::at(
                ValidationCode::UnresolvedStepRef,
                index,
                format!("Step \"{}\" {problem}", step.name),
            ));
        }
        let binding = if expression.is_blank() { Binding::BlankStep } else { Binding::Step };
        visible.insert(&step.name, binding);
    }
    Ok(())
}
