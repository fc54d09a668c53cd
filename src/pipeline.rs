// Copyright 2026 Hypermesh Foundation. All rights reserved.
// LBP Simulation Engine - State Update Pipeline

//! Ordered blocks of policies and state-update functions.
//!
//! A [`Block`] groups named policies, whose outputs are merged into one
//! [`Signal`], with named update functions that each read that signal and
//! the block's input state and return `(variable_name, new_value)`.

use std::collections::HashSet;
use std::fmt;

use crate::error::SimError;
use crate::params::ParameterSet;
use crate::types::{Signal, StateVector, Value, Variable};

/// Position of a block execution within a run.
#[derive(Debug, Clone, Copy)]
pub struct Substep<'a> {
    pub run: u32,
    /// Timestep being computed (1-based).
    pub timestep: u64,
    /// Block index within the pipeline (1-based).
    pub index: usize,
    /// Records already emitted by this run, starting with the initial state.
    pub history: &'a [StateVector],
}

pub type PolicyFn = Box<
    dyn Fn(&ParameterSet, &Substep<'_>, &StateVector) -> Result<Signal, SimError> + Send + Sync,
>;

pub type UpdateFn = Box<
    dyn Fn(&ParameterSet, &Substep<'_>, &StateVector, &Signal) -> Result<(String, Value), SimError>
        + Send
        + Sync,
>;

// ─── Block ───────────────────────────────────────────────────────────────────

pub struct Block {
    pub description: String,
    pub policies: Vec<(String, PolicyFn)>,
    pub variables: Vec<(String, UpdateFn)>,
}

impl Block {
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            policies: Vec::new(),
            variables: Vec::new(),
        }
    }

    pub fn policy<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&ParameterSet, &Substep<'_>, &StateVector) -> Result<Signal, SimError>
            + Send
            + Sync
            + 'static,
    {
        self.policies.push((name.to_string(), Box::new(f)));
        self
    }

    pub fn variable<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&ParameterSet, &Substep<'_>, &StateVector, &Signal) -> Result<(String, Value), SimError>
            + Send
            + Sync
            + 'static,
    {
        self.variables.push((name.to_string(), Box::new(f)));
        self
    }

    /// Check declared names before any timestep runs.
    pub fn validate(&self) -> Result<(), SimError> {
        let mut seen = HashSet::new();
        for (name, _) in &self.policies {
            if !seen.insert(name.as_str()) {
                return Err(SimError::Config(format!(
                    "block `{}`: policy `{}` declared twice",
                    self.description, name
                )));
            }
        }

        let mut seen = HashSet::new();
        for (name, _) in &self.variables {
            name.parse::<Variable>()
                .map_err(|e| e.in_block(&self.description))?;
            if !seen.insert(name.as_str()) {
                return Err(SimError::Config(format!(
                    "block `{}`: variable `{}` updated twice",
                    self.description, name
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("description", &self.description)
            .field("policies", &self.policies.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("variables", &self.variables.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish()
    }
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Pipeline {
    blocks: Vec<Block>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn validate(&self) -> Result<(), SimError> {
        self.blocks.iter().try_for_each(Block::validate)
    }
}

/// Update function copying `key` from the block's signal into the state
/// variable of the same name.
pub fn update_from_signal(
    key: &str,
) -> impl Fn(&ParameterSet, &Substep<'_>, &StateVector, &Signal) -> Result<(String, Value), SimError>
       + Send
       + Sync
       + 'static {
    let key = key.to_string();
    move |_params: &ParameterSet, _substep: &Substep<'_>, _state: &StateVector, signal: &Signal| {
        let value = signal.get(&key).ok_or_else(|| SimError::MissingSignal {
            block: String::new(),
            key: key.clone(),
        })?;
        Ok((key.clone(), value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Stage;

    fn empty_policy(
        _p: &ParameterSet,
        _s: &Substep<'_>,
        _state: &StateVector,
    ) -> Result<Signal, SimError> {
        Ok(Signal::new())
    }

    #[test]
    fn update_from_signal_copies_value() {
        let update = update_from_signal("stage");
        let params = ParameterSet::default();
        let state = StateVector::default();
        let substep = Substep { run: 0, timestep: 1, index: 1, history: &[] };
        let signal = Signal::new().with("stage", Stage::Lbp);

        let (name, value) = update(&params, &substep, &state, &signal).unwrap();
        assert_eq!(name, "stage");
        assert_eq!(value, Value::Stage(Stage::Lbp));
    }

    #[test]
    fn update_from_signal_reports_missing_key() {
        let update = update_from_signal("weight_x");
        let params = ParameterSet::default();
        let state = StateVector::default();
        let substep = Substep { run: 0, timestep: 1, index: 1, history: &[] };

        let err = update(&params, &substep, &state, &Signal::new()).unwrap_err();
        assert!(matches!(err, SimError::MissingSignal { ref key, .. } if key == "weight_x"));
    }

    #[test]
    fn validate_rejects_unknown_variable() {
        let pipeline = Pipeline::new().block(
            Block::new("Validators")
                .policy("policy_validators", empty_policy)
                .variable("eth_staked", update_from_signal("eth_staked")),
        );
        let err = pipeline.validate().unwrap_err();
        assert_eq!(
            err,
            SimError::UnknownVariable {
                block: "Validators".to_string(),
                variable: "eth_staked".to_string(),
            }
        );
    }

    #[test]
    fn validate_rejects_duplicate_variable() {
        let block = Block::new("Twice")
            .variable("weight_x", update_from_signal("weight_x"))
            .variable("weight_x", update_from_signal("weight_x"));
        assert!(matches!(block.validate(), Err(SimError::Config(_))));
    }

    #[test]
    fn block_without_policies_or_variables_is_valid() {
        let pipeline = Pipeline::new()
            .block(Block::new("Signal only").policy("noop", empty_policy))
            .block(Block::new("Empty"));
        assert!(pipeline.validate().is_ok());
        assert_eq!(pipeline.len(), 2);
    }
}
