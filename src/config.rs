// Copyright 2026 Hypermesh Foundation. All rights reserved.
// LBP Simulation Engine - Experiment Configuration

//! JSON experiment configuration.
//!
//! ```json
//! {
//!   "timesteps": 120,
//!   "monte_carlo_runs": 4,
//!   "pipeline": "lbp",
//!   "parameters": { "weight_x_end": [0.3, 0.5], "lbp_length": [48] }
//! }
//! ```
//!
//! Every key is optional. Omitted parameter fields keep their defaults.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MONTE_CARLO_RUNS, DEFAULT_TIMESTEPS};
use crate::error::SimError;
use crate::model::PipelineKind;
use crate::params::Parameters;
use crate::simulation::Simulation;
use crate::types::StateVector;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentConfig {
    pub timesteps: u64,
    pub monte_carlo_runs: u32,
    pub pipeline: PipelineKind,
    pub parameters: Parameters,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            timesteps: DEFAULT_TIMESTEPS,
            monte_carlo_runs: DEFAULT_MONTE_CARLO_RUNS,
            pipeline: PipelineKind::default(),
            parameters: Parameters::default(),
        }
    }
}

impl ExperimentConfig {
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SimError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| SimError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.monte_carlo_runs == 0 {
            return Err(SimError::Config("monte_carlo_runs must be at least 1".to_string()));
        }
        if self.parameters.sweep_len() == 0 {
            self.parameters.sweep()?;
        }
        Ok(())
    }

    /// Bundle with an initial state into a ready-to-run [`Simulation`].
    pub fn into_simulation(self, initial_state: StateVector) -> Simulation {
        Simulation::new(self.parameters, initial_state, self.pipeline.build())
            .with_timesteps(self.timesteps)
            .with_monte_carlo_runs(self.monte_carlo_runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Stage, StageMode};
    use rust_decimal_macros::dec;

    #[test]
    fn empty_object_uses_defaults() {
        let config = ExperimentConfig::from_json_str("{}").unwrap();
        assert_eq!(config.timesteps, 120);
        assert_eq!(config.monte_carlo_runs, 1);
        assert_eq!(config.pipeline, PipelineKind::Lbp);
        assert_eq!(config.parameters.stage, vec![StageMode::Single(Stage::Lbp)]);
    }

    #[test]
    fn overrides_are_applied() {
        let config = ExperimentConfig::from_json_str(
            r#"{
                "timesteps": 48,
                "monte_carlo_runs": 3,
                "pipeline": "network_upgrade",
                "parameters": {"stage": ["ALL"], "weight_x_end": [0.3, 0.5]}
            }"#,
        )
        .unwrap();
        assert_eq!(config.timesteps, 48);
        assert_eq!(config.pipeline, PipelineKind::NetworkUpgrade);
        assert_eq!(config.parameters.weight_x_end, vec![dec!(0.3), dec!(0.5)]);

        let sim = config.into_simulation(StateVector::default());
        assert_eq!(sim.monte_carlo_runs, 3);
        assert_eq!(sim.pipeline.len(), 2);
    }

    #[test]
    fn unknown_stage_is_a_config_error() {
        let err = ExperimentConfig::from_json_str(r#"{"parameters": {"stage": ["SHARDING"]}}"#)
            .unwrap_err();
        assert!(matches!(err, SimError::Config(ref msg) if msg.contains("SHARDING")));
    }

    #[test]
    fn empty_sweep_field_is_rejected() {
        let err = ExperimentConfig::from_json_str(r#"{"parameters": {"lbp_length": []}}"#)
            .unwrap_err();
        assert_eq!(err, SimError::EmptyParameter("lbp_length"));
    }

    #[test]
    fn zero_runs_and_unknown_keys_are_rejected() {
        assert!(ExperimentConfig::from_json_str(r#"{"monte_carlo_runs": 0}"#).is_err());
        assert!(ExperimentConfig::from_json_str(r#"{"timestep": 10}"#).is_err());
    }
}
