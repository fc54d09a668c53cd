// Copyright 2026 Hypermesh Foundation. All rights reserved.
// LBP Simulation Engine

pub mod types;
pub mod error;
pub mod constants;
pub mod params;
pub mod price;
pub mod pipeline;
pub mod simulation;
pub mod stages;
pub mod ethereum;
pub mod lbp;
pub mod model;
pub mod config;
pub mod datasource;
pub mod adapter;

pub use types::*;
pub use error::SimError;
pub use params::{ParameterSet, Parameters};
pub use pipeline::{Block, Pipeline, Substep};
pub use simulation::{run, run_single, RunOutcome, Simulation};
#[cfg(not(target_arch = "wasm32"))]
pub use simulation::run_parallel;
pub use model::{lbp_pipeline, network_upgrade_pipeline, PipelineKind};
pub use config::ExperimentConfig;

use wasm_bindgen::prelude::*;

// ─── WASM Interface ──────────────────────────────────────────────────────────

/// Browser handle for a configured experiment.
#[wasm_bindgen]
pub struct LbpSimulation {
    inner: Simulation,
}

#[wasm_bindgen]
impl LbpSimulation {
    /// Build from a JSON experiment config; `"{}"` gives the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<LbpSimulation, JsValue> {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        let config = ExperimentConfig::from_json_str(config_json)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self { inner: config.into_simulation(StateVector::default()) })
    }

    /// Run every sweep combination and Monte Carlo run; one entry per run.
    pub fn run(&self) -> Result<JsValue, JsValue> {
        let outcomes = self.inner.run().map_err(|e| JsValue::from_str(&e.to_string()))?;
        serde_wasm_bindgen::to_value(&outcomes).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn timesteps(&self) -> u64 {
        self.inner.timesteps
    }

    pub fn set_timesteps(&mut self, timesteps: u64) {
        self.inner.timesteps = timesteps;
    }

    pub fn monte_carlo_runs(&self) -> u32 {
        self.inner.monte_carlo_runs
    }

    /// Number of sweep combinations the parameters expand to.
    pub fn sweep_len(&self) -> usize {
        self.inner.parameters.sweep_len()
    }

    /// Override the ETH price with a constant for every combination.
    pub fn set_eth_price(&mut self, usd: f64) {
        self.inner.parameters.eth_price_process = vec![price::PriceProcess::Constant(usd)];
    }

    /// Replace the weight ramp with a single start/end pair.
    pub fn set_weight_ramp(&mut self, start: f64, end: f64) -> Result<(), JsValue> {
        let start = adapter::weight_from_f64("weight_x_start", start)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let end = adapter::weight_from_f64("weight_x_end", end)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.inner.parameters.weight_x_start = vec![start];
        self.inner.parameters.weight_x_end = vec![end];
        Ok(())
    }
}
