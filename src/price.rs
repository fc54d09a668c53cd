// Copyright 2026 Hypermesh Foundation. All rights reserved.
// LBP Simulation Engine - ETH Price Processes

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::{DELTA_TIME, EPOCHS_PER_YEAR};

/// Environmental process returning the ETH spot price (USD) for a
/// `(run, elapsed_epochs)` pair.
///
/// Every variant is a pure function of its inputs, so runs sampling the same
/// process can execute on separate threads.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceProcess {
    Constant(f64),
    Gbm(GbmModel),
    #[serde(skip)]
    Custom(Arc<dyn Fn(u32, f64) -> f64 + Send + Sync>),
}

impl PriceProcess {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(u32, f64) -> f64 + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn sample(&self, run: u32, elapsed_epochs: f64) -> f64 {
        match self {
            Self::Constant(price) => *price,
            Self::Gbm(model) => model.sample(run, elapsed_epochs),
            Self::Custom(f) => f(run, elapsed_epochs),
        }
    }
}

impl fmt::Debug for PriceProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(price) => f.debug_tuple("Constant").field(price).finish(),
            Self::Gbm(model) => f.debug_tuple("Gbm").field(model).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

// ─── Geometric Brownian motion ───────────────────────────────────────────────

/// Seeded geometric Brownian motion.
///
/// `drift` and `volatility` are annualised. The path for a run is rebuilt
/// from its seed on every call, walking `elapsed_epochs / step_epochs`
/// increments, which keeps sampling free of shared state.
///
/// A call at step `n` costs `n` normal draws, so a run sampling once per
/// timestep over `T` timesteps costs `O(T²)` draws in total. At the default
/// one step per timestep, a 10 000 timestep run makes about 5·10⁷ draws.
/// For longer horizons raise `step_epochs` or wrap a precomputed path in
/// [`PriceProcess::Custom`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GbmModel {
    pub initial: f64,
    pub drift: f64,
    pub volatility: f64,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_step_epochs")]
    pub step_epochs: f64,
}

fn default_step_epochs() -> f64 {
    DELTA_TIME
}

impl GbmModel {
    pub fn new(initial: f64, drift: f64, volatility: f64, seed: u64) -> Self {
        Self { initial, drift, volatility, seed, step_epochs: DELTA_TIME }
    }

    fn steps(&self, elapsed_epochs: f64) -> u64 {
        if self.step_epochs <= 0.0 || elapsed_epochs <= 0.0 {
            return 0;
        }
        (elapsed_epochs / self.step_epochs).floor() as u64
    }

    fn step_years(&self) -> f64 {
        self.step_epochs / EPOCHS_PER_YEAR
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn sample(&self, run: u32, elapsed_epochs: f64) -> f64 {
        use rand::{Rng, SeedableRng};
        use rand_chacha::ChaCha8Rng;

        let steps = self.steps(elapsed_epochs);
        if steps == 0 {
            return self.initial;
        }
        let dt = self.step_years();
        let mean = (self.drift - 0.5 * self.volatility * self.volatility) * dt;
        let scale = self.volatility * dt.sqrt();

        let mut rng = ChaCha8Rng::seed_from_u64(run_seed(self.seed, run));
        let mut log_price = self.initial.ln();
        for _ in 0..steps {
            // Box-Muller; 1 - u keeps the log argument in (0, 1]
            let u1: f64 = 1.0 - rng.gen::<f64>();
            let u2: f64 = rng.gen::<f64>();
            let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
            log_price += mean + scale * z;
        }
        log_price.exp()
    }

    /// Without a native RNG the process degrades to its deterministic drift.
    #[cfg(target_arch = "wasm32")]
    pub fn sample(&self, _run: u32, elapsed_epochs: f64) -> f64 {
        let t = self.steps(elapsed_epochs) as f64 * self.step_years();
        self.initial * (self.drift * t).exp()
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn run_seed(seed: u64, run: u32) -> u64 {
    seed ^ (run as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_ignores_run_and_time() {
        let p = PriceProcess::Constant(1_800.0);
        assert_eq!(p.sample(0, 0.0), 1_800.0);
        assert_eq!(p.sample(7, 12_345.0), 1_800.0);
    }

    #[test]
    fn custom_receives_inputs() {
        let p = PriceProcess::custom(|run, epochs| 1_000.0 + run as f64 + epochs);
        assert_eq!(p.sample(2, 10.0), 1_012.0);
    }

    #[test]
    fn gbm_starts_at_initial_price() {
        let model = GbmModel::new(2_000.0, 0.1, 0.8, 42);
        assert_eq!(model.sample(0, 0.0), 2_000.0);
        assert_eq!(model.sample(3, DELTA_TIME * 0.5), 2_000.0);
    }

    #[test]
    fn gbm_is_deterministic_per_run() {
        let model = GbmModel::new(2_000.0, 0.0, 0.8, 42);
        let a = model.sample(1, DELTA_TIME * 50.0);
        let b = model.sample(1, DELTA_TIME * 50.0);
        assert_eq!(a.to_bits(), b.to_bits());
        assert!(a > 0.0);
    }

    #[test]
    fn gbm_runs_draw_different_paths() {
        let model = GbmModel::new(2_000.0, 0.0, 0.8, 42);
        let a = model.sample(0, DELTA_TIME * 50.0);
        let b = model.sample(1, DELTA_TIME * 50.0);
        assert_ne!(a, b);
    }

    #[test]
    fn gbm_without_volatility_stays_flat() {
        let model = GbmModel::new(2_000.0, 0.0, 0.5, 9);
        let zero_vol = GbmModel { volatility: 0.0, ..model };
        assert!((zero_vol.sample(0, DELTA_TIME * 24.0) - 2_000.0).abs() < 1e-9);
    }

    #[test]
    fn coarser_steps_hold_price_within_a_step() {
        let model = GbmModel::new(2_000.0, 0.1, 0.8, 5);
        let daily = GbmModel { step_epochs: DELTA_TIME * 24.0, ..model };
        let first = daily.sample(2, DELTA_TIME * 24.0);
        assert_eq!(daily.sample(2, DELTA_TIME * 47.0).to_bits(), first.to_bits());
        assert_ne!(daily.sample(2, DELTA_TIME * 48.0), first);
    }

    #[test]
    fn price_process_deserializes_from_json() {
        let p: PriceProcess = serde_json::from_str(r#"{"constant": 2500.0}"#).unwrap();
        assert_eq!(p.sample(0, 0.0), 2_500.0);

        let p: PriceProcess = serde_json::from_str(
            r#"{"gbm": {"initial": 2000.0, "drift": 0.0, "volatility": 0.0}}"#,
        )
        .unwrap();
        match p {
            PriceProcess::Gbm(model) => assert_eq!(model.step_epochs, DELTA_TIME),
            other => panic!("expected gbm, got {:?}", other),
        }
    }
}
