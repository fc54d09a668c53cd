// Benchmark Report Types
// Structured output for downstream analysis and plotting

use serde::Serialize;

// ─── Statistics (per-metric Monte Carlo aggregation) ────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self { mean: 0.0, std_dev: 0.0, ci_lower: 0.0, ci_upper: 0.0, min: 0.0, max: 0.0, n: 0 };
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        let std_dev = variance.sqrt();
        let half_width = 1.96 * std_dev / (n as f64).sqrt(); // 95% CI
        Self {
            mean,
            std_dev,
            ci_lower: mean - half_width,
            ci_upper: mean + half_width,
            min: samples.iter().cloned().fold(f64::INFINITY, f64::min),
            max: samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            n,
        }
    }

    /// Aggregate the metric `f` over the runs it is defined for.
    pub fn over<T>(items: &[T], f: impl Fn(&T) -> Option<f64>) -> Self {
        Self::from_samples(&items.iter().filter_map(f).collect::<Vec<_>>())
    }
}

// ─── Single-Run Result ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct BenchResult {
    pub scenario: String,
    pub sweep: usize,
    pub run: u32,
    pub pass: bool,
    /// Set when the engine aborted the run.
    pub error: Option<String>,
    pub records: usize,
    pub final_stage: Option<String>,
    pub final_weight_x: Option<f64>,
    pub target_weight_x: f64,
    pub weight_at_end: bool,
    pub stage_monotonic: bool,
    pub final_eth_price: Option<f64>,
    pub final_y_in_x: Option<f64>,
    pub final_y_usd_price: Option<f64>,
    pub peak_y_usd_price: Option<f64>,
    /// Largest `|p_y_in_x * p_x_in_y - 1|` over priced records.
    pub max_round_trip_error: f64,
}

// ─── Monte Carlo Report (per-scenario aggregation) ──────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloReport {
    pub scenario_name: String,
    pub label: String,
    pub category: String,
    pub n_sweeps: usize,
    pub n_runs: usize,
    pub failed_runs: usize,
    pub pass_rate: f64,
    pub final_y_usd_price: Stats,
    pub peak_y_usd_price: Stats,
    pub final_weight_x: Stats,
    pub final_eth_price: Stats,
    pub elapsed_ms: f64,
    /// Set when the scenario could not start (bad pipeline or sweep).
    pub error: Option<String>,
    pub individual_runs: Vec<BenchResult>,
}

// ─── Invariant Validation Summary ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct InvariantValidation {
    pub weight_ramp_lands_on_end: bool,
    pub stage_monotonic: bool,
    pub max_round_trip_error: f64,
}

impl InvariantValidation {
    pub fn all_pass(&self) -> bool {
        self.weight_ramp_lands_on_end && self.stage_monotonic && self.max_round_trip_error < 1e-9
    }
}

// ─── Top-Level Report ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BenchReport {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub n_runs_per_scenario: u32,
    pub parallel: bool,
    pub summary: Summary,
    pub validation: InvariantValidation,
    pub scenarios: Vec<MonteCarloReport>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
}
