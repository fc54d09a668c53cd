// Monte Carlo Infrastructure — N runs per sweep combination with statistical aggregation
// Runs are indexed 0..N-1; stochastic price processes derive their paths from
// the base seed and the run index

use std::path::Path;
use std::time::Instant;

use lbp_engine::adapter::from_decimal;
use lbp_engine::datasource::{initial_state, StaticSource};
use lbp_engine::params::{ParameterSet, Parameters};
use lbp_engine::{simulation, ExperimentConfig, PipelineKind, RunOutcome, Stage, StateVector};
use tracing::{debug, warn};

use crate::report::*;
use crate::scenarios::{PassCriteria, Scenario};
use crate::time_series::TimeSeriesRecorder;

/// One scenario, resolved against the CLI options.
pub struct Experiment<'a> {
    pub name: &'a str,
    pub label: &'a str,
    pub category: &'a str,
    pub timesteps: u64,
    pub runs: u32,
    pub pipeline: PipelineKind,
    pub parameters: Parameters,
    pub criteria: &'a PassCriteria,
}

impl<'a> Experiment<'a> {
    pub fn from_scenario(scenario: &'a Scenario, runs: u32, seed: u64, timesteps: Option<u64>) -> Self {
        Self {
            name: scenario.name,
            label: scenario.label,
            category: scenario.category,
            timesteps: timesteps.unwrap_or(scenario.timesteps),
            runs,
            pipeline: scenario.pipeline,
            parameters: (scenario.parameters)(seed),
            criteria: &scenario.criteria,
        }
    }

    pub fn from_config(config: ExperimentConfig, criteria: &'a PassCriteria) -> Self {
        Self {
            name: "CUSTOM",
            label: "Experiment from config file",
            category: "config",
            timesteps: config.timesteps,
            runs: config.monte_carlo_runs,
            pipeline: config.pipeline,
            parameters: config.parameters,
            criteria,
        }
    }
}

/// Run every (sweep × Monte Carlo run) of an experiment and aggregate.
pub fn run_monte_carlo(
    experiment: &Experiment<'_>,
    parallel: bool,
    time_series_base: Option<&Path>,
) -> MonteCarloReport {
    let start = Instant::now();
    let source = StaticSource::new();
    let initial = initial_state(&source, &source);
    let pipeline = experiment.pipeline.build();

    let outcomes = if parallel {
        simulation::run_parallel(&experiment.parameters, &initial, experiment.timesteps, experiment.runs, &pipeline)
    } else {
        simulation::run(&experiment.parameters, &initial, experiment.timesteps, experiment.runs, &pipeline)
    };
    let elapsed_ms = start.elapsed().as_secs_f64() * 1_000.0;

    let outcomes = match outcomes {
        Ok(outcomes) => outcomes,
        Err(e) => {
            warn!(scenario = experiment.name, error = %e, "Scenario could not start");
            return aggregate(experiment, 0, Vec::new(), elapsed_ms, Some(e.to_string()));
        }
    };
    // run() succeeded, so the sweep expands
    let sets = experiment.parameters.sweep().unwrap_or_default();

    if let Some(base) = time_series_base {
        let dir = base.join(experiment.name.to_lowercase());
        for outcome in &outcomes {
            if let Some(history) = outcome.history() {
                let recorder = TimeSeriesRecorder::from_history(history);
                let path = dir.join(format!("sweep-{}-run-{}.jsonl", outcome.sweep, outcome.run));
                match recorder.write_jsonl(&path) {
                    Ok(()) => debug!(path = %path.display(), records = recorder.len(), "Time series written"),
                    Err(e) => eprintln!("  Warning: failed to write time series: {}", e),
                }
            }
        }
    }

    let results = outcomes
        .iter()
        .filter_map(|o| sets.get(o.sweep).map(|set| evaluate(experiment, set, o)))
        .collect();
    aggregate(experiment, sets.len(), results, elapsed_ms, None)
}

/// Score one run against the scenario's pass criteria.
fn evaluate(experiment: &Experiment<'_>, set: &ParameterSet, outcome: &RunOutcome) -> BenchResult {
    let target_weight_x = from_decimal(set.weight_x_end);
    let history: &[StateVector] = outcome.history().map(Vec::as_slice).unwrap_or(&[]);
    let last = history.last();

    let stage_monotonic = history
        .windows(2)
        .all(|w| w[0].stage == Stage::Uninitialized || w[1].stage >= w[0].stage);
    let weight_at_end = last.and_then(|s| s.weight_x) == Some(set.weight_x_end);
    let peak_y_usd_price = history
        .iter()
        .map(|s| s.lbp_y_usd_price)
        .fold(None, |acc: Option<f64>, p| Some(acc.map_or(p, |a| a.max(p))));
    let max_round_trip_error = history
        .iter()
        .filter(|s| s.lbp_price_y_in_x > 0.0)
        .map(|s| (s.lbp_price_y_in_x * s.lbp_price_x_in_y - 1.0).abs())
        .fold(0.0_f64, f64::max);

    let criteria = experiment.criteria;
    let mut pass = outcome.is_ok();
    if criteria.require_weight_at_end && !weight_at_end {
        pass = false;
    }
    if criteria.require_monotonic_stage && !stage_monotonic {
        pass = false;
    }
    if let Some(stage) = criteria.final_stage {
        if last.map(|s| s.stage) != Some(stage) {
            pass = false;
        }
    }
    if let Some((lo, hi)) = criteria.y_usd_price_band {
        match last.map(|s| s.lbp_y_usd_price) {
            Some(p) if p >= lo && p <= hi => {}
            _ => pass = false,
        }
    }

    BenchResult {
        scenario: experiment.name.to_string(),
        sweep: outcome.sweep,
        run: outcome.run,
        pass,
        error: outcome.result.as_ref().err().map(ToString::to_string),
        records: history.len(),
        final_stage: last.map(|s| s.stage.to_string()),
        final_weight_x: last.and_then(|s| s.weight_x).map(from_decimal),
        target_weight_x,
        weight_at_end,
        stage_monotonic,
        final_eth_price: last.map(|s| s.eth_price),
        final_y_in_x: last.map(|s| s.lbp_price_y_in_x),
        final_y_usd_price: last.map(|s| s.lbp_y_usd_price),
        peak_y_usd_price,
        max_round_trip_error,
    }
}

/// Aggregate individual runs into a MonteCarloReport.
fn aggregate(
    experiment: &Experiment<'_>,
    n_sweeps: usize,
    results: Vec<BenchResult>,
    elapsed_ms: f64,
    error: Option<String>,
) -> MonteCarloReport {
    let n = results.len();
    let passed = results.iter().filter(|r| r.pass).count();
    let failed_runs = results.iter().filter(|r| r.error.is_some()).count();
    let pass_rate = if n > 0 { passed as f64 / n as f64 } else { 0.0 };

    MonteCarloReport {
        scenario_name: experiment.name.to_string(),
        label: experiment.label.to_string(),
        category: experiment.category.to_string(),
        n_sweeps,
        n_runs: n,
        failed_runs,
        pass_rate,
        final_y_usd_price: Stats::over(&results, |r| r.final_y_usd_price),
        peak_y_usd_price: Stats::over(&results, |r| r.peak_y_usd_price),
        final_weight_x: Stats::over(&results, |r| r.final_weight_x),
        final_eth_price: Stats::over(&results, |r| r.final_eth_price),
        elapsed_ms,
        error,
        individual_runs: results,
    }
}
