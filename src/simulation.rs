// Copyright 2026 Hypermesh Foundation. All rights reserved.
// LBP Simulation Engine - Resolution Engine

use serde::Serialize;
use tracing::{debug, error, info};

use crate::constants::{DEFAULT_MONTE_CARLO_RUNS, DEFAULT_TIMESTEPS};
use crate::error::SimError;
use crate::params::{ParameterSet, Parameters};
use crate::pipeline::{Block, Pipeline, Substep};
use crate::types::{History, Signal, StateVector, Variable};

/// Upper bound on history records reserved before a run starts.
const MAX_RESERVED_RECORDS: usize = 1 << 16;

// ─── RunOutcome ──────────────────────────────────────────────────────────────

/// Result of one (sweep combination, Monte Carlo run).
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub sweep: usize,
    pub run: u32,
    #[serde(serialize_with = "serialize_result")]
    pub result: Result<History, SimError>,
}

impl RunOutcome {
    pub fn history(&self) -> Option<&History> {
        self.result.as_ref().ok()
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Last emitted record, if the run succeeded.
    pub fn final_state(&self) -> Option<&StateVector> {
        self.history().and_then(|h| h.last())
    }
}

fn serialize_result<S>(result: &Result<History, SimError>, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    #[derive(Serialize)]
    #[serde(rename_all = "snake_case")]
    enum Repr<'a> {
        History(&'a History),
        Error(String),
    }
    match result {
        Ok(history) => Repr::History(history).serialize(s),
        Err(e) => Repr::Error(e.to_string()).serialize(s),
    }
}

// ─── Simulation ──────────────────────────────────────────────────────────────

/// Everything one experiment needs: parameters, initial state, pipeline and
/// the timestep / Monte Carlo run counts.
#[derive(Debug)]
pub struct Simulation {
    pub parameters: Parameters,
    pub initial_state: StateVector,
    pub pipeline: Pipeline,
    pub timesteps: u64,
    pub monte_carlo_runs: u32,
}

impl Simulation {
    pub fn new(parameters: Parameters, initial_state: StateVector, pipeline: Pipeline) -> Self {
        Self {
            parameters,
            initial_state,
            pipeline,
            timesteps: DEFAULT_TIMESTEPS,
            monte_carlo_runs: DEFAULT_MONTE_CARLO_RUNS,
        }
    }

    pub fn with_timesteps(mut self, timesteps: u64) -> Self {
        self.timesteps = timesteps;
        self
    }

    pub fn with_monte_carlo_runs(mut self, runs: u32) -> Self {
        self.monte_carlo_runs = runs;
        self
    }

    pub fn run(&self) -> Result<Vec<RunOutcome>, SimError> {
        run(
            &self.parameters,
            &self.initial_state,
            self.timesteps,
            self.monte_carlo_runs,
            &self.pipeline,
        )
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn run_parallel(&self) -> Result<Vec<RunOutcome>, SimError> {
        run_parallel(
            &self.parameters,
            &self.initial_state,
            self.timesteps,
            self.monte_carlo_runs,
            &self.pipeline,
        )
    }
}

// ─── Entry points ────────────────────────────────────────────────────────────

/// Execute every (sweep combination × Monte Carlo run) in order.
///
/// Fails up front if the pipeline or the parameter sweep is malformed.
/// Otherwise each run succeeds or fails on its own; a failed run emits no
/// history and does not affect the others.
pub fn run(
    parameters: &Parameters,
    initial_state: &StateVector,
    timesteps: u64,
    monte_carlo_runs: u32,
    pipeline: &Pipeline,
) -> Result<Vec<RunOutcome>, SimError> {
    let sets = prepare(parameters, timesteps, monte_carlo_runs, pipeline)?;
    Ok(jobs(sets.len(), monte_carlo_runs)
        .map(|(sweep, run)| execute(&sets[sweep], initial_state, timesteps, pipeline, sweep, run))
        .collect())
}

/// Same as [`run`], with runs spread over the rayon thread pool.
///
/// Runs share no mutable state, so the output is identical to [`run`]
/// provided the price process is pure.
#[cfg(not(target_arch = "wasm32"))]
pub fn run_parallel(
    parameters: &Parameters,
    initial_state: &StateVector,
    timesteps: u64,
    monte_carlo_runs: u32,
    pipeline: &Pipeline,
) -> Result<Vec<RunOutcome>, SimError> {
    use rayon::prelude::*;

    let sets = prepare(parameters, timesteps, monte_carlo_runs, pipeline)?;
    let jobs: Vec<(usize, u32)> = jobs(sets.len(), monte_carlo_runs).collect();
    Ok(jobs
        .into_par_iter()
        .map(|(sweep, run)| execute(&sets[sweep], initial_state, timesteps, pipeline, sweep, run))
        .collect())
}

fn prepare(
    parameters: &Parameters,
    timesteps: u64,
    monte_carlo_runs: u32,
    pipeline: &Pipeline,
) -> Result<Vec<ParameterSet>, SimError> {
    pipeline.validate()?;
    let sets = parameters.sweep()?;
    info!(
        sweeps = sets.len(),
        monte_carlo_runs,
        timesteps,
        blocks = pipeline.len(),
        "Starting simulation"
    );
    Ok(sets)
}

fn jobs(sweeps: usize, monte_carlo_runs: u32) -> impl Iterator<Item = (usize, u32)> {
    (0..sweeps).flat_map(move |sweep| (0..monte_carlo_runs).map(move |run| (sweep, run)))
}

fn execute(
    params: &ParameterSet,
    initial_state: &StateVector,
    timesteps: u64,
    pipeline: &Pipeline,
    sweep: usize,
    run: u32,
) -> RunOutcome {
    let result = run_single(params, initial_state, pipeline, run, timesteps);
    match &result {
        Ok(history) => debug!(sweep, run, records = history.len(), "Run complete"),
        Err(e) => error!(sweep, run, error = %e, "Run failed"),
    }
    RunOutcome { sweep, run, result }
}

// ─── Run / timestep / block ──────────────────────────────────────────────────

/// Execute one Monte Carlo run of one sweep combination.
///
/// The returned history starts with the initial state (timestep 0) and holds
/// one record per executed timestep.
pub fn run_single(
    params: &ParameterSet,
    initial_state: &StateVector,
    pipeline: &Pipeline,
    run: u32,
    timesteps: u64,
) -> Result<History, SimError> {
    params.validate()?;

    let mut current = StateVector { run, timestep: 0, substep: 0, ..initial_state.clone() };
    let reserved = usize::try_from(timesteps).unwrap_or(usize::MAX).min(MAX_RESERVED_RECORDS);
    let mut history = Vec::with_capacity(reserved + 1);
    history.push(current.clone());

    for timestep in 1..=timesteps {
        current = execute_timestep(params, pipeline, &current, timestep, &history)?;
        history.push(current.clone());
    }
    Ok(history)
}

/// Run every block in order; each block sees the state produced by the
/// blocks before it in the same timestep.
///
/// Policies read `previous.timestep` (still `timestep - 1` while the blocks
/// run), so the first timestep samples elapsed time zero.
pub fn execute_timestep(
    params: &ParameterSet,
    pipeline: &Pipeline,
    previous: &StateVector,
    timestep: u64,
    history: &[StateVector],
) -> Result<StateVector, SimError> {
    let mut state = previous.clone();
    for (i, block) in pipeline.blocks().iter().enumerate() {
        let substep = Substep { run: previous.run, timestep, index: i + 1, history };
        state = execute_block(params, block, &substep, &state)
            .map_err(|e| e.in_block(&block.description))?;
    }
    state.timestep = timestep;
    Ok(state)
}

/// Evaluate one block against `state` and return the updated state.
///
/// All update functions read the same input state and signal; their results
/// are applied together once every function has returned. Each function must
/// return the variable it was declared for.
pub fn execute_block(
    params: &ParameterSet,
    block: &Block,
    substep: &Substep<'_>,
    state: &StateVector,
) -> Result<StateVector, SimError> {
    let mut signal = Signal::new();
    for (_, policy) in &block.policies {
        signal.merge(policy(params, substep, state)?)?;
    }

    let mut next = state.clone();
    for (declared, update) in &block.variables {
        let (name, value) = update(params, substep, state, &signal)?;
        let variable: Variable = name.parse()?;
        if name != *declared {
            return Err(SimError::Config(format!(
                "update declared for `{}` returned `{}`",
                declared, name
            )));
        }
        next.set(variable, value)?;
    }
    next.substep = substep.index;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::update_from_signal;
    use crate::types::{Stage, Value};

    fn count_policy(
        _p: &ParameterSet,
        _s: &Substep<'_>,
        state: &StateVector,
    ) -> Result<Signal, SimError> {
        Ok(Signal::new().with("lbp_supply_x", state.lbp_supply_x + 1.0))
    }

    fn double_policy(
        _p: &ParameterSet,
        _s: &Substep<'_>,
        state: &StateVector,
    ) -> Result<Signal, SimError> {
        Ok(Signal::new().with("lbp_supply_y", state.lbp_supply_x * 2.0))
    }

    fn counting_pipeline() -> Pipeline {
        Pipeline::new()
            .block(
                Block::new("Count")
                    .policy("count", count_policy)
                    .variable("lbp_supply_x", update_from_signal("lbp_supply_x")),
            )
            .block(
                Block::new("Double")
                    .policy("double", double_policy)
                    .variable("lbp_supply_y", update_from_signal("lbp_supply_y")),
            )
    }

    #[test]
    fn later_blocks_see_earlier_updates() {
        let params = ParameterSet::default();
        let history =
            run_single(&params, &StateVector::default(), &counting_pipeline(), 0, 3).unwrap();

        assert_eq!(history.len(), 4);
        let last = &history[3];
        assert_eq!(last.lbp_supply_x, 3.0);
        // Double ran after Count in the same timestep
        assert_eq!(last.lbp_supply_y, 6.0);
        assert_eq!(last.timestep, 3);
        assert_eq!(last.substep, 2);
    }

    #[test]
    fn history_starts_with_initial_state() {
        let params = ParameterSet::default();
        let initial = StateVector { lbp_supply_x: 5.0, ..StateVector::default() };
        let history = run_single(&params, &initial, &counting_pipeline(), 4, 1).unwrap();
        assert_eq!(history[0].lbp_supply_x, 5.0);
        assert_eq!(history[0].run, 4);
        assert_eq!(history[0].timestep, 0);
        assert_eq!(history[1].run, 4);
    }

    #[test]
    fn signal_collision_aborts_run() {
        let pipeline = Pipeline::new().block(
            Block::new("Colliding")
                .policy("a", count_policy)
                .policy("b", count_policy)
                .variable("lbp_supply_x", update_from_signal("lbp_supply_x")),
        );
        let err = run_single(&ParameterSet::default(), &StateVector::default(), &pipeline, 0, 2)
            .unwrap_err();
        assert_eq!(
            err,
            SimError::SignalCollision {
                block: "Colliding".to_string(),
                key: "lbp_supply_x".to_string(),
            }
        );
    }

    #[test]
    fn unknown_returned_variable_aborts_run() {
        let pipeline = Pipeline::new().block(Block::new("Rogue").variable(
            "lbp_supply_x",
            |_p: &ParameterSet, _s: &Substep<'_>, _st: &StateVector, _sig: &Signal| {
                Ok(("eth_staked".to_string(), Value::Number(1.0)))
            },
        ));
        let err = run_single(&ParameterSet::default(), &StateVector::default(), &pipeline, 0, 1)
            .unwrap_err();
        assert_eq!(
            err,
            SimError::UnknownVariable {
                block: "Rogue".to_string(),
                variable: "eth_staked".to_string(),
            }
        );
    }

    #[test]
    fn update_must_return_its_declared_variable() {
        let pipeline = Pipeline::new().block(
            Block::new("Crossed supply")
                .policy("double", double_policy)
                .variable("lbp_supply_x", update_from_signal("lbp_supply_y"))
                .variable("lbp_supply_y", update_from_signal("lbp_supply_y")),
        );
        let err = run_single(&ParameterSet::default(), &StateVector::default(), &pipeline, 0, 1)
            .unwrap_err();
        assert_eq!(err.block(), Some("Crossed supply"));
        assert_eq!(
            err.root(),
            &SimError::Config("update declared for `lbp_supply_x` returned `lbp_supply_y`".to_string())
        );
    }

    #[test]
    fn block_errors_name_the_block() {
        let pipeline = Pipeline::new().block(Block::new("Mistyped stage").variable(
            "stage",
            |_p: &ParameterSet, _s: &Substep<'_>, _st: &StateVector, _sig: &Signal| {
                Ok(("stage".to_string(), Value::Number(1.0)))
            },
        ));
        let err = run_single(&ParameterSet::default(), &StateVector::default(), &pipeline, 0, 1)
            .unwrap_err();
        assert_eq!(err.block(), Some("Mistyped stage"));
        assert!(matches!(err.root(), SimError::TypeMismatch { variable: "stage", .. }));
    }

    #[test]
    fn stage_errors_inside_a_block_name_the_block() {
        let params = ParameterSet {
            stage: crate::types::StageMode::Single(Stage::Uninitialized),
            ..ParameterSet::default()
        };
        let pipeline = crate::model::network_upgrade_pipeline();
        let err = execute_timestep(&params, &pipeline, &StateVector::default(), 1, &[]).unwrap_err();
        assert_eq!(err.block(), Some("Update stages"));
        assert!(matches!(err.root(), SimError::InvalidStage(_)));
    }

    #[test]
    fn blocks_without_policies_get_empty_signal() {
        let pipeline = Pipeline::new().block(Block::new("Pin stage").variable(
            "stage",
            |_p: &ParameterSet, _s: &Substep<'_>, _st: &StateVector, sig: &Signal| {
                assert!(sig.is_empty());
                Ok(("stage".to_string(), Value::Stage(Stage::Lbp)))
            },
        ));
        let history =
            run_single(&ParameterSet::default(), &StateVector::default(), &pipeline, 0, 1).unwrap();
        assert_eq!(history[1].stage, Stage::Lbp);
    }

    #[test]
    fn run_covers_every_sweep_and_run() {
        let params = Parameters {
            lbp_length: vec![10, 20],
            ..Parameters::default()
        };
        let outcomes = run(&params, &StateVector::default(), 2, 3, &counting_pipeline()).unwrap();
        let keys: Vec<(usize, u32)> = outcomes.iter().map(|o| (o.sweep, o.run)).collect();
        assert_eq!(keys, vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);
        assert!(outcomes.iter().all(RunOutcome::is_ok));
    }

    #[test]
    fn invalid_combination_fails_only_its_runs() {
        let params = Parameters {
            lbp_length: vec![0, 10],
            ..Parameters::default()
        };
        let outcomes = run(&params, &StateVector::default(), 2, 1, &counting_pipeline()).unwrap();
        assert!(outcomes[0].result.is_err());
        assert!(outcomes[0].history().is_none());
        assert!(outcomes[1].is_ok());
    }

    #[test]
    fn invalid_pipeline_fails_before_any_run() {
        let pipeline =
            Pipeline::new().block(Block::new("Bad").variable("nope", update_from_signal("nope")));
        assert!(run(&Parameters::default(), &StateVector::default(), 1, 1, &pipeline).is_err());
    }

    #[test]
    fn zero_timesteps_emit_only_initial_state() {
        let history =
            run_single(&ParameterSet::default(), &StateVector::default(), &counting_pipeline(), 0, 0)
                .unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn huge_timestep_count_caps_reservation() {
        // Fails on the first timestep, so only the reservation is exercised
        let pipeline = Pipeline::new().block(Block::new("Stop").policy(
            "stop",
            |_p: &ParameterSet, _s: &Substep<'_>, _st: &StateVector| -> Result<Signal, SimError> {
                Err(SimError::Config("stop".to_string()))
            },
        ));
        let params = ParameterSet::default();
        let err = run_single(&params, &StateVector::default(), &pipeline, 0, u64::MAX).unwrap_err();
        assert_eq!(err.block(), Some("Stop"));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn parallel_matches_sequential() {
        let params = Parameters { lbp_length: vec![10, 20], ..Parameters::default() };
        let pipeline = counting_pipeline();
        let seq = run(&params, &StateVector::default(), 5, 4, &pipeline).unwrap();
        let par = run_parallel(&params, &StateVector::default(), 5, 4, &pipeline).unwrap();
        assert_eq!(seq.len(), par.len());
        for (a, b) in seq.iter().zip(&par) {
            assert_eq!((a.sweep, a.run), (b.sweep, b.run));
            assert_eq!(a.history(), b.history());
        }
    }
}
