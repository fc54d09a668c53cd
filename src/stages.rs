// Copyright 2026 Hypermesh Foundation. All rights reserved.
// LBP Simulation Engine - Stage Machine

use chrono::NaiveDateTime;

use crate::error::SimError;
use crate::params::ParameterSet;
use crate::pipeline::Substep;
use crate::types::{Signal, Stage, StageMode, StateVector};

/// Stage after evaluating `current` at `timestamp`.
///
/// In `All` mode the stage walks Beacon Chain → EIP-1559 → Proof of Stake as
/// `timestamp` crosses the milestone dates and never moves backwards. A
/// `Single` mode pins its stage for the whole run.
pub fn next_stage(
    mode: StageMode,
    current: Stage,
    timestamp: NaiveDateTime,
    date_eip1559: NaiveDateTime,
    date_pos: NaiveDateTime,
) -> Result<Stage, SimError> {
    match mode {
        StageMode::Single(Stage::Uninitialized) => {
            Err(SimError::InvalidStage(Stage::Uninitialized.to_string()))
        }
        StageMode::Single(stage) => Ok(stage),
        StageMode::All => Ok(match current {
            Stage::Uninitialized | Stage::BeaconChain if timestamp < date_eip1559 => {
                Stage::BeaconChain
            }
            Stage::Uninitialized | Stage::BeaconChain | Stage::Eip1559 if timestamp < date_pos => {
                Stage::Eip1559
            }
            // not part of the upgrade sequence
            Stage::Lbp => Stage::Lbp,
            _ => Stage::ProofOfStake,
        }),
    }
}

/// Policy emitting the `stage` and `timestamp` signals.
///
/// The timestamp is derived from the previous record's timestep, so the
/// first timestep of a run reports `date_start`.
pub fn policy_upgrade_stages(
    params: &ParameterSet,
    _substep: &Substep<'_>,
    state: &StateVector,
) -> Result<Signal, SimError> {
    let timestamp = params.timestamp_at(state.timestep)?;
    let stage = next_stage(
        params.stage,
        state.stage,
        timestamp,
        params.date_eip1559,
        params.date_pos,
    )?;
    Ok(Signal::new()
        .with("stage", stage)
        .with("timestamp", Some(timestamp)))
}
