// Copyright 2026 Hypermesh Foundation. All rights reserved.
// LBP Simulation Engine - System Parameters

//! System parameters and their sweep expansion.
//!
//! [`Parameters`] holds a list of candidate values per field. [`Parameters::sweep`]
//! expands it into the Cartesian product of concrete [`ParameterSet`]s, one
//! per sweep combination, each of which is read-only for the runs it drives.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::constants::{DELTA_TIME, EPOCHS_PER_DAY, ETH_PRICE_MEAN_FALLBACK};
use crate::error::SimError;
use crate::price::PriceProcess;
use crate::types::{Stage, StageMode};

/// Midnight on the given calendar day; fails for a day the calendar lacks.
pub fn date(year: i32, month: u32, day: u32) -> Result<NaiveDateTime, SimError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| SimError::InvalidParameter {
            field: "date",
            reason: format!("{}-{:02}-{:02} is not a calendar day", year, month, day),
        })
}

// Only for the hard-coded milestone defaults below.
fn milestone(year: i32, month: u32, day: u32) -> NaiveDateTime {
    date(year, month, day).unwrap_or_default()
}

// ─── Parameters (sweepable) ──────────────────────────────────────────────────

/// Sweepable system parameters. Every field must hold at least one candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Timestep size in epochs.
    pub dt: Vec<f64>,
    pub stage: Vec<StageMode>,
    pub date_start: Vec<NaiveDateTime>,
    /// EIP-1559 activation, used by `StageMode::All`.
    pub date_eip1559: Vec<NaiveDateTime>,
    /// Proof-of-Stake merge, used by `StageMode::All`.
    pub date_pos: Vec<NaiveDateTime>,
    pub eth_price_process: Vec<PriceProcess>,
    pub weight_x_start: Vec<Decimal>,
    pub weight_x_end: Vec<Decimal>,
    /// Ramp length in timesteps.
    pub lbp_length: Vec<u32>,
    pub lbp_initial_x: Vec<f64>,
    pub lbp_initial_y: Vec<f64>,
}

impl Default for Parameters {
    fn default() -> Self {
        let set = ParameterSet::default();
        Self {
            dt: vec![set.dt],
            stage: vec![set.stage],
            date_start: vec![set.date_start],
            date_eip1559: vec![set.date_eip1559],
            date_pos: vec![set.date_pos],
            eth_price_process: vec![set.eth_price_process],
            weight_x_start: vec![set.weight_x_start],
            weight_x_end: vec![set.weight_x_end],
            lbp_length: vec![set.lbp_length],
            lbp_initial_x: vec![set.lbp_initial_x],
            lbp_initial_y: vec![set.lbp_initial_y],
        }
    }
}

impl Parameters {
    /// Number of candidate values per field, in declaration order.
    fn dimensions(&self) -> [(&'static str, usize); 11] {
        [
            ("dt", self.dt.len()),
            ("stage", self.stage.len()),
            ("date_start", self.date_start.len()),
            ("date_eip1559", self.date_eip1559.len()),
            ("date_pos", self.date_pos.len()),
            ("eth_price_process", self.eth_price_process.len()),
            ("weight_x_start", self.weight_x_start.len()),
            ("weight_x_end", self.weight_x_end.len()),
            ("lbp_length", self.lbp_length.len()),
            ("lbp_initial_x", self.lbp_initial_x.len()),
            ("lbp_initial_y", self.lbp_initial_y.len()),
        ]
    }

    /// Number of sweep combinations (0 if any field is empty).
    pub fn sweep_len(&self) -> usize {
        self.dimensions().iter().map(|(_, n)| *n).product()
    }

    /// Expand into the Cartesian product of candidate values.
    ///
    /// Combinations are ordered with the last field varying fastest, so the
    /// sweep index of a combination is stable for a given `Parameters`.
    pub fn sweep(&self) -> Result<Vec<ParameterSet>, SimError> {
        let dims = self.dimensions();
        if let Some((field, _)) = dims.iter().find(|(_, n)| *n == 0) {
            return Err(SimError::EmptyParameter(field));
        }

        let total = self.sweep_len();
        let mut sets = Vec::with_capacity(total);
        for i in 0..total {
            let mut idx = [0usize; 11];
            let mut rem = i;
            for k in (0..dims.len()).rev() {
                idx[k] = rem % dims[k].1;
                rem /= dims[k].1;
            }
            sets.push(ParameterSet {
                dt: self.dt[idx[0]],
                stage: self.stage[idx[1]],
                date_start: self.date_start[idx[2]],
                date_eip1559: self.date_eip1559[idx[3]],
                date_pos: self.date_pos[idx[4]],
                eth_price_process: self.eth_price_process[idx[5]].clone(),
                weight_x_start: self.weight_x_start[idx[6]],
                weight_x_end: self.weight_x_end[idx[7]],
                lbp_length: self.lbp_length[idx[8]],
                lbp_initial_x: self.lbp_initial_x[idx[9]],
                lbp_initial_y: self.lbp_initial_y[idx[10]],
            });
        }
        Ok(sets)
    }
}

// ─── ParameterSet (one sweep combination) ────────────────────────────────────

/// One concrete combination of parameter values.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterSet {
    pub dt: f64,
    pub stage: StageMode,
    pub date_start: NaiveDateTime,
    pub date_eip1559: NaiveDateTime,
    pub date_pos: NaiveDateTime,
    pub eth_price_process: PriceProcess,
    pub weight_x_start: Decimal,
    pub weight_x_end: Decimal,
    pub lbp_length: u32,
    pub lbp_initial_x: f64,
    pub lbp_initial_y: f64,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            dt: DELTA_TIME,
            stage: StageMode::Single(Stage::Lbp),
            date_start: milestone(2021, 6, 1),
            date_eip1559: milestone(2021, 8, 4),
            date_pos: milestone(2021, 12, 1),
            eth_price_process: PriceProcess::Constant(ETH_PRICE_MEAN_FALLBACK),
            weight_x_start: dec!(0.95),
            weight_x_end: dec!(0.30),
            lbp_length: 100,
            lbp_initial_x: 100.0,
            lbp_initial_y: 10_000.0,
        }
    }
}

impl ParameterSet {
    /// Reject combinations no run could execute.
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(invalid("dt", format!("must be positive, got {}", self.dt)));
        }
        if self.stage == StageMode::Single(Stage::Uninitialized) {
            return Err(SimError::InvalidStage(Stage::Uninitialized.to_string()));
        }
        if self.date_pos < self.date_eip1559 {
            return Err(invalid("date_pos", "must not precede date_eip1559".to_string()));
        }
        for (field, w) in [
            ("weight_x_start", self.weight_x_start),
            ("weight_x_end", self.weight_x_end),
        ] {
            if w <= Decimal::ZERO || w >= Decimal::ONE {
                return Err(invalid(field, format!("must lie in (0, 1), got {}", w)));
            }
        }
        if self.lbp_length == 0 {
            return Err(invalid("lbp_length", "must be at least one timestep".to_string()));
        }
        for (field, reserve) in [
            ("lbp_initial_x", self.lbp_initial_x),
            ("lbp_initial_y", self.lbp_initial_y),
        ] {
            if !(reserve.is_finite() && reserve >= 0.0) {
                return Err(invalid(field, format!("must be non-negative, got {}", reserve)));
            }
        }
        Ok(())
    }

    /// Epochs elapsed after `timestep` timesteps.
    pub fn elapsed_epochs(&self, timestep: u64) -> f64 {
        timestep as f64 * self.dt
    }

    /// Calendar time after `timestep` timesteps.
    pub fn timestamp_at(&self, timestep: u64) -> Result<NaiveDateTime, SimError> {
        let days = self.elapsed_epochs(timestep) / EPOCHS_PER_DAY;
        let offset = Duration::microseconds((days * 86_400_000_000.0).round() as i64);
        self.date_start
            .checked_add_signed(offset)
            .ok_or_else(|| invalid("date_start", "simulated time out of range".to_string()))
    }
}

fn invalid(field: &'static str, reason: String) -> SimError {
    SimError::InvalidParameter { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_parameters_form_single_combination() {
        let sets = Parameters::default().sweep().unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].weight_x_start, dec!(0.95));
        assert_eq!(sets[0].weight_x_end, dec!(0.30));
        assert_eq!(sets[0].lbp_length, 100);
        assert!(sets[0].validate().is_ok());
    }

    #[test]
    fn sweep_is_cartesian_product() {
        let params = Parameters {
            weight_x_end: vec![dec!(0.3), dec!(0.5)],
            lbp_length: vec![50, 100, 200],
            ..Parameters::default()
        };
        let sets = params.sweep().unwrap();
        assert_eq!(sets.len(), 6);
        // last field varies fastest
        assert_eq!((sets[0].weight_x_end, sets[0].lbp_length), (dec!(0.3), 50));
        assert_eq!((sets[1].weight_x_end, sets[1].lbp_length), (dec!(0.3), 100));
        assert_eq!((sets[3].weight_x_end, sets[3].lbp_length), (dec!(0.5), 50));
        assert_eq!((sets[5].weight_x_end, sets[5].lbp_length), (dec!(0.5), 200));
    }

    #[test]
    fn empty_field_is_rejected() {
        let params = Parameters { lbp_initial_y: vec![], ..Parameters::default() };
        assert_eq!(params.sweep().unwrap_err(), SimError::EmptyParameter("lbp_initial_y"));
        assert_eq!(params.sweep_len(), 0);
    }

    #[test]
    fn validate_rejects_out_of_range_weights() {
        let set = ParameterSet { weight_x_end: dec!(1), ..ParameterSet::default() };
        assert!(matches!(
            set.validate(),
            Err(SimError::InvalidParameter { field: "weight_x_end", .. })
        ));
        let set = ParameterSet { weight_x_start: dec!(0), ..ParameterSet::default() };
        assert!(set.validate().is_err());
    }

    #[test]
    fn validate_rejects_uninitialized_stage_selection() {
        let set = ParameterSet {
            stage: StageMode::Single(Stage::Uninitialized),
            ..ParameterSet::default()
        };
        assert!(matches!(set.validate(), Err(SimError::InvalidStage(_))));
    }

    #[test]
    fn validate_rejects_zero_length_and_negative_reserves() {
        let set = ParameterSet { lbp_length: 0, ..ParameterSet::default() };
        assert!(set.validate().is_err());
        let set = ParameterSet { lbp_initial_x: -1.0, ..ParameterSet::default() };
        assert!(set.validate().is_err());
        let set = ParameterSet { dt: 0.0, ..ParameterSet::default() };
        assert!(set.validate().is_err());
    }

    #[test]
    fn impossible_calendar_day_is_rejected() {
        let err = date(2021, 2, 30).unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter { field: "date", .. }));
        assert!(date(2021, 13, 1).is_err());
        assert!(date(2024, 2, 29).is_ok());

        let set = ParameterSet::default();
        assert_eq!(set.date_start, date(2021, 6, 1).unwrap());
        assert_eq!(set.date_eip1559, date(2021, 8, 4).unwrap());
        assert_eq!(set.date_pos, date(2021, 12, 1).unwrap());
    }

    #[test]
    fn timestamp_advances_one_hour_per_default_timestep() {
        let set = ParameterSet::default();
        assert_eq!(set.timestamp_at(0).unwrap(), set.date_start);
        assert_eq!(set.timestamp_at(24).unwrap(), date(2021, 6, 2).unwrap());
        assert_eq!(
            set.timestamp_at(1).unwrap() - set.date_start,
            Duration::hours(1)
        );
    }

    #[test]
    fn parameters_deserialize_with_defaults() {
        let params: Parameters = serde_json::from_str(
            r#"{"stage": ["ALL"], "weight_x_end": [0.3, 0.4], "lbp_length": [24]}"#,
        )
        .unwrap();
        assert_eq!(params.stage, vec![StageMode::All]);
        assert_eq!(params.weight_x_end, vec![dec!(0.3), dec!(0.4)]);
        assert_eq!(params.lbp_initial_y, vec![10_000.0]);
        assert_eq!(params.sweep_len(), 2);
    }
}
