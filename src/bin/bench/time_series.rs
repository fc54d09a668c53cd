// Per-Timestep JSONL Time Series Recorder
// One JSON line per state record for independent analysis

use std::io::Write;

use lbp_engine::adapter::from_decimal;
use lbp_engine::StateVector;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StateSnapshot {
    pub run: u32,
    pub timestep: u64,
    pub stage: String,
    pub timestamp: Option<String>,
    pub eth_price: f64,
    pub weight_x: Option<f64>,
    pub lbp_supply_x: f64,
    pub lbp_supply_y: f64,
    pub lbp_price_y_in_x: f64,
    pub lbp_price_x_in_y: f64,
    pub lbp_y_usd_price: f64,
}

impl StateSnapshot {
    pub fn from_state(state: &StateVector) -> Self {
        Self {
            run: state.run,
            timestep: state.timestep,
            stage: state.stage.to_string(),
            timestamp: state.timestamp.map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string()),
            eth_price: state.eth_price,
            weight_x: state.weight_x.map(from_decimal),
            lbp_supply_x: state.lbp_supply_x,
            lbp_supply_y: state.lbp_supply_y,
            lbp_price_y_in_x: state.lbp_price_y_in_x,
            lbp_price_x_in_y: state.lbp_price_x_in_y,
            lbp_y_usd_price: state.lbp_y_usd_price,
        }
    }
}

/// Time series recorder that accumulates snapshots and writes JSONL
pub struct TimeSeriesRecorder {
    snapshots: Vec<StateSnapshot>,
}

impl TimeSeriesRecorder {
    pub fn new() -> Self {
        Self { snapshots: Vec::new() }
    }

    pub fn from_history(history: &[StateVector]) -> Self {
        let mut recorder = Self::new();
        for state in history {
            recorder.record(state);
        }
        recorder
    }

    pub fn record(&mut self, state: &StateVector) {
        self.snapshots.push(StateSnapshot::from_state(state));
    }

    /// Write all snapshots to a JSONL file
    pub fn write_jsonl(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        for snapshot in &self.snapshots {
            let line = serde_json::to_string(snapshot)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }
}
