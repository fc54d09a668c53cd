// Scenario Definitions — LBP ramps, ETH price regimes, network-upgrade stages
// All scenario logic lives in parameter builders; the engine is untouched

use chrono::Duration;
use lbp_engine::params::{ParameterSet, Parameters};
use lbp_engine::price::{GbmModel, PriceProcess};
use lbp_engine::{PipelineKind, Stage, StageMode};
use rust_decimal_macros::dec;

// ─── Scenario Configuration ─────────────────────────────────────────────────

pub struct Scenario {
    pub name: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub timesteps: u64,
    pub pipeline: PipelineKind,
    /// Builds the sweepable parameters from the bench base seed.
    pub parameters: fn(u64) -> Parameters,
    pub criteria: PassCriteria,
}

pub struct PassCriteria {
    /// Final `weight_x` must equal the combination's `weight_x_end`.
    pub require_weight_at_end: bool,
    /// Stages observed over the run must never move backwards.
    pub require_monotonic_stage: bool,
    pub final_stage: Option<Stage>,
    /// Final Y price (USD) must fall within this band.
    pub y_usd_price_band: Option<(f64, f64)>,
}

impl Default for PassCriteria {
    fn default() -> Self {
        Self {
            require_weight_at_end: false,
            require_monotonic_stage: false,
            final_stage: None,
            y_usd_price_band: None,
        }
    }
}

// ─── Parameter Builders ─────────────────────────────────────────────────────

fn lbp_default(_seed: u64) -> Parameters {
    Parameters::default()
}

fn lbp_reverse(_seed: u64) -> Parameters {
    Parameters {
        weight_x_start: vec![dec!(0.30)],
        weight_x_end: vec![dec!(0.95)],
        ..Parameters::default()
    }
}

fn lbp_short(_seed: u64) -> Parameters {
    Parameters {
        lbp_length: vec![24],
        ..Parameters::default()
    }
}

fn lbp_volatile_eth(seed: u64) -> Parameters {
    Parameters {
        eth_price_process: vec![PriceProcess::Gbm(GbmModel::new(2_000.0, 0.0, 0.9, seed))],
        ..Parameters::default()
    }
}

fn lbp_eth_crash(_seed: u64) -> Parameters {
    // -40% over five days, linear in elapsed epochs
    Parameters {
        eth_price_process: vec![PriceProcess::custom(|_run, epochs| {
            let progress = (epochs / 1_125.0).min(1.0);
            2_000.0 * (1.0 - 0.4 * progress)
        })],
        ..Parameters::default()
    }
}

fn lbp_weight_sweep(_seed: u64) -> Parameters {
    Parameters {
        weight_x_end: vec![dec!(0.20), dec!(0.30), dec!(0.50)],
        lbp_length: vec![48, 96],
        ..Parameters::default()
    }
}

fn network_upgrade_all(_seed: u64) -> Parameters {
    Parameters {
        stage: vec![StageMode::All],
        // 2021-07-01
        date_start: vec![ParameterSet::default().date_start + Duration::days(30)],
        // one timestep per day
        dt: vec![225.0],
        ..Parameters::default()
    }
}

// ─── Scenario Catalogue ─────────────────────────────────────────────────────

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "LBP_DEFAULT",
            label: "LBP 0.95→0.30 over 100h",
            category: "ramp",
            timesteps: 120,
            pipeline: PipelineKind::Lbp,
            parameters: lbp_default,
            criteria: PassCriteria {
                require_weight_at_end: true,
                final_stage: Some(Stage::Lbp),
                // 100 X at 0.30 vs 10_000 Y at 0.70 → 0.0233 X per Y
                y_usd_price_band: Some((46.0, 47.5)),
                ..PassCriteria::default()
            },
        },
        Scenario {
            name: "LBP_REVERSE",
            label: "LBP 0.30→0.95 (increasing ramp)",
            category: "ramp",
            timesteps: 120,
            pipeline: PipelineKind::Lbp,
            parameters: lbp_reverse,
            criteria: PassCriteria {
                require_weight_at_end: true,
                ..PassCriteria::default()
            },
        },
        Scenario {
            name: "LBP_SHORT",
            label: "LBP 24h ramp, 48h run",
            category: "ramp",
            timesteps: 48,
            pipeline: PipelineKind::Lbp,
            parameters: lbp_short,
            criteria: PassCriteria {
                require_weight_at_end: true,
                ..PassCriteria::default()
            },
        },
        Scenario {
            name: "LBP_WEIGHT_SWEEP",
            label: "LBP end weight × length sweep",
            category: "sweep",
            timesteps: 120,
            pipeline: PipelineKind::Lbp,
            parameters: lbp_weight_sweep,
            criteria: PassCriteria {
                require_weight_at_end: true,
                ..PassCriteria::default()
            },
        },
        Scenario {
            name: "LBP_VOLATILE_ETH",
            label: "LBP under 90% vol GBM ETH",
            category: "price",
            timesteps: 120,
            pipeline: PipelineKind::Lbp,
            parameters: lbp_volatile_eth,
            criteria: PassCriteria {
                require_weight_at_end: true,
                ..PassCriteria::default()
            },
        },
        Scenario {
            name: "LBP_ETH_CRASH",
            label: "LBP during -40% ETH drawdown",
            category: "price",
            timesteps: 120,
            pipeline: PipelineKind::Lbp,
            parameters: lbp_eth_crash,
            criteria: PassCriteria {
                require_weight_at_end: true,
                y_usd_price_band: Some((27.0, 29.0)),
                ..PassCriteria::default()
            },
        },
        Scenario {
            name: "NETWORK_UPGRADE_ALL",
            label: "Beacon → EIP-1559 → PoS (daily)",
            category: "stages",
            timesteps: 240,
            pipeline: PipelineKind::NetworkUpgrade,
            parameters: network_upgrade_all,
            criteria: PassCriteria {
                require_monotonic_stage: true,
                final_stage: Some(Stage::ProofOfStake),
                ..PassCriteria::default()
            },
        },
    ]
}
