// Copyright 2026 Hypermesh Foundation. All rights reserved.
// LBP Simulation Engine - Type Definitions

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{ETH_PRICE_MEAN_FALLBACK, ETH_SUPPLY_FALLBACK};
use crate::error::SimError;

// ─── Stage ───────────────────────────────────────────────────────────────────

/// Network-upgrade stage held in the state vector.
///
/// Declaration order is the forward order of the upgrade process, so the
/// derived `Ord` can be used to check that stages never regress.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// Before the first timestep has seeded the stage.
    Uninitialized,
    BeaconChain,
    Eip1559,
    ProofOfStake,
    /// Liquidity bootstrapping pool is live.
    Lbp,
}

impl Default for Stage {
    fn default() -> Self { Stage::Uninitialized }
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::BeaconChain => "BEACON_CHAIN",
            Self::Eip1559 => "EIP1559",
            Self::ProofOfStake => "PROOF_OF_STAKE",
            Self::Lbp => "LBP",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── StageMode ───────────────────────────────────────────────────────────────

/// Which stage (or stages) a run simulates.
///
/// `All` walks through the network-upgrade stages as simulated time crosses
/// the milestone dates; `Single` pins one stage for the entire run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StageMode {
    All,
    Single(Stage),
}

impl Default for StageMode {
    fn default() -> Self { StageMode::All }
}

impl fmt::Display for StageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("ALL"),
            Self::Single(stage) => f.write_str(stage.as_str()),
        }
    }
}

impl FromStr for StageMode {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALL" => Ok(Self::All),
            "BEACON_CHAIN" => Ok(Self::Single(Stage::BeaconChain)),
            "EIP1559" => Ok(Self::Single(Stage::Eip1559)),
            "PROOF_OF_STAKE" => Ok(Self::Single(Stage::ProofOfStake)),
            "LBP" => Ok(Self::Single(Stage::Lbp)),
            _ => Err(SimError::InvalidStage(s.to_string())),
        }
    }
}

impl TryFrom<String> for StageMode {
    type Error = SimError;
    fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl From<StageMode> for String {
    fn from(mode: StageMode) -> Self { mode.to_string() }
}

// ─── Variable ────────────────────────────────────────────────────────────────

/// Named state variables that update functions may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    Stage,
    Timestamp,
    EthPrice,
    EthSupply,
    WeightX,
    LbpSupplyX,
    LbpSupplyY,
    LbpPriceYInX,
    LbpPriceXInY,
    LbpYUsdPrice,
}

impl Variable {
    pub const ALL: [Variable; 10] = [
        Variable::Stage,
        Variable::Timestamp,
        Variable::EthPrice,
        Variable::EthSupply,
        Variable::WeightX,
        Variable::LbpSupplyX,
        Variable::LbpSupplyY,
        Variable::LbpPriceYInX,
        Variable::LbpPriceXInY,
        Variable::LbpYUsdPrice,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Stage => "stage",
            Self::Timestamp => "timestamp",
            Self::EthPrice => "eth_price",
            Self::EthSupply => "eth_supply",
            Self::WeightX => "weight_x",
            Self::LbpSupplyX => "lbp_supply_x",
            Self::LbpSupplyY => "lbp_supply_y",
            Self::LbpPriceYInX => "lbp_price_y_in_x",
            Self::LbpPriceXInY => "lbp_price_x_in_y",
            Self::LbpYUsdPrice => "lbp_y_usd_price",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variable {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variable::ALL
            .iter()
            .copied()
            .find(|v| v.name() == s)
            .ok_or_else(|| SimError::UnknownVariable {
                block: String::new(),
                variable: s.to_string(),
            })
    }
}

// ─── Value ───────────────────────────────────────────────────────────────────

/// A single state or signal value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Not yet initialized (weight before the LBP starts, timestamp before t=1).
    Unset,
    Stage(Stage),
    Timestamp(NaiveDateTime),
    Number(f64),
    Fraction(Decimal),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self { Value::Number(n) }
}

impl From<Stage> for Value {
    fn from(s: Stage) -> Self { Value::Stage(s) }
}

impl From<Option<Decimal>> for Value {
    fn from(d: Option<Decimal>) -> Self {
        d.map(Value::Fraction).unwrap_or(Value::Unset)
    }
}

impl From<Option<NaiveDateTime>> for Value {
    fn from(t: Option<NaiveDateTime>) -> Self {
        t.map(Value::Timestamp).unwrap_or(Value::Unset)
    }
}

// ─── StateVector ─────────────────────────────────────────────────────────────

/// One record of the simulation state for a (run, timestep).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    // Engine bookkeeping, written only by the resolution engine
    pub run: u32,
    pub timestep: u64,
    pub substep: usize,

    // Time
    pub stage: Stage,
    pub timestamp: Option<NaiveDateTime>,

    // Ethereum
    pub eth_price: f64,
    pub eth_supply: f64,

    // LBP
    pub weight_x: Option<Decimal>,
    pub lbp_supply_x: f64,
    pub lbp_supply_y: f64,
    pub lbp_price_y_in_x: f64,
    pub lbp_price_x_in_y: f64,
    pub lbp_y_usd_price: f64,
}

impl Default for StateVector {
    fn default() -> Self {
        Self {
            run: 0,
            timestep: 0,
            substep: 0,
            stage: Stage::Uninitialized,
            timestamp: None,
            eth_price: ETH_PRICE_MEAN_FALLBACK,
            eth_supply: ETH_SUPPLY_FALLBACK,
            weight_x: None,
            lbp_supply_x: 0.0,
            lbp_supply_y: 0.0,
            lbp_price_y_in_x: 0.0,
            lbp_price_x_in_y: 0.0,
            lbp_y_usd_price: 0.0,
        }
    }
}

impl StateVector {
    pub fn get(&self, variable: Variable) -> Value {
        match variable {
            Variable::Stage => Value::Stage(self.stage),
            Variable::Timestamp => self.timestamp.into(),
            Variable::EthPrice => Value::Number(self.eth_price),
            Variable::EthSupply => Value::Number(self.eth_supply),
            Variable::WeightX => self.weight_x.into(),
            Variable::LbpSupplyX => Value::Number(self.lbp_supply_x),
            Variable::LbpSupplyY => Value::Number(self.lbp_supply_y),
            Variable::LbpPriceYInX => Value::Number(self.lbp_price_y_in_x),
            Variable::LbpPriceXInY => Value::Number(self.lbp_price_x_in_y),
            Variable::LbpYUsdPrice => Value::Number(self.lbp_y_usd_price),
        }
    }

    /// Write one variable, rejecting values of the wrong kind.
    pub fn set(&mut self, variable: Variable, value: Value) -> Result<(), SimError> {
        let mismatch = |expected| SimError::TypeMismatch { variable: variable.name(), expected };
        match (variable, value) {
            (Variable::Stage, Value::Stage(s)) => self.stage = s,
            (Variable::Stage, _) => return Err(mismatch("stage")),
            (Variable::Timestamp, Value::Timestamp(t)) => self.timestamp = Some(t),
            (Variable::Timestamp, Value::Unset) => self.timestamp = None,
            (Variable::Timestamp, _) => return Err(mismatch("timestamp")),
            (Variable::WeightX, Value::Fraction(w)) => self.weight_x = Some(w),
            (Variable::WeightX, Value::Unset) => self.weight_x = None,
            (Variable::WeightX, _) => return Err(mismatch("fraction")),
            (numeric, Value::Number(n)) => match self.number_mut(numeric) {
                Some(slot) => *slot = n,
                None => return Err(mismatch("number")),
            },
            (_, _) => return Err(mismatch("number")),
        }
        Ok(())
    }

    fn number_mut(&mut self, variable: Variable) -> Option<&mut f64> {
        match variable {
            Variable::EthPrice => Some(&mut self.eth_price),
            Variable::EthSupply => Some(&mut self.eth_supply),
            Variable::LbpSupplyX => Some(&mut self.lbp_supply_x),
            Variable::LbpSupplyY => Some(&mut self.lbp_supply_y),
            Variable::LbpPriceYInX => Some(&mut self.lbp_price_y_in_x),
            Variable::LbpPriceXInY => Some(&mut self.lbp_price_x_in_y),
            Variable::LbpYUsdPrice => Some(&mut self.lbp_y_usd_price),
            Variable::Stage | Variable::Timestamp | Variable::WeightX => None,
        }
    }
}

// ─── Signal ──────────────────────────────────────────────────────────────────

/// Policy output consumed by the update functions of the same block.
///
/// A signal lives for exactly one block execution and is dropped afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signal(BTreeMap<String, Value>);

impl Signal {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.get(key).copied()
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Merge another policy's output into this one. Keys must be disjoint.
    pub fn merge(&mut self, other: Signal) -> Result<(), SimError> {
        for (key, value) in other.0 {
            if self.0.contains_key(&key) {
                return Err(SimError::SignalCollision { block: String::new(), key });
            }
            self.0.insert(key, value);
        }
        Ok(())
    }
}

// ─── History ─────────────────────────────────────────────────────────────────

/// State records of one run, starting with the initial state at timestep 0.
pub type History = Vec<StateVector>;
