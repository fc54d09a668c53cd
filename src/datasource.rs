//! External collaborators that seed a simulation with live data.
//!
//! Fetches happen once, in the caller, before any run starts. A failed fetch
//! is logged and replaced by the documented fallback constant so that the
//! experiment proceeds on static data instead of aborting.

use std::fmt;

use tracing::warn;

use crate::constants::{ETH_PRICE_MEAN_FALLBACK, ETH_SUPPLY_FALLBACK};
use crate::error::SimError;
use crate::price::PriceProcess;
use crate::types::StateVector;

/// Source of historical ETH price statistics.
pub trait PriceOracle: Send + Sync + fmt::Debug {
    /// Mean ETH spot price (USD) over the oracle's lookback window.
    fn eth_price_mean(&self) -> Result<f64, SimError>;
}

/// Source of current chain state.
pub trait ChainStateSource: Send + Sync + fmt::Debug {
    /// Total ETH supply, in ETH.
    fn eth_supply(&self) -> Result<f64, SimError>;
}

/// Constant price process at the oracle's historical mean.
pub fn default_price_process(oracle: &dyn PriceOracle) -> PriceProcess {
    let mean = match oracle.eth_price_mean() {
        Ok(price) if price.is_finite() && price > 0.0 => price,
        Ok(price) => {
            warn!(price, fallback = ETH_PRICE_MEAN_FALLBACK, "Oracle returned unusable ETH price, using fallback");
            ETH_PRICE_MEAN_FALLBACK
        }
        Err(e) => {
            warn!(error = %e, fallback = ETH_PRICE_MEAN_FALLBACK, "Failed to fetch ETH price mean, using fallback");
            ETH_PRICE_MEAN_FALLBACK
        }
    };
    PriceProcess::Constant(mean)
}

/// Initial state with `eth_supply` (and the starting ETH price) taken from
/// the collaborators.
pub fn initial_state(chain: &dyn ChainStateSource, oracle: &dyn PriceOracle) -> StateVector {
    let eth_supply = chain.eth_supply().unwrap_or_else(|e| {
        warn!(error = %e, fallback = ETH_SUPPLY_FALLBACK, "Failed to fetch ETH supply, using fallback");
        ETH_SUPPLY_FALLBACK
    });
    let eth_price = match default_price_process(oracle) {
        PriceProcess::Constant(price) => price,
        _ => ETH_PRICE_MEAN_FALLBACK,
    };
    StateVector { eth_supply, eth_price, ..StateVector::default() }
}

// ─── StaticSource ────────────────────────────────────────────────────────────

/// Collaborator returning fixed values, or failing on demand.
#[derive(Debug, Clone)]
pub struct StaticSource {
    eth_price_mean: Option<f64>,
    eth_supply: Option<f64>,
}

impl StaticSource {
    /// A source serving the fallback constants.
    pub fn new() -> Self {
        Self {
            eth_price_mean: Some(ETH_PRICE_MEAN_FALLBACK),
            eth_supply: Some(ETH_SUPPLY_FALLBACK),
        }
    }

    /// A source whose every fetch fails.
    pub fn unavailable() -> Self {
        Self { eth_price_mean: None, eth_supply: None }
    }

    pub fn with_eth_price_mean(mut self, price: f64) -> Self {
        self.eth_price_mean = Some(price);
        self
    }

    pub fn with_eth_supply(mut self, supply: f64) -> Self {
        self.eth_supply = Some(supply);
        self
    }
}

impl Default for StaticSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceOracle for StaticSource {
    fn eth_price_mean(&self) -> Result<f64, SimError> {
        self.eth_price_mean
            .ok_or_else(|| SimError::DataSource("eth price mean unavailable".to_string()))
    }
}

impl ChainStateSource for StaticSource {
    fn eth_supply(&self) -> Result<f64, SimError> {
        self.eth_supply
            .ok_or_else(|| SimError::DataSource("eth supply unavailable".to_string()))
    }
}
