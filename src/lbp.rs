// Copyright (c) 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Liquidity bootstrapping pool: weight ramp, one-time liquidity injection
//! and spot pricing.
//!
//! Asset X is the reference asset, priced in ETH. Weights are held as
//! [`Decimal`] so the ramp lands on its end weight exactly; reserves and
//! prices are `f64`.
//!
//! The three policies only act while the stage is [`Stage::Lbp`]. In any
//! other stage they hand back the previous values unchanged.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::adapter::from_decimal;
use crate::error::SimError;
use crate::params::ParameterSet;
use crate::pipeline::Substep;
use crate::types::{Signal, Stage, StateVector};

/// Weights within this distance of the end weight snap onto it.
fn ramp_epsilon() -> Decimal {
    Decimal::new(1, 18)
}

// ─── Weight ramp ─────────────────────────────────────────────────────────────

/// Next `weight_x` on a linear ramp from `start` to `end` over `length`
/// timesteps.
///
/// An uninitialized weight is seeded to `start` without stepping. After that
/// each call moves by `|start - end| / length` towards `end`. The result
/// always lies within `[min(start, end), max(start, end)]`, so a weight
/// handed in from outside the ramp is pulled back onto it.
pub fn next_weight(current: Option<Decimal>, start: Decimal, end: Decimal, length: u32) -> Decimal {
    let weight = match current {
        Some(w) => w,
        None => return start,
    };
    if length == 0 {
        return end;
    }

    let (low, high) = (start.min(end), start.max(end));
    let weight = weight.clamp(low, high);
    let step = (start - end).abs() / Decimal::from(length);
    let next = if start > end { weight - step } else { weight + step };
    let next = next.clamp(low, high);

    if (next - end).abs() < ramp_epsilon() {
        end
    } else {
        next
    }
}

// ─── Liquidity ───────────────────────────────────────────────────────────────

/// Seed empty reserves with the initial liquidity. Non-empty reserves are
/// returned untouched, so repeated calls inject at most once.
pub fn inject_liquidity(supply_x: f64, supply_y: f64, initial_x: f64, initial_y: f64) -> (f64, f64) {
    if supply_x == 0.0 && supply_y == 0.0 {
        (initial_x, initial_y)
    } else {
        (supply_x, supply_y)
    }
}

// ─── Pricing ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotPrices {
    pub y_in_x: f64,
    pub x_in_y: f64,
    /// Fiat price of Y, valuing X at the ETH price.
    pub y_usd: f64,
}

impl SpotPrices {
    pub const ZERO: SpotPrices = SpotPrices { y_in_x: 0.0, x_in_y: 0.0, y_usd: 0.0 };
}

/// Weighted-pool spot prices.
///
/// `x_w = supply_x / weight_x` and `y_w = supply_y / (1 - weight_x)`; the
/// price of Y in X is `x_w / y_w`. A weight outside (0, 1) is an error.
/// Empty reserves price at zero.
pub fn spot_prices(
    weight_x: Option<Decimal>,
    supply_x: f64,
    supply_y: f64,
    eth_price: f64,
) -> Result<SpotPrices, SimError> {
    let weight_x = match weight_x {
        Some(w) if w > Decimal::ZERO && w < Decimal::ONE => w,
        other => {
            return Err(SimError::InvalidWeight {
                block: String::new(),
                weight: other.unwrap_or(Decimal::ZERO),
            })
        }
    };
    if supply_x == 0.0 || supply_y == 0.0 {
        return Ok(SpotPrices::ZERO);
    }

    let x_weighted = supply_x / from_decimal(weight_x);
    let y_weighted = supply_y / from_decimal(Decimal::ONE - weight_x);
    let y_in_x = x_weighted / y_weighted;
    Ok(SpotPrices {
        y_in_x,
        x_in_y: y_weighted / x_weighted,
        y_usd: eth_price * y_in_x,
    })
}

// ─── Policies ────────────────────────────────────────────────────────────────

pub fn policy_adjust_weight(
    params: &ParameterSet,
    _substep: &Substep<'_>,
    state: &StateVector,
) -> Result<Signal, SimError> {
    let weight = if state.stage == Stage::Lbp {
        Some(next_weight(
            state.weight_x,
            params.weight_x_start,
            params.weight_x_end,
            params.lbp_length,
        ))
    } else {
        state.weight_x
    };
    Ok(Signal::new().with("weight_x", weight))
}

pub fn policy_add_liquidity(
    params: &ParameterSet,
    _substep: &Substep<'_>,
    state: &StateVector,
) -> Result<Signal, SimError> {
    let (x, y) = if state.stage == Stage::Lbp {
        inject_liquidity(
            state.lbp_supply_x,
            state.lbp_supply_y,
            params.lbp_initial_x,
            params.lbp_initial_y,
        )
    } else {
        (state.lbp_supply_x, state.lbp_supply_y)
    };
    Ok(Signal::new().with("lbp_supply_x", x).with("lbp_supply_y", y))
}

pub fn policy_calc_pricing(
    _params: &ParameterSet,
    _substep: &Substep<'_>,
    state: &StateVector,
) -> Result<Signal, SimError> {
    let prices = if state.stage == Stage::Lbp {
        spot_prices(state.weight_x, state.lbp_supply_x, state.lbp_supply_y, state.eth_price)?
    } else {
        SpotPrices {
            y_in_x: state.lbp_price_y_in_x,
            x_in_y: state.lbp_price_x_in_y,
            y_usd: state.lbp_y_usd_price,
        }
    };
    Ok(Signal::new()
        .with("lbp_price_y_in_x", prices.y_in_x)
        .with("lbp_price_x_in_y", prices.x_in_y)
        .with("lbp_y_usd_price", prices.y_usd))
}
