// Copyright 2026 Hypermesh Foundation. All rights reserved.
// LBP Simulation Engine - Constants

/// Seconds per slot on the beacon chain.
pub const SECONDS_PER_SLOT: f64 = 12.0;
/// Slots per epoch on the beacon chain.
pub const SLOTS_PER_EPOCH: f64 = 32.0;

/// 86_400 / (12 * 32) = 225 epochs per day.
pub const EPOCHS_PER_DAY: f64 = 86_400.0 / (SECONDS_PER_SLOT * SLOTS_PER_EPOCH);
pub const EPOCHS_PER_YEAR: f64 = 365.0 * EPOCHS_PER_DAY;

/// Default timestep: one hour of simulated time.
pub const DELTA_TIME: f64 = EPOCHS_PER_DAY / 24.0;
pub const SIMULATION_TIME_DAYS: u64 = 5;
/// `EPOCHS_PER_DAY * SIMULATION_TIME_DAYS / DELTA_TIME`, i.e. 120.
pub const DEFAULT_TIMESTEPS: u64 = SIMULATION_TIME_DAYS * 24;
pub const DEFAULT_MONTE_CARLO_RUNS: u32 = 1;

/// Wei per ETH.
pub const WEI: f64 = 1e18;

/// ETH spot price (USD) used when no price oracle is reachable.
pub const ETH_PRICE_MEAN_FALLBACK: f64 = 2_000.0;
/// Total ETH supply used when no chain-state source is reachable.
pub const ETH_SUPPLY_FALLBACK: f64 = 116_250_000e18 / WEI;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epochs_per_day_is_225() {
        assert_eq!(EPOCHS_PER_DAY, 225.0);
    }

    #[test]
    fn default_timesteps_cover_simulation_days() {
        let expected = (EPOCHS_PER_DAY * SIMULATION_TIME_DAYS as f64 / DELTA_TIME) as u64;
        assert_eq!(DEFAULT_TIMESTEPS, expected);
    }
}
