// Copyright 2026 Hypermesh Foundation. All rights reserved.
// LBP Simulation Engine - ETH Price Feed

use crate::error::SimError;
use crate::params::ParameterSet;
use crate::pipeline::Substep;
use crate::types::{Signal, StateVector, Value, Variable};

/// State-update function sampling the ETH price process once per timestep.
///
/// Elapsed time is taken from the previous record, matching the stage
/// machine's timestamp.
pub fn update_eth_price(
    params: &ParameterSet,
    _substep: &Substep<'_>,
    state: &StateVector,
    _signal: &Signal,
) -> Result<(String, Value), SimError> {
    let elapsed = params.elapsed_epochs(state.timestep);
    let price = params.eth_price_process.sample(state.run, elapsed);
    Ok((Variable::EthPrice.name().to_string(), Value::Number(price)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price::PriceProcess;

    #[test]
    fn samples_process_at_previous_timestep() {
        let params = ParameterSet {
            eth_price_process: PriceProcess::custom(|run, epochs| run as f64 * 1_000.0 + epochs),
            ..ParameterSet::default()
        };
        let substep = Substep { run: 2, timestep: 5, index: 1, history: &[] };
        let state = StateVector { run: 2, timestep: 4, ..StateVector::default() };

        let (name, value) = update_eth_price(&params, &substep, &state, &Signal::new()).unwrap();
        assert_eq!(name, "eth_price");
        assert_eq!(value, Value::Number(2_000.0 + 4.0 * params.dt));
    }

    #[test]
    fn constant_process_is_flat() {
        let params = ParameterSet {
            eth_price_process: PriceProcess::Constant(1_750.0),
            ..ParameterSet::default()
        };
        let substep = Substep { run: 0, timestep: 1, index: 1, history: &[] };
        for timestep in [0, 10, 1_000] {
            let state = StateVector { timestep, ..StateVector::default() };
            let (_, value) = update_eth_price(&params, &substep, &state, &Signal::new()).unwrap();
            assert_eq!(value.as_number(), Some(1_750.0));
        }
    }
}
