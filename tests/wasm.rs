#![cfg(target_arch = "wasm32")]

use lbp_engine::LbpSimulation;
use wasm_bindgen_test::*;

#[wasm_bindgen_test]
fn default_config_runs() {
    let sim = LbpSimulation::new("{}").unwrap();
    assert_eq!(sim.timesteps(), 120);
    assert_eq!(sim.sweep_len(), 1);
    let result = sim.run().unwrap();
    assert!(!result.is_null());
}

#[wasm_bindgen_test]
fn invalid_config_is_rejected() {
    assert!(LbpSimulation::new(r#"{"parameters": {"stage": ["SHARDING"]}}"#).is_err());
}

#[wasm_bindgen_test]
fn weight_ramp_override_validates_input() {
    let mut sim = LbpSimulation::new(r#"{"timesteps": 10}"#).unwrap();
    assert!(sim.set_weight_ramp(0.9, 0.4).is_ok());
    assert!(sim.set_weight_ramp(f64::NAN, 0.4).is_err());
    sim.set_eth_price(1_500.0);
    assert!(sim.run().is_ok());
}
