//! Adapter layer: converts between the f64 pool math and Decimal weights.

use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::error::SimError;

/// Convert Decimal to f64.
pub fn from_decimal(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

/// Parse a weight fraction given as f64, rejecting non-finite input.
pub fn weight_from_f64(field: &'static str, v: f64) -> Result<Decimal, SimError> {
    if !v.is_finite() {
        return Err(SimError::InvalidParameter {
            field,
            reason: format!("{} is not a finite number", v),
        });
    }
    Decimal::from_f64(v).ok_or_else(|| SimError::InvalidParameter {
        field,
        reason: format!("{} cannot be represented as a decimal", v),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn decimal_round_trip_keeps_short_fractions() {
        assert_eq!(from_decimal(dec!(0.95)), 0.95);
        assert_eq!(from_decimal(dec!(0.3)), 0.3);
    }

    #[test]
    fn non_finite_weight_is_rejected() {
        assert!(weight_from_f64("weight_x_start", f64::NAN).is_err());
        assert!(weight_from_f64("weight_x_start", f64::INFINITY).is_err());
        assert!(weight_from_f64("weight_x_start", 0.5).is_ok());
    }
}
