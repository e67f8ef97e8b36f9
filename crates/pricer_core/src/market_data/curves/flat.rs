//! Flat yield curve implementation.

use super::YieldCurve;
use crate::market_data::error::MarketDataError;

/// Yield curve with a single continuously compounded rate.
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{FlatCurve, YieldCurve};
///
/// let curve = FlatCurve::new(0.05);
/// assert!((curve.discount_factor(1.0).unwrap() - (-0.05f64).exp()).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlatCurve {
    rate: f64,
}

impl FlatCurve {
    /// Creates a flat curve at `rate`.
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    /// The constant rate.
    pub fn rate_value(&self) -> f64 {
        self.rate
    }
}

impl YieldCurve for FlatCurve {
    fn discount_factor(&self, t: f64) -> Result<f64, MarketDataError> {
        if t < 0.0 || !t.is_finite() {
            return Err(MarketDataError::InvalidMaturity { t });
        }
        Ok((-self.rate * t).exp())
    }

    fn instantaneous_forward(&self, t: f64) -> Result<f64, MarketDataError> {
        if t < 0.0 || !t.is_finite() {
            return Err(MarketDataError::InvalidMaturity { t });
        }
        Ok(self.rate)
    }

    fn zero_rate(&self, t: f64) -> Result<f64, MarketDataError> {
        if t < 0.0 || !t.is_finite() {
            return Err(MarketDataError::InvalidMaturity { t });
        }
        Ok(self.rate)
    }
}
