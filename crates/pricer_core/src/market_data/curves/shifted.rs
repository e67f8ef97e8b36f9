//! Parallel-shifted view of a yield curve.

use super::YieldCurve;
use crate::market_data::error::MarketDataError;

/// Borrowed curve with a parallel shift applied to its zero rates.
///
/// `D'(t) = D(t) · exp(-shift · t)`. Used for Z-spread discounting,
/// PVBP and effective duration bumps without cloning the base curve.
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{FlatCurve, ShiftedCurve, YieldCurve};
///
/// let base = FlatCurve::new(0.03);
/// let bumped = ShiftedCurve::new(&base, 0.0001);
/// assert!((bumped.zero_rate(5.0).unwrap() - 0.0301).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ShiftedCurve<'a, C: YieldCurve + ?Sized> {
    base: &'a C,
    shift: f64,
}

impl<'a, C: YieldCurve + ?Sized> ShiftedCurve<'a, C> {
    /// Wraps `base` with a continuously compounded parallel `shift`.
    pub fn new(base: &'a C, shift: f64) -> Self {
        Self { base, shift }
    }

    /// The applied shift.
    pub fn shift(&self) -> f64 {
        self.shift
    }
}

impl<C: YieldCurve + ?Sized> YieldCurve for ShiftedCurve<'_, C> {
    fn discount_factor(&self, t: f64) -> Result<f64, MarketDataError> {
        Ok(self.base.discount_factor(t)? * (-self.shift * t).exp())
    }

    fn instantaneous_forward(&self, t: f64) -> Result<f64, MarketDataError> {
        Ok(self.base.instantaneous_forward(t)? + self.shift)
    }
}
