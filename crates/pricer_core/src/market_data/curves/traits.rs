//! Yield curve trait definitions.

use crate::market_data::error::MarketDataError;

/// Spot rate, instantaneous forward rate and discount factor at one maturity.
///
/// Rates are continuously compounded, so `discount_factor = exp(-spot_rate * maturity)`
/// and `d(spot_rate * maturity)/dt = forward_rate`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct YieldCurvePoint {
    /// Maturity in years
    pub maturity: f64,
    /// Continuously compounded zero rate
    pub spot_rate: f64,
    /// Instantaneous forward rate
    pub forward_rate: f64,
    /// Discount factor
    pub discount_factor: f64,
}

/// Term structure of interest rates.
///
/// Implementors supply `discount_factor`; spot, forward and par rates are
/// derived from it. Implementors with a closed-form forward (piecewise flat,
/// flat) should override [`instantaneous_forward`](Self::instantaneous_forward).
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{FlatCurve, YieldCurve};
///
/// let curve = FlatCurve::new(0.04);
/// let point = curve.rate(2.0).unwrap();
/// assert!((point.spot_rate - 0.04).abs() < 1e-12);
/// assert!((point.forward_rate - 0.04).abs() < 1e-12);
/// ```
pub trait YieldCurve {
    /// Discount factor D(t) for maturity `t` years.
    ///
    /// # Errors
    ///
    /// Returns `MarketDataError::InvalidMaturity` for negative or non-finite `t`.
    fn discount_factor(&self, t: f64) -> Result<f64, MarketDataError>;

    /// Instantaneous forward rate f(t) = -d ln D(t) / dt.
    ///
    /// The default uses a one-sided difference of width 1e-6.
    fn instantaneous_forward(&self, t: f64) -> Result<f64, MarketDataError> {
        let h = 1e-6;
        let d0 = self.discount_factor(t)?;
        let d1 = self.discount_factor(t + h)?;
        Ok(-(d1 / d0).ln() / h)
    }

    /// Continuously compounded zero rate r(t) = -ln D(t) / t.
    ///
    /// At `t = 0` the limit, the short forward rate, is returned.
    fn zero_rate(&self, t: f64) -> Result<f64, MarketDataError> {
        if t <= 1e-12 {
            if t < 0.0 {
                return Err(MarketDataError::InvalidMaturity { t });
            }
            return self.instantaneous_forward(0.0);
        }
        let df = self.discount_factor(t)?;
        Ok(-df.ln() / t)
    }

    /// Continuously compounded forward rate between `t1` and `t2`.
    fn forward_rate_between(&self, t1: f64, t2: f64) -> Result<f64, MarketDataError> {
        let dt = t2 - t1;
        if dt <= 0.0 {
            return Err(MarketDataError::InvalidMaturity { t: dt });
        }
        let df1 = self.discount_factor(t1)?;
        let df2 = self.discount_factor(t2)?;
        Ok(-(df2 / df1).ln() / dt)
    }

    /// Spot, forward and discount factor at `maturity`.
    fn rate(&self, maturity: f64) -> Result<YieldCurvePoint, MarketDataError> {
        Ok(YieldCurvePoint {
            maturity,
            spot_rate: self.zero_rate(maturity)?,
            forward_rate: self.instantaneous_forward(maturity)?,
            discount_factor: self.discount_factor(maturity)?,
        })
    }

    /// Par coupon rate (compounded `frequency` times a year) of a bullet bond
    /// maturing at `maturity`.
    ///
    /// Solves `c/f · Σ D(k/f) + D(T) = 1` over the coupon dates `k/f <= T`.
    fn par_yield(&self, maturity: f64, frequency: u32) -> Result<f64, MarketDataError> {
        if maturity <= 0.0 || !maturity.is_finite() {
            return Err(MarketDataError::InvalidMaturity { t: maturity });
        }
        let f = f64::from(frequency.max(1));
        let periods = ((maturity * f).round() as usize).max(1);
        let step = maturity / periods as f64;
        let mut annuity = 0.0;
        for k in 1..=periods {
            annuity += self.discount_factor(step * k as f64)?;
        }
        let df_t = self.discount_factor(maturity)?;
        Ok((1.0 - df_t) / (annuity * step))
    }
}
