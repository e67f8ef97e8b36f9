//! Anchor-based yield curve interpolated in log-discount-factor space.

use super::YieldCurve;
use crate::market_data::error::MarketDataError;

/// Yield curve built from (maturity, discount factor) anchors.
///
/// `ln D(t)` is interpolated linearly in `t` between anchors, which is
/// equivalent to a piecewise-constant instantaneous forward rate. Discount
/// factors therefore stay positive, and stay monotone whenever the anchor
/// forwards are positive. An anchor `(0, 1)` is implied.
///
/// Beyond the last anchor the curve extrapolates at the last segment's
/// forward rate instead of failing.
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{LogDiscountCurve, YieldCurve};
///
/// let curve = LogDiscountCurve::from_zero_rates(&[(1.0, 0.03), (5.0, 0.04)]).unwrap();
///
/// // On an anchor the zero rate is reproduced
/// assert!((curve.zero_rate(5.0).unwrap() - 0.04).abs() < 1e-12);
///
/// // Past the last anchor the forward stays flat
/// let f5 = curve.instantaneous_forward(5.0).unwrap();
/// let f30 = curve.instantaneous_forward(30.0).unwrap();
/// assert!((f5 - f30).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogDiscountCurve {
    /// Knot maturities, starting with the implicit 0
    maturities: Vec<f64>,
    /// ln D at each knot, starting with 0
    log_dfs: Vec<f64>,
}

impl LogDiscountCurve {
    /// Builds a curve from `(maturity, discount_factor)` anchors.
    ///
    /// # Errors
    ///
    /// - `InsufficientData` if `anchors` is empty
    /// - `UnsortedAnchors` if maturities are not strictly increasing and positive
    /// - `NonPositiveDiscountFactor` for a zero, negative or non-finite factor
    pub fn new(anchors: &[(f64, f64)]) -> Result<Self, MarketDataError> {
        if anchors.is_empty() {
            return Err(MarketDataError::InsufficientData { got: 0, need: 1 });
        }

        let mut maturities = Vec::with_capacity(anchors.len() + 1);
        let mut log_dfs = Vec::with_capacity(anchors.len() + 1);
        maturities.push(0.0);
        log_dfs.push(0.0);

        for (index, &(t, df)) in anchors.iter().enumerate() {
            if !t.is_finite() {
                return Err(MarketDataError::InvalidMaturity { t });
            }
            if !df.is_finite() || df <= 0.0 {
                return Err(MarketDataError::NonPositiveDiscountFactor { index, df });
            }
            // Explicit (0, 1) anchor is tolerated and folded into the implicit one
            if index == 0 && t == 0.0 && df == 1.0 {
                continue;
            }
            let previous = maturities[maturities.len() - 1];
            if t <= previous {
                return Err(MarketDataError::UnsortedAnchors {
                    index,
                    previous,
                    current: t,
                });
            }
            maturities.push(t);
            log_dfs.push(df.ln());
        }

        if maturities.len() < 2 {
            return Err(MarketDataError::InsufficientData { got: 0, need: 1 });
        }

        Ok(Self {
            maturities,
            log_dfs,
        })
    }

    /// Builds a curve from `(maturity, continuously compounded zero rate)` anchors.
    pub fn from_zero_rates(anchors: &[(f64, f64)]) -> Result<Self, MarketDataError> {
        let dfs: Vec<(f64, f64)> = anchors.iter().map(|&(t, r)| (t, (-r * t).exp())).collect();
        Self::new(&dfs)
    }

    /// Single-anchor curve equivalent to a flat continuously compounded rate.
    pub fn flat(rate: f64) -> Result<Self, MarketDataError> {
        Self::from_zero_rates(&[(1.0, rate)])
    }

    /// Anchor maturities (excluding the implicit origin).
    pub fn anchor_maturities(&self) -> &[f64] {
        &self.maturities[1..]
    }

    /// Last anchor maturity.
    pub fn last_maturity(&self) -> f64 {
        self.maturities[self.maturities.len() - 1]
    }

    /// Index `i` of the segment `[t_i, t_{i+1})` containing `t`, clamped to the last.
    fn segment(&self, t: f64) -> usize {
        let last_segment = self.maturities.len() - 2;
        let upper = self.maturities.partition_point(|&m| m <= t);
        upper.saturating_sub(1).min(last_segment)
    }

    fn segment_forward(&self, i: usize) -> f64 {
        -(self.log_dfs[i + 1] - self.log_dfs[i]) / (self.maturities[i + 1] - self.maturities[i])
    }

    fn check_maturity(t: f64) -> Result<(), MarketDataError> {
        if t < 0.0 || !t.is_finite() {
            Err(MarketDataError::InvalidMaturity { t })
        } else {
            Ok(())
        }
    }
}

impl YieldCurve for LogDiscountCurve {
    fn discount_factor(&self, t: f64) -> Result<f64, MarketDataError> {
        Self::check_maturity(t)?;
        let i = self.segment(t);
        let log_df = self.log_dfs[i] - self.segment_forward(i) * (t - self.maturities[i]);
        Ok(log_df.exp())
    }

    fn instantaneous_forward(&self, t: f64) -> Result<f64, MarketDataError> {
        Self::check_maturity(t)?;
        Ok(self.segment_forward(self.segment(t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn sample_curve() -> LogDiscountCurve {
        LogDiscountCurve::new(&[(0.5, 0.99), (1.0, 0.975), (2.0, 0.94), (5.0, 0.83)]).unwrap()
    }

    // ==========================================================
    // Construction
    // ==========================================================

    #[test]
    fn test_rejects_unsorted() {
        let err = LogDiscountCurve::new(&[(1.0, 0.97), (0.5, 0.99)]).unwrap_err();
        assert!(matches!(err, MarketDataError::UnsortedAnchors { index: 1, .. }));
    }

    #[test]
    fn test_rejects_duplicate_maturity() {
        assert!(LogDiscountCurve::new(&[(1.0, 0.97), (1.0, 0.96)]).is_err());
    }

    #[test]
    fn test_rejects_non_positive_df() {
        let err = LogDiscountCurve::new(&[(1.0, 0.97), (2.0, 0.0)]).unwrap_err();
        assert!(matches!(err, MarketDataError::NonPositiveDiscountFactor { index: 1, .. }));
        assert!(LogDiscountCurve::new(&[(1.0, -0.5)]).is_err());
    }

    #[test]
    fn test_rejects_empty() {
        assert!(LogDiscountCurve::new(&[]).is_err());
    }

    #[test]
    fn test_explicit_origin_tolerated() {
        let curve = LogDiscountCurve::new(&[(0.0, 1.0), (1.0, 0.95)]).unwrap();
        assert_eq!(curve.anchor_maturities(), &[1.0]);
    }

    // ==========================================================
    // Interpolation
    // ==========================================================

    #[test]
    fn test_reproduces_anchors() {
        let curve = sample_curve();
        assert_relative_eq!(curve.discount_factor(2.0).unwrap(), 0.94, epsilon = 1e-14);
        assert_relative_eq!(curve.discount_factor(0.5).unwrap(), 0.99, epsilon = 1e-14);
        assert_eq!(curve.discount_factor(0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_log_linear_midpoint() {
        let curve = sample_curve();
        let expected = (0.5 * (0.975f64.ln() + 0.94f64.ln())).exp();
        assert_relative_eq!(curve.discount_factor(1.5).unwrap(), expected, epsilon = 1e-14);
    }

    #[test]
    fn test_flat_forward_extrapolation() {
        let curve = sample_curve();
        let f_last = -(0.83f64.ln() - 0.94f64.ln()) / 3.0;
        assert_relative_eq!(curve.instantaneous_forward(10.0).unwrap(), f_last, epsilon = 1e-14);
        let expected = 0.83 * (-f_last * 5.0).exp();
        assert_relative_eq!(curve.discount_factor(10.0).unwrap(), expected, epsilon = 1e-14);
    }

    #[test]
    fn test_rate_point_consistency() {
        let curve = sample_curve();
        let p = curve.rate(3.0).unwrap();
        assert_relative_eq!(p.discount_factor, (-p.spot_rate * 3.0).exp(), epsilon = 1e-14);
    }

    #[test]
    fn test_negative_maturity_rejected() {
        assert!(sample_curve().discount_factor(-0.1).is_err());
    }

    proptest! {
        #[test]
        fn prop_discount_factors_decrease(t in 0.0f64..40.0, dt in 1e-3f64..5.0) {
            let curve = sample_curve();
            let d1 = curve.discount_factor(t).unwrap();
            let d2 = curve.discount_factor(t + dt).unwrap();
            prop_assert!(d2 < d1);
            prop_assert!(d2 > 0.0);
        }

        #[test]
        fn prop_forward_integrates_to_spot(t in 0.1f64..20.0) {
            // t·r(t) = ∫ f, checked by finite differencing t·r(t)
            let curve = sample_curve();
            let h = 1e-7;
            let lhs =
                ((t + h) * curve.zero_rate(t + h).unwrap() - t * curve.zero_rate(t).unwrap()) / h;
            let f = curve.instantaneous_forward(t).unwrap();
            prop_assert!((lhs - f).abs() < 1e-5);
        }
    }
}
