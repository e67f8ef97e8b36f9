//! Value-at-Risk and Expected Shortfall.
//!
//! Two estimators are provided:
//!
//! - **Delta-normal**: the portfolio's first-order exposures to spot,
//!   volatility and rates are combined with annualised factor volatilities,
//!   assuming independent normal factor moves:
//!
//!   ```text
//!   σ_P = √h · √((Δ·S·σ_S)² + (vega·σ_σ)² + (ρ·σ_r)²)
//!   VaR = z_α · σ_P
//!   ES  = σ_P · φ(z_α) / (1 − α)
//!   ```
//!
//!   At 99% the conventional multiplier `z = 2.33` is used.
//!
//! - **Historical**: empirical quantile and tail mean of a caller-supplied
//!   P&L sample.
//!
//! Both report losses as positive numbers.

use pricer_core::math::distributions::{norm_inv, norm_pdf};

use crate::aggregator::PortfolioRisk;
use crate::error::RiskError;

/// Default VaR confidence level.
pub const DEFAULT_CONFIDENCE: f64 = 0.99;

/// Normal quantile used for 99% delta-normal VaR.
pub const Z_99: f64 = 2.33;

/// Estimation method behind a [`VarEstimate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum VarMethod {
    /// Parametric, normal factor moves
    DeltaNormal,
    /// Empirical P&L sample
    Historical,
}

/// Annualised volatilities of the portfolio's risk factors.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiskFactorVolatilities {
    /// Current level of the shared underlying
    pub spot: f64,
    /// Relative volatility of spot returns
    pub spot_vol: f64,
    /// Absolute volatility of implied volatility
    pub vol_of_vol: f64,
    /// Absolute volatility of rates
    pub rate_vol: f64,
}

impl RiskFactorVolatilities {
    /// Creates factor volatilities with no vol or rate risk.
    pub fn new(spot: f64, spot_vol: f64) -> Self {
        Self {
            spot,
            spot_vol,
            vol_of_vol: 0.0,
            rate_vol: 0.0,
        }
    }

    /// Sets the volatility of implied volatility.
    pub fn with_vol_of_vol(mut self, vol_of_vol: f64) -> Self {
        self.vol_of_vol = vol_of_vol;
        self
    }

    /// Sets the volatility of rates.
    pub fn with_rate_vol(mut self, rate_vol: f64) -> Self {
        self.rate_vol = rate_vol;
        self
    }

    fn validate(&self) -> Result<(), RiskError> {
        if !(self.spot.is_finite() && self.spot > 0.0) {
            return Err(RiskError::parameter("spot", "must be positive and finite"));
        }
        for (name, value) in [
            ("spot_vol", self.spot_vol),
            ("vol_of_vol", self.vol_of_vol),
            ("rate_vol", self.rate_vol),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(RiskError::parameter(name, "must be non-negative and finite"));
            }
        }
        Ok(())
    }
}

/// A VaR and Expected Shortfall pair.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarEstimate {
    /// Estimation method
    pub method: VarMethod,
    /// Confidence level α
    pub confidence: f64,
    /// Loss not exceeded with probability α
    pub var: f64,
    /// Mean loss beyond the VaR threshold
    pub expected_shortfall: f64,
    /// Standard deviation of portfolio P&L over the horizon
    pub stdev: f64,
}

fn check_confidence(confidence: f64) -> Result<(), RiskError> {
    if confidence > 0.0 && confidence < 1.0 {
        Ok(())
    } else {
        Err(RiskError::InvalidConfidence { confidence })
    }
}

/// Normal quantile for `confidence`, with the 2.33 convention at 99%.
pub fn normal_quantile(confidence: f64) -> f64 {
    if (confidence - DEFAULT_CONFIDENCE).abs() < 1e-12 {
        Z_99
    } else {
        norm_inv(confidence)
    }
}

/// Standard deviation of portfolio P&L over `horizon` years.
///
/// Factors are independent, so variances add.
///
/// # Errors
///
/// - `RiskError::InvalidHorizon` for a negative or non-finite horizon
/// - `RiskError::InvalidParameter` for a non-positive spot or negative volatility
pub fn portfolio_stdev(
    risk: &PortfolioRisk,
    factors: &RiskFactorVolatilities,
    horizon: f64,
) -> Result<f64, RiskError> {
    if !(horizon.is_finite() && horizon >= 0.0) {
        return Err(RiskError::InvalidHorizon { horizon });
    }
    factors.validate()?;

    let greeks = &risk.greeks;
    let spot_term = greeks.delta * factors.spot * factors.spot_vol;
    let vol_term = greeks.vega * factors.vol_of_vol;
    let rate_term = greeks.rho * factors.rate_vol;
    let annual = (spot_term * spot_term + vol_term * vol_term + rate_term * rate_term).sqrt();
    Ok(horizon.sqrt() * annual)
}

/// Parametric delta-normal VaR and Expected Shortfall.
///
/// # Examples
///
/// ```
/// use pricer_models::greeks::GreeksSet;
/// use pricer_risk::{delta_normal_var, PortfolioRisk, RiskFactorVolatilities};
///
/// let risk = PortfolioRisk {
///     greeks: GreeksSet { delta: 100.0, ..GreeksSet::zero() },
///     ..PortfolioRisk::default()
/// };
/// let factors = RiskFactorVolatilities::new(50.0, 0.2);
/// let estimate = delta_normal_var(&risk, &factors, 1.0, 0.99).unwrap();
///
/// // σ = 100 × 50 × 0.2 = 1000
/// assert!((estimate.var - 2330.0).abs() < 1e-9);
/// ```
///
/// # Errors
///
/// As [`portfolio_stdev`], plus `RiskError::InvalidConfidence` outside (0, 1).
pub fn delta_normal_var(
    risk: &PortfolioRisk,
    factors: &RiskFactorVolatilities,
    horizon: f64,
    confidence: f64,
) -> Result<VarEstimate, RiskError> {
    check_confidence(confidence)?;
    let stdev = portfolio_stdev(risk, factors, horizon)?;
    let z = normal_quantile(confidence);
    let estimate = VarEstimate {
        method: VarMethod::DeltaNormal,
        confidence,
        var: z * stdev,
        expected_shortfall: stdev * norm_pdf(z) / (1.0 - confidence),
        stdev,
    };
    tracing::debug!(
        confidence,
        horizon,
        stdev,
        var = estimate.var,
        es = estimate.expected_shortfall,
        "delta-normal VaR"
    );
    Ok(estimate)
}

/// Historical VaR and Expected Shortfall from a P&L sample.
///
/// `pnl` holds profit-positive scenario P&L. Losses are ranked and VaR is
/// the empirical α-quantile of the loss distribution, taken as the
/// `⌈α·n⌉`-th smallest loss. Expected Shortfall is the mean of the losses
/// at or beyond that rank.
///
/// # Errors
///
/// - `RiskError::EmptySample` if `pnl` is empty
/// - `RiskError::InvalidConfidence` outside (0, 1)
/// - `RiskError::InvalidParameter` if the sample holds a non-finite value
pub fn historical_var(pnl: &[f64], confidence: f64) -> Result<VarEstimate, RiskError> {
    check_confidence(confidence)?;
    if pnl.is_empty() {
        return Err(RiskError::EmptySample);
    }
    if pnl.iter().any(|x| !x.is_finite()) {
        return Err(RiskError::parameter("pnl", "sample contains a non-finite value"));
    }

    let mut losses: Vec<f64> = pnl.iter().map(|x| -x).collect();
    losses.sort_by(f64::total_cmp);

    let n = losses.len();
    let rank = ((confidence * n as f64).ceil() as usize).clamp(1, n);
    let var = losses[rank - 1];
    let tail = &losses[rank - 1..];
    let expected_shortfall = tail.iter().sum::<f64>() / tail.len() as f64;

    let mean = pnl.iter().sum::<f64>() / n as f64;
    let stdev = if n > 1 {
        (pnl.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
    } else {
        0.0
    };

    tracing::debug!(samples = n, confidence, var, es = expected_shortfall, "historical VaR");
    Ok(VarEstimate {
        method: VarMethod::Historical,
        confidence,
        var,
        expected_shortfall,
        stdev,
    })
}
