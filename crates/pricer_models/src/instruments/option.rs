//! Vanilla option terms.

use super::error::InstrumentError;

/// Call or put payoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OptionType {
    /// Right to buy at the strike.
    Call,
    /// Right to sell at the strike.
    Put,
}

impl OptionType {
    /// +1 for calls, -1 for puts.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }

    /// Exercise value `max(±(s - k), 0)`.
    #[inline]
    pub fn intrinsic(self, spot: f64, strike: f64) -> f64 {
        (self.sign() * (spot - strike)).max(0.0)
    }

    /// `true` for calls.
    #[inline]
    pub fn is_call(self) -> bool {
        matches!(self, OptionType::Call)
    }
}

/// When the holder may exercise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ExerciseStyle {
    /// Exercise at expiry only.
    #[default]
    European,
    /// Exercise at any time up to expiry.
    American,
}

/// Terms of a single-underlying option with continuous dividend yield.
///
/// # Example
///
/// ```
/// use pricer_models::instruments::{ExerciseStyle, OptionTerms, OptionType};
///
/// let terms = OptionTerms::new(100.0, 100.0, 0.25, 0.05, 0.0, 0.2, OptionType::Call);
/// assert!(terms.validate().is_ok());
/// assert_eq!(terms.style, ExerciseStyle::European);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptionTerms {
    /// Underlying spot price, > 0
    pub spot: f64,
    /// Strike price, > 0
    pub strike: f64,
    /// Time to expiration in years, >= 0
    pub time_to_expiration: f64,
    /// Continuously compounded risk-free rate
    pub risk_free_rate: f64,
    /// Continuous dividend yield
    pub dividend_yield: f64,
    /// Black-Scholes volatility, >= 0
    pub volatility: f64,
    /// Exercise style
    #[cfg_attr(feature = "serde", serde(default))]
    pub style: ExerciseStyle,
    /// Call or put
    pub payoff: OptionType,
}

impl OptionTerms {
    /// European option terms.
    pub fn new(
        spot: f64,
        strike: f64,
        time_to_expiration: f64,
        risk_free_rate: f64,
        dividend_yield: f64,
        volatility: f64,
        payoff: OptionType,
    ) -> Self {
        Self {
            spot,
            strike,
            time_to_expiration,
            risk_free_rate,
            dividend_yield,
            volatility,
            style: ExerciseStyle::European,
            payoff,
        }
    }

    /// Returns a copy with the given exercise style.
    pub fn with_style(mut self, style: ExerciseStyle) -> Self {
        self.style = style;
        self
    }

    /// Checks every field against its domain.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        if !(self.spot.is_finite() && self.spot > 0.0) {
            return Err(InstrumentError::InvalidSpot { spot: self.spot });
        }
        if !(self.strike.is_finite() && self.strike > 0.0) {
            return Err(InstrumentError::InvalidStrike {
                strike: self.strike,
            });
        }
        if !(self.time_to_expiration.is_finite() && self.time_to_expiration >= 0.0) {
            return Err(InstrumentError::InvalidExpiry {
                expiry: self.time_to_expiration,
            });
        }
        if !(self.volatility.is_finite() && self.volatility >= 0.0) {
            return Err(InstrumentError::InvalidVolatility {
                volatility: self.volatility,
            });
        }
        if !self.risk_free_rate.is_finite() {
            return Err(InstrumentError::parameter("risk_free_rate", "must be finite"));
        }
        if !self.dividend_yield.is_finite() {
            return Err(InstrumentError::parameter("dividend_yield", "must be finite"));
        }
        Ok(())
    }

    /// Intrinsic value at the current spot.
    pub fn intrinsic(&self) -> f64 {
        self.payoff.intrinsic(self.spot, self.strike)
    }

    /// `max(±(S·e^{-qT} - K·e^{-rT}), 0)`: value when the path is deterministic.
    pub fn discounted_intrinsic(&self) -> f64 {
        let t = self.time_to_expiration;
        let pv_spot = self.spot * (-self.dividend_yield * t).exp();
        let pv_strike = self.strike * (-self.risk_free_rate * t).exp();
        (self.payoff.sign() * (pv_spot - pv_strike)).max(0.0)
    }

    /// Forward price `S·e^{(r-q)T}`.
    pub fn forward(&self) -> f64 {
        self.spot * ((self.risk_free_rate - self.dividend_yield) * self.time_to_expiration).exp()
    }
}
