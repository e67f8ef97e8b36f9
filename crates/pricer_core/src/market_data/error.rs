//! Market data error types.
//!
//! This module provides structured error handling for yield curve
//! construction and lookups.

use crate::types::PricingError;
use thiserror::Error;

/// Market data operation errors.
///
/// # Examples
///
/// ```
/// use pricer_core::market_data::MarketDataError;
///
/// let err = MarketDataError::InvalidMaturity { t: -1.0 };
/// assert!(format!("{}", err).contains("-1"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// Invalid maturity (negative or non-finite time).
    #[error("Invalid maturity: t = {t}")]
    InvalidMaturity {
        /// The invalid maturity value
        t: f64,
    },

    /// Anchor maturities are not strictly increasing.
    #[error("Anchor maturities not strictly increasing at index {index}: {previous} >= {current}")]
    UnsortedAnchors {
        /// Index of the offending anchor
        index: usize,
        /// Maturity of the preceding anchor
        previous: f64,
        /// Maturity of the offending anchor
        current: f64,
    },

    /// Anchor discount factor is zero, negative or non-finite.
    #[error("Non-positive discount factor {df} at anchor {index}")]
    NonPositiveDiscountFactor {
        /// Index of the offending anchor
        index: usize,
        /// The rejected discount factor
        df: f64,
    },

    /// Insufficient data for construction.
    #[error("Insufficient data: got {got}, need {need}")]
    InsufficientData {
        /// Number of points provided
        got: usize,
        /// Minimum number of points required
        need: usize,
    },
}

impl From<MarketDataError> for PricingError {
    fn from(err: MarketDataError) -> Self {
        PricingError::Validation(err.to_string())
    }
}
