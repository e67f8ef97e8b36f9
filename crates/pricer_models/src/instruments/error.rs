//! Instrument error types.
//!
//! This module provides structured error handling for instrument
//! construction and validation.

use pricer_core::types::PricingError;
use thiserror::Error;

/// Instrument validation errors.
///
/// # Examples
///
/// ```
/// use pricer_models::instruments::InstrumentError;
///
/// let err = InstrumentError::InvalidStrike { strike: -1.0 };
/// assert_eq!(format!("{}", err), "Invalid strike: K = -1");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InstrumentError {
    /// Strike must be positive.
    #[error("Invalid strike: K = {strike}")]
    InvalidStrike {
        /// The invalid strike value
        strike: f64,
    },

    /// Spot must be positive.
    #[error("Invalid spot: S = {spot}")]
    InvalidSpot {
        /// The invalid spot value
        spot: f64,
    },

    /// Expiry must be non-negative.
    #[error("Invalid expiry: T = {expiry}")]
    InvalidExpiry {
        /// The invalid expiry value
        expiry: f64,
    },

    /// Volatility must be non-negative.
    #[error("Invalid volatility: sigma = {volatility}")]
    InvalidVolatility {
        /// The invalid volatility value
        volatility: f64,
    },

    /// Generic out-of-domain parameter.
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Why it was rejected
        message: String,
    },
}

impl InstrumentError {
    /// Shorthand for [`InstrumentError::InvalidParameter`].
    pub fn parameter(name: &'static str, message: impl Into<String>) -> Self {
        InstrumentError::InvalidParameter {
            name,
            message: message.into(),
        }
    }
}

impl From<InstrumentError> for PricingError {
    fn from(err: InstrumentError) -> Self {
        PricingError::Validation(err.to_string())
    }
}
