//! Risk aggregation error types.

use pricer_core::types::PricingError;
use thiserror::Error;

/// Errors raised while building or measuring a portfolio.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    /// Confidence level outside (0, 1).
    #[error("Invalid confidence level: {confidence}")]
    InvalidConfidence {
        /// The rejected level
        confidence: f64,
    },

    /// Negative or non-finite risk horizon.
    #[error("Invalid horizon: {horizon}")]
    InvalidHorizon {
        /// The rejected horizon in years
        horizon: f64,
    },

    /// Historical P&L sample with no observations.
    #[error("P&L sample is empty")]
    EmptySample,

    /// A market or position input outside its domain.
    #[error("Invalid {name}: {reason}")]
    InvalidParameter {
        /// Input name
        name: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// Pricing a position failed.
    #[error("Position {label}: {source}")]
    Pricing {
        /// Label of the failing position
        label: String,
        /// Underlying engine error
        #[source]
        source: PricingError,
    },
}

impl RiskError {
    /// Shorthand for [`RiskError::InvalidParameter`].
    pub fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        RiskError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
