//! CLI error types.

use pricer_core::market_data::MarketDataError;
use pricer_core::types::PricingError;
use pricer_models::models::ConfigError as MonteCarloConfigError;
use pricer_risk::RiskError;
use thiserror::Error;

/// Errors surfaced by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Input or configuration file missing.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Malformed flag or input value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration that cannot be applied.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input file that does not deserialise.
    #[error("Failed to parse {path}: {message}")]
    Parse {
        /// Offending file
        path: String,
        /// Deserialiser message
        message: String,
    },

    /// Engine rejected the request.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Portfolio risk failed.
    #[error(transparent)]
    Risk(#[from] RiskError),

    /// Monte Carlo overrides out of range.
    #[error(transparent)]
    MonteCarlo(#[from] MonteCarloConfigError),

    /// Curve construction failed.
    #[error(transparent)]
    Curve(#[from] MarketDataError),

    /// Reading input or writing output failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Result serialisation failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
