//! Pricing model parameters.
//!
//! This module provides:
//! - [`PricingModel`]: Tagged union dispatched by the options engine
//! - [`HestonParams`], [`SabrParams`], [`JumpDiffusionParams`]: Model parameters
//! - [`MonteCarloConfig`], [`BinomialConfig`]: Numerical method settings
//! - [`ModelError`], [`ConfigError`]: Validation errors

pub mod binomial;
pub mod error;
pub mod heston;
pub mod jump_diffusion;
pub mod model_enum;
pub mod monte_carlo;
pub mod sabr;

pub use binomial::{BinomialConfig, DEFAULT_BINOMIAL_STEPS, MAX_BINOMIAL_STEPS};
pub use error::ModelError;
pub use heston::HestonParams;
pub use jump_diffusion::JumpDiffusionParams;
pub use model_enum::{ModelKind, PricingModel};
pub use monte_carlo::{
    ConfigError, MonteCarloConfig, MonteCarloConfigBuilder, VarianceReduction, MAX_PATHS,
    MAX_STEPS,
};
pub use sabr::SabrParams;
