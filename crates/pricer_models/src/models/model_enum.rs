//! Static dispatch enum over pricing models.
//!
//! [`PricingModel`] is a closed tagged union: each variant carries the
//! parameters its engine needs, and the pricing layer dispatches with one
//! exhaustive `match`. Adding a model means adding a variant and letting
//! the compiler point at every dispatch site.
//!
//! ## Example
//!
//! ```
//! use pricer_models::models::{HestonParams, ModelKind, PricingModel};
//!
//! let model = PricingModel::Heston(HestonParams::new(0.04, 2.0, 0.04, 0.3, -0.7));
//! assert_eq!(model.kind(), ModelKind::Heston);
//! assert!(model.validate().is_ok());
//! assert_eq!(ModelKind::Heston.to_string(), "Heston");
//! ```

use std::fmt;

use super::binomial::BinomialConfig;
use super::error::ModelError;
use super::heston::HestonParams;
use super::jump_diffusion::JumpDiffusionParams;
use super::monte_carlo::MonteCarloConfig;
use super::sabr::SabrParams;

/// Model requested for an option, with its parameters.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "model", rename_all = "snake_case"))]
pub enum PricingModel {
    /// Closed-form lognormal model.
    #[default]
    BlackScholes,
    /// Cox-Ross-Rubinstein lattice.
    BinomialTree(BinomialConfig),
    /// Geometric Brownian motion simulation.
    MonteCarlo(MonteCarloConfig),
    /// Heston stochastic volatility.
    Heston(HestonParams),
    /// SABR stochastic volatility.
    Sabr(SabrParams),
    /// Merton jump diffusion.
    JumpDiffusion(JumpDiffusionParams),
}

impl PricingModel {
    /// Parameter-free identifier of the variant.
    pub fn kind(&self) -> ModelKind {
        match self {
            PricingModel::BlackScholes => ModelKind::BlackScholes,
            PricingModel::BinomialTree(_) => ModelKind::BinomialTree,
            PricingModel::MonteCarlo(_) => ModelKind::MonteCarlo,
            PricingModel::Heston(_) => ModelKind::Heston,
            PricingModel::Sabr(_) => ModelKind::Sabr,
            PricingModel::JumpDiffusion(_) => ModelKind::JumpDiffusion,
        }
    }

    /// Validates the carried parameters.
    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            PricingModel::BlackScholes => Ok(()),
            PricingModel::BinomialTree(cfg) => Ok(cfg.validate()?),
            PricingModel::MonteCarlo(cfg) => Ok(cfg.validate()?),
            PricingModel::Heston(p) => p.validate(),
            PricingModel::Sabr(p) => p.validate(),
            PricingModel::JumpDiffusion(p) => p.validate(),
        }
    }

    /// `true` for models with a stochastic variance or jump component.
    pub fn has_non_gbm_dynamics(&self) -> bool {
        matches!(
            self,
            PricingModel::Heston(_) | PricingModel::Sabr(_) | PricingModel::JumpDiffusion(_)
        )
    }
}

/// Model identifier reported on results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ModelKind {
    /// Closed-form Black-Scholes
    BlackScholes,
    /// CRR lattice
    BinomialTree,
    /// Monte Carlo simulation
    MonteCarlo,
    /// Heston
    Heston,
    /// SABR
    Sabr,
    /// Merton jump diffusion
    JumpDiffusion,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelKind::BlackScholes => "BlackScholes",
            ModelKind::BinomialTree => "BinomialTree",
            ModelKind::MonteCarlo => "MonteCarlo",
            ModelKind::Heston => "Heston",
            ModelKind::Sabr => "SABR",
            ModelKind::JumpDiffusion => "JumpDiffusion",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(PricingModel::default().kind(), ModelKind::BlackScholes);
        assert_eq!(
            PricingModel::BinomialTree(BinomialConfig::default()).kind(),
            ModelKind::BinomialTree
        );
        assert_eq!(
            PricingModel::MonteCarlo(MonteCarloConfig::default()).kind(),
            ModelKind::MonteCarlo
        );
    }

    #[test]
    fn test_validate_forwards_errors() {
        let bad = PricingModel::Sabr(SabrParams::new(-0.1, 0.5, 0.3, 0.0));
        assert!(bad.validate().is_err());
        let bad = PricingModel::BinomialTree(BinomialConfig::new(0));
        assert!(matches!(bad.validate(), Err(ModelError::Config(_))));
    }

    #[test]
    fn test_non_gbm_dynamics() {
        assert!(!PricingModel::BlackScholes.has_non_gbm_dynamics());
        assert!(PricingModel::JumpDiffusion(JumpDiffusionParams::new(0.5, 0.0, 0.1))
            .has_non_gbm_dynamics());
    }
}
