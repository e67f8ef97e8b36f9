//! Option pricing requests and results.

use pricer_core::types::PricingWarning;
use pricer_models::greeks::GreeksSet;
use pricer_models::instruments::{ExoticPayoff, OptionTerms};
use pricer_models::models::{ModelKind, MonteCarloConfig, PricingModel};

use super::greeks::GreeksConfig;
use crate::exotic::LookbackExtrema;

/// Everything needed to price one option.
///
/// # Examples
///
/// ```
/// use pricer_models::instruments::{OptionTerms, OptionType};
/// use pricer_models::models::{BinomialConfig, PricingModel};
/// use pricer_pricing::options::OptionRequest;
///
/// let terms = OptionTerms::new(100.0, 100.0, 0.25, 0.05, 0.0, 0.2, OptionType::Call);
/// let request = OptionRequest::new(terms).with_model(PricingModel::BinomialTree(BinomialConfig::new(800)));
/// assert!(request.exotic.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptionRequest {
    /// Contract and market inputs
    pub terms: OptionTerms,
    /// Requested model and its parameters
    #[cfg_attr(feature = "serde", serde(default))]
    pub model: PricingModel,
    /// Path-dependent payoff replacing the vanilla one
    #[cfg_attr(feature = "serde", serde(default))]
    pub exotic: Option<ExoticPayoff>,
    /// Simulation settings used when a route falls back to Monte Carlo
    #[cfg_attr(feature = "serde", serde(default))]
    pub monte_carlo: Option<MonteCarloConfig>,
    /// Finite-difference bump sizes
    #[cfg_attr(feature = "serde", serde(default))]
    pub greeks: GreeksConfig,
}

impl OptionRequest {
    /// Black-Scholes request for a vanilla payoff.
    pub fn new(terms: OptionTerms) -> Self {
        Self {
            terms,
            model: PricingModel::default(),
            exotic: None,
            monte_carlo: None,
            greeks: GreeksConfig::default(),
        }
    }

    /// Sets the model.
    pub fn with_model(mut self, model: PricingModel) -> Self {
        self.model = model;
        self
    }

    /// Sets a path-dependent payoff.
    pub fn with_exotic(mut self, payoff: ExoticPayoff) -> Self {
        self.exotic = Some(payoff);
        self
    }

    /// Sets the Monte Carlo settings used by fallback routes.
    pub fn with_monte_carlo(mut self, config: MonteCarloConfig) -> Self {
        self.monte_carlo = Some(config);
        self
    }

    /// Sets the finite-difference bump sizes.
    pub fn with_greeks(mut self, config: GreeksConfig) -> Self {
        self.greeks = config;
        self
    }
}

/// Price, sensitivities and diagnostics of an option or strategy.
///
/// Unbounded `max_profit` or `max_loss` are `±∞`, which serialise to JSON
/// `null`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptionResult {
    /// Present value under `model`
    pub fair_value: f64,
    /// Model that produced `fair_value`
    pub model: ModelKind,
    /// All eleven Greeks
    pub greeks: GreeksSet,
    /// Underlying prices at which P&L at expiry is zero
    pub breakeven_prices: Vec<f64>,
    /// Supremum of P&L at expiry
    pub max_profit: f64,
    /// Infimum of P&L at expiry
    pub max_loss: f64,
    /// Probability that the barrier is touched before expiry
    pub barrier_knock_probability: Option<f64>,
    /// Expected average of the underlying over the observation dates
    pub asian_average_price: Option<f64>,
    /// Expected path minimum and maximum
    pub lookback_extrema: Option<LookbackExtrema>,
    /// Monte Carlo standard error
    pub standard_error: Option<f64>,
    /// Monte Carlo 95% confidence interval
    pub confidence_interval: Option<(f64, f64)>,
    /// Non-fatal diagnostics
    pub warnings: Vec<PricingWarning>,
}

impl OptionResult {
    pub(crate) fn priced(fair_value: f64, model: ModelKind) -> Self {
        Self {
            fair_value,
            model,
            greeks: GreeksSet::zero(),
            breakeven_prices: Vec::new(),
            max_profit: 0.0,
            max_loss: 0.0,
            barrier_knock_probability: None,
            asian_average_price: None,
            lookback_extrema: None,
            standard_error: None,
            confidence_interval: None,
            warnings: Vec::new(),
        }
    }
}
