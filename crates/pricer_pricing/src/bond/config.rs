//! Bond engine tunables.

use pricer_core::types::PricingError;

/// Smallest accepted yield bump for effective duration (1bp).
pub const MIN_YIELD_BUMP: f64 = 1e-4;

/// Largest accepted yield bump for effective duration (10bp).
pub const MAX_YIELD_BUMP: f64 = 1e-3;

/// Upper bound on lattice steps.
pub const MAX_LATTICE_STEPS: usize = 5_000;

/// Upper bound on credit default trials.
pub const MAX_CREDIT_TRIALS: usize = 10_000;

/// Numerical settings of the bond engine.
///
/// # Examples
///
/// ```
/// use pricer_pricing::bond::BondEngineConfig;
///
/// let config = BondEngineConfig::default().with_yield_bump(5e-4).with_lattice_steps(360);
/// assert!(config.validate().is_ok());
/// assert!(BondEngineConfig::default().with_yield_bump(0.01).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BondEngineConfig {
    /// Parallel shift for effective duration and convexity, 1bp to 10bp
    pub yield_bump: f64,
    /// Minimum number of short-rate lattice steps; rounded up to a whole
    /// number of steps per coupon period
    pub lattice_steps: usize,
    /// Search interval for the option-adjusted spread
    pub oas_bracket: (f64, f64),
    /// Independent default trials in the credit loss distribution
    pub credit_trials: usize,
}

impl Default for BondEngineConfig {
    fn default() -> Self {
        Self {
            yield_bump: MIN_YIELD_BUMP,
            lattice_steps: 240,
            oas_bracket: (-0.1, 1.0),
            credit_trials: 1,
        }
    }
}

impl BondEngineConfig {
    /// Sets the effective-duration bump.
    pub fn with_yield_bump(mut self, bump: f64) -> Self {
        self.yield_bump = bump;
        self
    }

    /// Sets the minimum lattice step count.
    pub fn with_lattice_steps(mut self, steps: usize) -> Self {
        self.lattice_steps = steps;
        self
    }

    /// Sets the OAS search interval.
    pub fn with_oas_bracket(mut self, lo: f64, hi: f64) -> Self {
        self.oas_bracket = (lo, hi);
        self
    }

    /// Sets the number of default trials.
    pub fn with_credit_trials(mut self, trials: usize) -> Self {
        self.credit_trials = trials;
        self
    }

    /// Checks every setting against its range.
    pub fn validate(&self) -> Result<(), PricingError> {
        if !(MIN_YIELD_BUMP..=MAX_YIELD_BUMP).contains(&self.yield_bump) {
            return Err(PricingError::validation(format!(
                "yield_bump {} outside [1bp, 10bp]",
                self.yield_bump
            )));
        }
        if !(1..=MAX_LATTICE_STEPS).contains(&self.lattice_steps) {
            return Err(PricingError::validation(format!(
                "lattice_steps {} outside [1, {}]",
                self.lattice_steps, MAX_LATTICE_STEPS
            )));
        }
        let (lo, hi) = self.oas_bracket;
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(PricingError::validation(format!(
                "oas_bracket ({}, {}) is not an increasing finite interval",
                lo, hi
            )));
        }
        if !(1..=MAX_CREDIT_TRIALS).contains(&self.credit_trials) {
            return Err(PricingError::validation(format!(
                "credit_trials {} outside [1, {}]",
                self.credit_trials, MAX_CREDIT_TRIALS
            )));
        }
        Ok(())
    }
}
