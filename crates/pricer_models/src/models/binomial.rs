//! Cox-Ross-Rubinstein lattice settings.

use super::monte_carlo::ConfigError;

/// Default number of CRR time steps.
pub const DEFAULT_BINOMIAL_STEPS: usize = 500;

/// Largest lattice accepted, including the one automatic refinement.
pub const MAX_BINOMIAL_STEPS: usize = 50_000;

/// Binomial tree configuration.
///
/// # Examples
/// ```
/// use pricer_models::models::BinomialConfig;
///
/// assert_eq!(BinomialConfig::default().steps, 500);
/// assert!(BinomialConfig::new(0).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BinomialConfig {
    /// Number of time steps
    pub steps: usize,
}

impl Default for BinomialConfig {
    fn default() -> Self {
        Self {
            steps: DEFAULT_BINOMIAL_STEPS,
        }
    }
}

impl BinomialConfig {
    /// Lattice with `steps` time steps.
    pub fn new(steps: usize) -> Self {
        Self { steps }
    }

    /// Checks the step count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps == 0 || self.steps > MAX_BINOMIAL_STEPS / 2 {
            return Err(ConfigError::InvalidStepCount(self.steps));
        }
        Ok(())
    }
}
