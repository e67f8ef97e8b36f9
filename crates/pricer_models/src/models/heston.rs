//! Heston stochastic volatility parameters.
//!
//! ```text
//! dS = (r - q)·S·dt + √v·S·dW_S
//! dv = κ(θ - v)·dt + σ·√v·dW_v
//! E[dW_S·dW_v] = ρ·dt
//! ```

use super::error::{ensure, ModelError};

const MODEL: &str = "Heston";

/// Heston model parameters.
///
/// # Examples
/// ```
/// use pricer_models::models::HestonParams;
///
/// let params = HestonParams::new(0.04, 2.0, 0.04, 0.3, -0.7);
/// assert!(params.validate().is_ok());
/// assert!(params.satisfies_feller());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HestonParams {
    /// Initial variance v₀, >= 0
    pub v0: f64,
    /// Mean reversion speed κ, > 0
    pub kappa: f64,
    /// Long-run variance θ, >= 0
    pub theta: f64,
    /// Volatility of variance σ, >= 0
    pub sigma: f64,
    /// Spot/variance correlation ρ, in [-1, 1]
    pub rho: f64,
}

impl HestonParams {
    /// Builds a parameter set.
    pub fn new(v0: f64, kappa: f64, theta: f64, sigma: f64, rho: f64) -> Self {
        Self {
            v0,
            kappa,
            theta,
            sigma,
            rho,
        }
    }

    /// Checks every parameter against its domain.
    pub fn validate(&self) -> Result<(), ModelError> {
        ensure(self.v0 >= 0.0, MODEL, "v0", self.v0, "must be non-negative")?;
        ensure(self.kappa > 0.0, MODEL, "kappa", self.kappa, "must be positive")?;
        ensure(self.theta >= 0.0, MODEL, "theta", self.theta, "must be non-negative")?;
        ensure(self.sigma >= 0.0, MODEL, "sigma", self.sigma, "must be non-negative")?;
        ensure(
            (-1.0..=1.0).contains(&self.rho),
            MODEL,
            "rho",
            self.rho,
            "must lie in [-1, 1]",
        )
    }

    /// `2κθ / σ²`; the variance process stays positive when this is at least 1.
    pub fn feller_ratio(&self) -> f64 {
        if self.sigma == 0.0 {
            f64::INFINITY
        } else {
            2.0 * self.kappa * self.theta / (self.sigma * self.sigma)
        }
    }

    /// `true` when 2κθ >= σ².
    pub fn satisfies_feller(&self) -> bool {
        self.feller_ratio() >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feller() {
        let p = HestonParams::new(0.04, 1.0, 0.02, 0.5, -0.5);
        assert!(!p.satisfies_feller());
        assert!((p.feller_ratio() - 0.16).abs() < 1e-12);
        assert!(HestonParams::new(0.04, 1.0, 0.02, 0.0, 0.0).satisfies_feller());
    }

    #[test]
    fn test_validate() {
        assert!(HestonParams::new(0.04, 0.0, 0.04, 0.3, 0.0).validate().is_err());
        assert!(HestonParams::new(0.04, 1.0, 0.04, 0.3, -1.2).validate().is_err());
        assert!(HestonParams::new(-0.01, 1.0, 0.04, 0.3, 0.0).validate().is_err());
        assert!(HestonParams::new(f64::NAN, 1.0, 0.04, 0.3, 0.0).validate().is_err());
    }
}
