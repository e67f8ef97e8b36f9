//! SABR stochastic volatility parameters and the Hagan implied volatility.
//!
//! ```text
//! dF = α·F^β·dW_F
//! dα = ν·α·dW_α
//! E[dW_F·dW_α] = ρ·dt
//! ```
//!
//! Options are valued by feeding the Hagan et al. (2002) lognormal implied
//! volatility into Black-76 on the forward. Near the money
//! (|ln(F/K)| below [`ATM_THRESHOLD`]) the z/x(z) singularity is removed by
//! its series expansion.

use super::error::{ensure, ModelError};

const MODEL: &str = "SABR";

/// |ln(F/K)| below which the at-the-money expansion is used.
pub const ATM_THRESHOLD: f64 = 1e-7;

/// SABR model parameters.
///
/// # Examples
/// ```
/// use pricer_models::models::SabrParams;
///
/// let params = SabrParams::new(0.2, 1.0, 0.0, 0.0);
/// // β = 1 and ν = 0 reduces to flat lognormal volatility α
/// let vol = params.implied_vol(100.0, 120.0, 1.0);
/// assert!((vol - 0.2).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SabrParams {
    /// Initial volatility α, > 0
    pub alpha: f64,
    /// CEV exponent β, in [0, 1]
    pub beta: f64,
    /// Volatility of volatility ν, >= 0
    pub nu: f64,
    /// Forward/volatility correlation ρ, in (-1, 1)
    pub rho: f64,
}

impl SabrParams {
    /// Builds a parameter set.
    pub fn new(alpha: f64, beta: f64, nu: f64, rho: f64) -> Self {
        Self {
            alpha,
            beta,
            nu,
            rho,
        }
    }

    /// Checks every parameter against its domain.
    pub fn validate(&self) -> Result<(), ModelError> {
        ensure(self.alpha > 0.0, MODEL, "alpha", self.alpha, "must be positive")?;
        ensure(
            (0.0..=1.0).contains(&self.beta),
            MODEL,
            "beta",
            self.beta,
            "must lie in [0, 1]",
        )?;
        ensure(self.nu >= 0.0, MODEL, "nu", self.nu, "must be non-negative")?;
        ensure(
            self.rho > -1.0 && self.rho < 1.0,
            MODEL,
            "rho",
            self.rho,
            "must lie in (-1, 1)",
        )
    }

    /// Hagan lognormal (Black) implied volatility for `strike` on `forward`.
    pub fn implied_vol(&self, forward: f64, strike: f64, expiry: f64) -> f64 {
        let (alpha, beta, nu, rho) = (self.alpha, self.beta, self.nu, self.rho);
        let omb = 1.0 - beta;
        let log_fk = (forward / strike).ln();
        let fk_pow_half = (forward * strike).powf(0.5 * omb);

        let log_fk_2 = log_fk * log_fk;
        let denominator = fk_pow_half
            * (1.0 + omb * omb / 24.0 * log_fk_2 + omb.powi(4) / 1920.0 * log_fk_2 * log_fk_2);

        let correction = 1.0
            + (omb * omb / 24.0 * alpha * alpha / (fk_pow_half * fk_pow_half)
                + 0.25 * rho * beta * nu * alpha / fk_pow_half
                + (2.0 - 3.0 * rho * rho) / 24.0 * nu * nu)
                * expiry;

        let z_over_x = if log_fk.abs() < ATM_THRESHOLD {
            1.0
        } else {
            let z = nu / alpha * fk_pow_half * log_fk;
            z_over_x(z, rho)
        };

        alpha / denominator * z_over_x * correction
    }
}

/// `z / x(z)` with `x(z) = ln((√(1 - 2ρz + z²) + z - ρ) / (1 - ρ))`.
fn z_over_x(z: f64, rho: f64) -> f64 {
    if z.abs() < 1e-6 {
        // Second-order series around z = 0
        return 1.0 - 0.5 * rho * z + (2.0 - 3.0 * rho * rho) / 12.0 * z * z;
    }
    let root = (1.0 - 2.0 * rho * z + z * z).max(0.0).sqrt();
    let x = ((root + z - rho) / (1.0 - rho)).ln();
    z / x
}
