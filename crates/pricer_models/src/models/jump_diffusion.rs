//! Merton jump-diffusion parameters.
//!
//! Log-price jumps arrive as a Poisson process with intensity λ, each jump
//! multiplying the spot by `J` with `ln J ~ N(μ_J, δ²)`.

use super::error::{ensure, ModelError};

const MODEL: &str = "JumpDiffusion";

/// Merton jump parameters; diffusion volatility comes from the option terms.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JumpDiffusionParams {
    /// Jump arrival rate λ per year, >= 0
    pub intensity: f64,
    /// Mean of the log jump size μ_J
    pub jump_mean: f64,
    /// Standard deviation of the log jump size δ, >= 0
    pub jump_vol: f64,
}

impl JumpDiffusionParams {
    /// Builds a parameter set.
    pub fn new(intensity: f64, jump_mean: f64, jump_vol: f64) -> Self {
        Self {
            intensity,
            jump_mean,
            jump_vol,
        }
    }

    /// Checks every parameter against its domain.
    pub fn validate(&self) -> Result<(), ModelError> {
        ensure(
            self.intensity >= 0.0,
            MODEL,
            "intensity",
            self.intensity,
            "must be non-negative",
        )?;
        ensure(true, MODEL, "jump_mean", self.jump_mean, "must be finite")?;
        ensure(
            self.jump_vol >= 0.0,
            MODEL,
            "jump_vol",
            self.jump_vol,
            "must be non-negative",
        )
    }

    /// Expected relative jump `k = E[J] - 1 = exp(μ_J + δ²/2) - 1`.
    pub fn mean_jump(&self) -> f64 {
        (self.jump_mean + 0.5 * self.jump_vol * self.jump_vol).exp() - 1.0
    }
}
