//! Merton (1976) jump-diffusion as a Poisson mixture of Black-Scholes prices.
//!
//! ```text
//! V = Σₙ e^{-λ'T} (λ'T)ⁿ / n! · BS(S, K, T, rₙ, σₙ)
//! λ' = λ(1 + k),  σₙ² = σ² + nδ²/T,  rₙ = r - λk + n·ln(1 + k)/T
//! ```
//!
//! where `k = E[J] - 1` is the mean relative jump.

use pricer_core::types::{InstabilityKind, PricingError, PricingWarning};
use pricer_models::analytical::BlackScholes;
use pricer_models::instruments::OptionTerms;
use pricer_models::models::JumpDiffusionParams;

/// Poisson weight still missing below which the series stops.
const WEIGHT_TOLERANCE: f64 = 1e-14;

/// Hard cap on the number of terms.
const MAX_TERMS: usize = 500;

/// Merton price with a truncation warning when the series was capped.
#[derive(Debug, Clone, PartialEq)]
pub struct MertonPrice {
    /// Present value
    pub price: f64,
    /// Terms summed
    pub terms: usize,
    /// Set when the series hit its cap before the tolerance
    pub warning: Option<PricingWarning>,
}

/// Prices a European option under Merton jump-diffusion.
///
/// # Errors
///
/// `PricingError::Validation` if `terms` cannot build a Black-Scholes model.
///
/// # Examples
///
/// ```
/// use pricer_models::analytical::BlackScholes;
/// use pricer_models::instruments::{OptionTerms, OptionType};
/// use pricer_models::models::JumpDiffusionParams;
/// use pricer_pricing::options::merton_price;
///
/// let terms = OptionTerms::new(100.0, 100.0, 1.0, 0.05, 0.0, 0.2, OptionType::Call);
///
/// // No jumps: plain Black-Scholes
/// let none = merton_price(&terms, &JumpDiffusionParams::new(0.0, -0.1, 0.2)).unwrap();
/// let bs = BlackScholes::new(100.0, 0.05, 0.0, 0.2).unwrap().price_call(100.0, 1.0);
/// assert!((none.price - bs).abs() < 1e-12);
///
/// // Jumps add variance
/// let jumps = merton_price(&terms, &JumpDiffusionParams::new(1.0, -0.1, 0.2)).unwrap();
/// assert!(jumps.price > bs);
/// ```
pub fn merton_price(
    terms: &OptionTerms,
    params: &JumpDiffusionParams,
) -> Result<MertonPrice, PricingError> {
    let t = terms.time_to_expiration;
    let (s, k_strike, r, q, sigma) = (
        terms.spot,
        terms.strike,
        terms.risk_free_rate,
        terms.dividend_yield,
        terms.volatility,
    );
    if t <= 0.0 {
        return Ok(MertonPrice {
            price: terms.intrinsic(),
            terms: 0,
            warning: None,
        });
    }

    let k = params.mean_jump();
    let lambda_t = params.intensity * (1.0 + k) * t;
    let log_jump = (1.0 + k).ln();

    // Poisson weights in log space so that large λ'T does not underflow
    let mut log_weight = -lambda_t;
    let mut cumulative = 0.0;
    let mut price = 0.0;
    let mut n = 0;
    while n < MAX_TERMS {
        if n > 0 {
            log_weight += lambda_t.ln() - (n as f64).ln();
        }
        let weight = log_weight.exp();
        let nf = n as f64;
        let sigma_n = (sigma * sigma + nf * params.jump_vol * params.jump_vol / t).sqrt();
        let r_n = r - params.intensity * k + nf * log_jump / t;
        let bs = BlackScholes::new(s, r_n, q, sigma_n)?;
        price += weight * bs.price(terms.payoff, k_strike, t);
        cumulative += weight;
        n += 1;
        if 1.0 - cumulative < WEIGHT_TOLERANCE {
            break;
        }
    }

    let missing = 1.0 - cumulative;
    let warning = (missing >= WEIGHT_TOLERANCE && n >= MAX_TERMS).then(|| {
        tracing::warn!(terms = n, missing, "Merton series truncated");
        PricingWarning::instability(
            InstabilityKind::Truncation,
            format!("Merton series stopped after {} terms with weight {:.2e} missing", n, missing),
        )
    });
    Ok(MertonPrice {
        price,
        terms: n,
        warning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pricer_models::instruments::OptionType;

    fn terms(payoff: OptionType) -> OptionTerms {
        OptionTerms::new(100.0, 100.0, 0.5, 0.05, 0.01, 0.25, payoff)
    }

    #[test]
    fn test_put_call_parity_holds() {
        let p = JumpDiffusionParams::new(0.8, -0.15, 0.3);
        let call = merton_price(&terms(OptionType::Call), &p).unwrap().price;
        let put = merton_price(&terms(OptionType::Put), &p).unwrap().price;
        let t = terms(OptionType::Call);
        let parity = 100.0 * (-0.01f64 * 0.5).exp() - 100.0 * (-0.05f64 * 0.5).exp();
        assert_abs_diff_eq!(call - put, parity, epsilon = 1e-9);
        assert!(t.forward() > 100.0);
    }

    #[test]
    fn test_deterministic_jumps_shift_drift_only() {
        // δ = 0 and mean jump zero: same as Black-Scholes
        let p = JumpDiffusionParams::new(2.0, 0.0, 0.0);
        let m = merton_price(&terms(OptionType::Call), &p).unwrap();
        let bs = BlackScholes::new(100.0, 0.05, 0.01, 0.25).unwrap().price_call(100.0, 0.5);
        assert_abs_diff_eq!(m.price, bs, epsilon = 1e-10);
        assert!(m.warning.is_none());
    }

    #[test]
    fn test_series_terminates_early() {
        let p = JumpDiffusionParams::new(0.5, -0.1, 0.2);
        let m = merton_price(&terms(OptionType::Call), &p).unwrap();
        assert!(m.terms < 30);
        assert!(m.warning.is_none());
    }

    #[test]
    fn test_huge_intensity_is_truncated() {
        let p = JumpDiffusionParams::new(2_000.0, 0.0, 0.01);
        let m = merton_price(&terms(OptionType::Call), &p).unwrap();
        assert_eq!(m.terms, MAX_TERMS);
        assert_eq!(
            m.warning.and_then(|w| w.instability_kind()),
            Some(InstabilityKind::Truncation)
        );
    }
}
