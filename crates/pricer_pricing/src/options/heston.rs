//! Heston stochastic-volatility pricing by Fourier inversion.
//!
//! Uses the Lewis single-integral representation
//!
//! ```text
//! C = e^{-rT} [F - √(FK)/π ∫₀^∞ Re(e^{-iuk} φ(u - i/2)) / (u² + 1/4) du],   k = ln(K/F)
//! ```
//!
//! with a Black-Scholes control variate: the integral is taken over
//! `φ_BS - φ_H`, where `φ_BS` has the Heston expected total variance, and
//! the Black-Scholes price is added back. The characteristic function is
//! the rotation-count-free form of Gatheral (2006).

use num_complex::Complex64;
use pricer_core::types::{InstabilityKind, PricingError, PricingWarning};
use pricer_models::analytical::black76;
use pricer_models::instruments::{OptionTerms, OptionType};
use pricer_models::models::HestonParams;

/// Simpson step in the integration variable.
const STEP: f64 = 0.05;

/// Bounds of the truncated integration range.
const MIN_UPPER: f64 = 200.0;
const MAX_UPPER: f64 = 5_000.0;

/// Tail estimate, relative to the forward, above which truncation is reported.
const TAIL_TOLERANCE: f64 = 1e-9;

/// `g` magnitude below which the logarithm is replaced by its first-order term.
const SMALL_G: f64 = 1e-10;

/// Heston price with its diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct HestonPrice {
    /// Present value
    pub price: f64,
    /// Feller or truncation warnings
    pub warnings: Vec<PricingWarning>,
}

/// Characteristic function of `ln(S_T / F)` at complex argument `u`.
fn characteristic(u: Complex64, expiry: f64, p: &HestonParams) -> Complex64 {
    let i = Complex64::i();
    let alpha = -0.5 * u * u - 0.5 * i * u;
    let beta = p.kappa - p.rho * p.sigma * i * u;
    let gamma = 0.5 * p.sigma * p.sigma;
    let d = (beta * beta - 4.0 * alpha * gamma).sqrt();
    let beta_plus_d = beta + d;
    let r_minus = 2.0 * alpha / beta_plus_d;
    let g = 4.0 * alpha * gamma / (beta_plus_d * beta_plus_d);
    let decay = (-d * expiry).exp();

    let big_d = r_minus * (1.0 - decay) / (1.0 - g * decay);
    let log_term = if g.norm() < SMALL_G {
        4.0 * alpha * (1.0 - decay) / (beta_plus_d * beta_plus_d)
    } else {
        ((1.0 - g * decay) / (1.0 - g)).ln() * (2.0 / (p.sigma * p.sigma))
    };
    let big_c = p.kappa * (r_minus * expiry - log_term);
    (big_c * p.theta + big_d * p.v0).exp()
}

/// Expected integrated variance `∫₀^T E[v_t] dt`.
fn expected_total_variance(p: &HestonParams, expiry: f64) -> f64 {
    let mean_reversion = if p.kappa * expiry > 1e-8 {
        (1.0 - (-p.kappa * expiry).exp()) / p.kappa
    } else {
        expiry
    };
    p.theta * expiry + (p.v0 - p.theta) * mean_reversion
}

/// Prices a European option under Heston.
///
/// A violated Feller condition does not block the price; it is reported as
/// an `InstabilityKind::FellerCondition` warning.
///
/// # Errors
///
/// `PricingError::Convergence` if the integral is not finite.
///
/// # Examples
///
/// ```
/// use pricer_models::instruments::{OptionTerms, OptionType};
/// use pricer_models::models::HestonParams;
/// use pricer_pricing::options::heston_price;
///
/// let terms = OptionTerms::new(100.0, 100.0, 1.0, 0.05, 0.0, 0.2, OptionType::Call);
/// let params = HestonParams::new(0.04, 2.0, 0.04, 0.3, -0.7);
/// let result = heston_price(&terms, &params).unwrap();
/// assert!(result.price > 8.0 && result.price < 12.0);
/// assert!(result.warnings.is_empty());
/// ```
pub fn heston_price(
    terms: &OptionTerms,
    params: &HestonParams,
) -> Result<HestonPrice, PricingError> {
    let t = terms.time_to_expiration;
    let mut warnings = Vec::new();
    if !params.satisfies_feller() {
        let message = format!(
            "2κθ/σ² = {:.4} < 1: variance can reach zero",
            params.feller_ratio()
        );
        tracing::warn!(%message, "Feller condition violated");
        warnings.push(PricingWarning::instability(
            InstabilityKind::FellerCondition,
            message,
        ));
    }

    let discount = (-terms.risk_free_rate * t).exp();
    let forward = terms.forward();
    let strike = terms.strike;
    if t <= 0.0 {
        return Ok(HestonPrice {
            price: terms.intrinsic(),
            warnings,
        });
    }

    let w = expected_total_variance(params, t).max(0.0);
    let control_vol = (w / t).sqrt();
    let control_call = black76(OptionType::Call, forward, strike, t, control_vol, discount);

    let k = (strike / forward).ln();
    let shift = Complex64::new(0.0, -0.5);
    let integrand = |u: f64| -> f64 {
        let z = Complex64::new(u, 0.0) + shift;
        let phi_h = characteristic(z, t, params);
        let phi_bs = (-0.5 * w * (u * u + 0.25)).exp();
        let rotation = Complex64::new(0.0, -u * k).exp();
        (rotation * (phi_bs - phi_h)).re / (u * u + 0.25)
    };

    // The Heston tail decays like e^{-cu}, slower than the Black-Scholes
    // control, so the range is widened until the tail is negligible.
    let tolerance = TAIL_TOLERANCE * forward;
    let tail_at = |u: f64| integrand(u).abs() * u;
    let mut upper = (60.0 / w).sqrt().clamp(MIN_UPPER, MAX_UPPER);
    while upper < MAX_UPPER && tail_at(upper) > tolerance {
        upper = (2.0 * upper).min(MAX_UPPER);
    }
    let intervals = {
        let n = (upper / STEP).ceil() as usize;
        n + n % 2
    };
    let h = upper / intervals as f64;
    let mut sum = integrand(0.0) + integrand(upper);
    for j in 1..intervals {
        let weight = if j % 2 == 1 { 4.0 } else { 2.0 };
        sum += weight * integrand(j as f64 * h);
    }
    let integral = sum * h / 3.0;

    let tail = tail_at(upper);
    if tail > tolerance {
        let message = format!(
            "Fourier integral truncated at u = {:.0} with tail {:.2e}",
            upper, tail
        );
        tracing::warn!(%message, "Heston truncation");
        warnings.push(PricingWarning::instability(InstabilityKind::Truncation, message));
    }

    let call =
        control_call + discount * (forward * strike).sqrt() / std::f64::consts::PI * integral;
    if !call.is_finite() {
        return Err(PricingError::convergence(
            "Heston Fourier integral did not produce a finite value",
        ));
    }
    let raw = match terms.payoff {
        OptionType::Call => call,
        OptionType::Put => call - discount * (forward - strike),
    };
    if raw < -tolerance {
        let message = format!(
            "Heston {:?} value {:.3e} below zero floored to 0",
            terms.payoff, raw
        );
        tracing::warn!(%message, "Heston truncation");
        warnings.push(PricingWarning::instability(InstabilityKind::Truncation, message));
    }
    let price = raw.max(0.0);
    tracing::trace!(price, upper, intervals, "Heston Fourier price");
    Ok(HestonPrice { price, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pricer_models::analytical::BlackScholes;

    fn terms(payoff: OptionType, strike: f64) -> OptionTerms {
        OptionTerms::new(100.0, strike, 1.0, 0.05, 0.02, 0.2, payoff)
    }

    // ==========================================================
    // Characteristic function
    // ==========================================================

    #[test]
    fn test_characteristic_at_origin_is_one() {
        let p = HestonParams::new(0.04, 1.5, 0.05, 0.4, -0.6);
        let phi = characteristic(Complex64::new(0.0, 0.0), 1.0, &p);
        assert_abs_diff_eq!(phi.re, 1.0, epsilon = 1e-14);
        assert_abs_diff_eq!(phi.im, 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_martingale_condition() {
        // φ(-i) = E[S_T / F] = 1
        let p = HestonParams::new(0.04, 1.5, 0.05, 0.4, -0.6);
        let phi = characteristic(Complex64::new(0.0, -1.0), 2.0, &p);
        assert_abs_diff_eq!(phi.re, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(phi.im, 0.0, epsilon = 1e-12);
    }

    // ==========================================================
    // Prices
    // ==========================================================

    #[test]
    fn test_zero_vol_of_vol_reduces_to_black_scholes() {
        let p = HestonParams::new(0.04, 2.0, 0.04, 0.0, 0.0);
        let bs = BlackScholes::new(100.0, 0.05, 0.02, 0.2).unwrap();
        for strike in [80.0, 100.0, 120.0] {
            let h = heston_price(&terms(OptionType::Call, strike), &p).unwrap();
            assert_abs_diff_eq!(h.price, bs.price_call(strike, 1.0), epsilon = 1e-8);
        }
    }

    #[test]
    fn test_small_vol_of_vol_close_to_black_scholes() {
        let p = HestonParams::new(0.04, 2.0, 0.04, 1e-4, -0.5);
        let bs = BlackScholes::new(100.0, 0.05, 0.02, 0.2).unwrap().price_call(100.0, 1.0);
        let h = heston_price(&terms(OptionType::Call, 100.0), &p).unwrap();
        assert_abs_diff_eq!(h.price, bs, epsilon = 1e-4);
    }

    #[test]
    fn test_put_call_parity() {
        let p = HestonParams::new(0.05, 1.2, 0.06, 0.5, -0.7);
        let call = heston_price(&terms(OptionType::Call, 105.0), &p).unwrap().price;
        let put = heston_price(&terms(OptionType::Put, 105.0), &p).unwrap().price;
        let t = terms(OptionType::Call, 105.0);
        let parity = (-0.05f64).exp() * (t.forward() - 105.0);
        assert_abs_diff_eq!(call - put, parity, epsilon = 1e-10);
    }

    #[test]
    fn test_put_call_parity_far_strikes_high_vol_of_vol() {
        let p = HestonParams::new(0.04, 0.5, 0.04, 1.5, -0.9);
        for strike in [20.0, 40.0, 160.0] {
            let call_terms = OptionTerms::new(100.0, strike, 0.1, 0.05, 0.0, 0.2, OptionType::Call);
            let put_terms = OptionTerms::new(100.0, strike, 0.1, 0.05, 0.0, 0.2, OptionType::Put);
            let call = heston_price(&call_terms, &p).unwrap();
            let put = heston_price(&put_terms, &p).unwrap();
            assert!(call.price >= 0.0 && put.price >= 0.0);
            let parity = (-0.005f64).exp() * (call_terms.forward() - strike);
            assert_abs_diff_eq!(call.price - put.price, parity, epsilon = 1e-6);
            assert!(put
                .warnings
                .iter()
                .all(|w| w.instability_kind() != Some(InstabilityKind::Truncation)));
        }
    }

    #[test]
    fn test_negative_correlation_skews_prices() {
        // ρ < 0 fattens the left tail: low strikes gain relative to ρ = 0
        let neg = HestonParams::new(0.04, 1.5, 0.04, 0.5, -0.8);
        let zero = HestonParams::new(0.04, 1.5, 0.04, 0.5, 0.0);
        let put_neg = heston_price(&terms(OptionType::Put, 80.0), &neg).unwrap().price;
        let put_zero = heston_price(&terms(OptionType::Put, 80.0), &zero).unwrap().price;
        assert!(put_neg > put_zero);
    }

    #[test]
    fn test_feller_violation_warns() {
        let p = HestonParams::new(0.04, 0.5, 0.04, 1.0, -0.5);
        let h = heston_price(&terms(OptionType::Call, 100.0), &p).unwrap();
        assert!(h.price.is_finite() && h.price > 0.0);
        assert!(h
            .warnings
            .iter()
            .any(|w| w.instability_kind() == Some(InstabilityKind::FellerCondition)));
    }
}
