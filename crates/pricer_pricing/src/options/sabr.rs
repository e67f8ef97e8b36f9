//! SABR pricing through the Hagan implied volatility and Black-76.

use pricer_core::types::PricingError;
use pricer_models::analytical::black76;
use pricer_models::instruments::OptionTerms;
use pricer_models::models::SabrParams;

/// Prices a European option under SABR.
///
/// The forward is `S·e^{(r-q)T}`; the Hagan lognormal volatility at the
/// strike is fed to Black-76 with discount `e^{-rT}`.
///
/// # Errors
///
/// `PricingError::Convergence` if the implied volatility expansion breaks
/// down (non-finite or negative).
///
/// # Examples
///
/// ```
/// use pricer_models::instruments::{OptionTerms, OptionType};
/// use pricer_models::models::SabrParams;
/// use pricer_pricing::options::sabr_price;
///
/// let terms = OptionTerms::new(100.0, 100.0, 1.0, 0.05, 0.0, 0.2, OptionType::Call);
/// let price = sabr_price(&terms, &SabrParams::new(0.2, 1.0, 0.0, 0.0)).unwrap();
/// assert!((price - 10.4506).abs() < 1e-3);
/// ```
pub fn sabr_price(terms: &OptionTerms, params: &SabrParams) -> Result<f64, PricingError> {
    let t = terms.time_to_expiration;
    if t <= 0.0 {
        return Ok(terms.intrinsic());
    }
    let forward = terms.forward();
    let vol = params.implied_vol(forward, terms.strike, t);
    if !vol.is_finite() || vol < 0.0 {
        return Err(PricingError::convergence(format!(
            "SABR implied volatility expansion failed at K = {}: σ = {}",
            terms.strike, vol
        )));
    }
    let discount = (-terms.risk_free_rate * t).exp();
    Ok(black76(terms.payoff, forward, terms.strike, t, vol, discount))
}

/// Lognormal at-the-money volatility implied by `params`, `α·F^{β-1}`.
pub fn sabr_reference_vol(terms: &OptionTerms, params: &SabrParams) -> f64 {
    params.alpha * terms.forward().powf(params.beta - 1.0)
}
