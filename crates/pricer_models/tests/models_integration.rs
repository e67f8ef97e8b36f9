//! Cross-module checks for instrument terms and model parameters.

use approx::assert_relative_eq;
use pricer_models::analytical::{black76, BlackScholes};
use pricer_models::instruments::{OptionTerms, OptionType};
use pricer_models::models::{PricingModel, SabrParams};

#[test]
fn test_zero_vol_terms_match_black_scholes_limit() {
    let terms = OptionTerms::new(100.0, 95.0, 0.5, 0.04, 0.01, 0.0, OptionType::Call);
    let bs =
        BlackScholes::new(terms.spot, terms.risk_free_rate, terms.dividend_yield, 0.0).unwrap();
    assert_eq!(
        bs.price(terms.payoff, terms.strike, terms.time_to_expiration),
        terms.discounted_intrinsic()
    );
}

#[test]
fn test_lognormal_sabr_without_volvol_is_black() {
    let sabr = SabrParams::new(0.25, 1.0, 0.0, 0.3);
    let terms = OptionTerms::new(100.0, 110.0, 1.0, 0.03, 0.0, 0.25, OptionType::Put);
    let forward = terms.forward();
    let vol = sabr.implied_vol(forward, terms.strike, terms.time_to_expiration);
    let df = (-terms.risk_free_rate * terms.time_to_expiration).exp();
    let price = black76(terms.payoff, forward, terms.strike, terms.time_to_expiration, vol, df);

    let bs = BlackScholes::new(100.0, 0.03, 0.0, 0.25).unwrap();
    assert_relative_eq!(price, bs.price_put(110.0, 1.0), max_relative = 1e-12);
    assert!(PricingModel::Sabr(sabr).validate().is_ok());
}
