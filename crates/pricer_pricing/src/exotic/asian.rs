//! Discretely sampled Asian options.
//!
//! Observations are equally spaced at `t_i = i·T/m`, `i = 1..m`. The
//! geometric average of GBM is lognormal, which gives a closed form
//! (Kemna and Vorst); the arithmetic average has none and is simulated.

use pricer_models::analytical::black76;
use pricer_models::instruments::{AveragingType, OptionTerms};

/// Mean and variance of `ln G`, the log geometric average.
fn geometric_moments(terms: &OptionTerms, observations: usize) -> (f64, f64) {
    let m = observations.max(1) as f64;
    let t = terms.time_to_expiration;
    let sigma = terms.volatility;
    let nu = terms.risk_free_rate - terms.dividend_yield - 0.5 * sigma * sigma;
    let mean = terms.spot.ln() + nu * t * (m + 1.0) / (2.0 * m);
    let variance = sigma * sigma * t * (m + 1.0) * (2.0 * m + 1.0) / (6.0 * m * m);
    (mean, variance)
}

/// Closed-form value of a geometric-average Asian option.
///
/// # Examples
///
/// ```
/// use pricer_models::analytical::BlackScholes;
/// use pricer_models::instruments::{OptionTerms, OptionType};
/// use pricer_pricing::exotic::geometric_asian_price;
///
/// let terms = OptionTerms::new(100.0, 100.0, 1.0, 0.05, 0.0, 0.2, OptionType::Call);
/// let asian = geometric_asian_price(&terms, 12);
/// let vanilla = BlackScholes::new(100.0, 0.05, 0.0, 0.2).unwrap().price_call(100.0, 1.0);
/// assert!(asian < vanilla);
///
/// // A single observation at expiry is the vanilla option
/// assert!((geometric_asian_price(&terms, 1) - vanilla).abs() < 1e-10);
/// ```
pub fn geometric_asian_price(terms: &OptionTerms, observations: usize) -> f64 {
    let t = terms.time_to_expiration;
    let (mean, variance) = geometric_moments(terms, observations);
    let forward = (mean + 0.5 * variance).exp();
    let vol = if t > 0.0 { (variance / t).sqrt() } else { 0.0 };
    black76(
        terms.payoff,
        forward,
        terms.strike,
        t,
        vol,
        (-terms.risk_free_rate * t).exp(),
    )
}

/// Expected average of the observed prices under the pricing measure.
pub fn expected_average(terms: &OptionTerms, observations: usize, averaging: AveragingType) -> f64 {
    match averaging {
        AveragingType::Geometric => {
            let (mean, variance) = geometric_moments(terms, observations);
            (mean + 0.5 * variance).exp()
        }
        AveragingType::Arithmetic => {
            let m = observations.max(1);
            let carry = terms.risk_free_rate - terms.dividend_yield;
            let dt = terms.time_to_expiration / m as f64;
            (1..=m)
                .map(|i| terms.spot * (carry * dt * i as f64).exp())
                .sum::<f64>()
                / m as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pricer_models::instruments::OptionType;

    fn terms(payoff: OptionType) -> OptionTerms {
        OptionTerms::new(100.0, 100.0, 1.0, 0.05, 0.02, 0.3, payoff)
    }

    #[test]
    fn test_geometric_put_call_parity() {
        let call = geometric_asian_price(&terms(OptionType::Call), 52);
        let put = geometric_asian_price(&terms(OptionType::Put), 52);
        let df = (-0.05f64).exp();
        let forward = expected_average(&terms(OptionType::Call), 52, AveragingType::Geometric);
        assert_relative_eq!(call - put, df * (forward - 100.0), epsilon = 1e-10);
    }

    #[test]
    fn test_more_observations_lower_variance() {
        let (_, v4) = geometric_moments(&terms(OptionType::Call), 4);
        let (_, v250) = geometric_moments(&terms(OptionType::Call), 250);
        assert!(v250 < v4);
        // Continuous-averaging limit σ²T/3
        assert_relative_eq!(v250, 0.09 / 3.0, max_relative = 0.01);
    }

    #[test]
    fn test_arithmetic_average_exceeds_geometric() {
        let t = terms(OptionType::Call);
        let arithmetic = expected_average(&t, 12, AveragingType::Arithmetic);
        let geometric = expected_average(&t, 12, AveragingType::Geometric);
        assert!(arithmetic > geometric);
    }

    #[test]
    fn test_zero_vol_average_is_forward_mean() {
        let mut t = terms(OptionType::Call);
        t.volatility = 0.0;
        let a = expected_average(&t, 4, AveragingType::Arithmetic);
        let g = expected_average(&t, 4, AveragingType::Geometric);
        // Geometric mean of the deterministic forwards
        let expected_g = 100.0 * (0.03f64 * 0.625).exp();
        assert_relative_eq!(g, expected_g, epsilon = 1e-10);
        assert!(a >= g);
    }
}
