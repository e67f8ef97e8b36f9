//! Cox-Ross-Rubinstein binomial lattice.
//!
//! `u = e^{σ√Δt}`, `d = 1/u`, `p = (e^{(r-q)Δt} - d)/(u - d)`. American
//! exercise compares continuation against intrinsic at every node.

use pricer_core::cancel::CancellationToken;
use pricer_core::types::{InstabilityKind, PricingError, PricingWarning};
use pricer_models::instruments::{ExerciseStyle, OptionTerms};

/// Lattice price with the step count actually used.
#[derive(Debug, Clone, PartialEq)]
pub struct LatticePrice {
    /// Present value
    pub price: f64,
    /// Steps of the lattice that produced `price`
    pub steps: usize,
    /// Set when the grid had to be refined
    pub warning: Option<PricingWarning>,
}

#[derive(Debug, Clone, Copy)]
struct Lattice {
    up: f64,
    probability: f64,
    discount: f64,
}

impl Lattice {
    fn new(terms: &OptionTerms, steps: usize) -> Option<Self> {
        let dt = terms.time_to_expiration / steps as f64;
        let up = (terms.volatility * dt.sqrt()).exp();
        let down = 1.0 / up;
        let growth = ((terms.risk_free_rate - terms.dividend_yield) * dt).exp();
        let probability = (growth - down) / (up - down);
        if !(0.0..=1.0).contains(&probability) || !probability.is_finite() {
            return None;
        }
        Some(Self {
            up,
            probability,
            discount: (-terms.risk_free_rate * dt).exp(),
        })
    }
}

/// Deterministic exercise value when the lattice collapses to one path.
fn deterministic(terms: &OptionTerms, steps: usize) -> f64 {
    let european = terms.discounted_intrinsic();
    if terms.style == ExerciseStyle::European {
        return european;
    }
    let dt = terms.time_to_expiration / steps as f64;
    let carry = terms.risk_free_rate - terms.dividend_yield;
    (0..=steps)
        .map(|i| {
            let t = i as f64 * dt;
            let spot = terms.spot * (carry * t).exp();
            (-terms.risk_free_rate * t).exp() * terms.payoff.intrinsic(spot, terms.strike)
        })
        .fold(european, f64::max)
}

fn roll_back(
    terms: &OptionTerms,
    lattice: Lattice,
    steps: usize,
    token: &CancellationToken,
) -> Result<f64, PricingError> {
    let american = terms.style == ExerciseStyle::American;
    let (s, k) = (terms.spot, terms.strike);
    let node_spot = |i: usize, j: usize| s * lattice.up.powi(2 * j as i32 - i as i32);

    let mut values: Vec<f64> = (0..=steps)
        .map(|j| terms.payoff.intrinsic(node_spot(steps, j), k))
        .collect();
    let p = lattice.probability;
    for i in (0..steps).rev() {
        token.check()?;
        for j in 0..=i {
            let continuation = lattice.discount * (p * values[j + 1] + (1.0 - p) * values[j]);
            values[j] = if american {
                continuation.max(terms.payoff.intrinsic(node_spot(i, j), k))
            } else {
                continuation
            };
        }
    }
    Ok(values[0])
}

/// Prices `terms` on a CRR lattice with `steps` steps.
///
/// If the risk-neutral probability leaves `[0, 1]` the step count is
/// doubled once and a `LatticeProbability` warning is attached.
///
/// # Errors
///
/// - `PricingError::Convergence` if the refined lattice is still invalid
/// - `PricingError::Cancelled` if `token` is set between time steps
///
/// # Examples
///
/// ```
/// use pricer_core::cancel::CancellationToken;
/// use pricer_models::instruments::{ExerciseStyle, OptionTerms, OptionType};
/// use pricer_pricing::options::binomial_price;
///
/// let put = OptionTerms::new(100.0, 100.0, 1.0, 0.05, 0.0, 0.2, OptionType::Put);
/// let token = CancellationToken::new();
/// let european = binomial_price(&put, 500, &token).unwrap();
/// let american = binomial_price(&put.with_style(ExerciseStyle::American), 500, &token).unwrap();
/// assert!(american.price > european.price);
/// ```
pub fn binomial_price(
    terms: &OptionTerms,
    steps: usize,
    token: &CancellationToken,
) -> Result<LatticePrice, PricingError> {
    let steps = steps.max(1);
    if terms.time_to_expiration <= 0.0 {
        return Ok(LatticePrice {
            price: terms.intrinsic(),
            steps,
            warning: None,
        });
    }
    if terms.volatility * (terms.time_to_expiration / steps as f64).sqrt() < 1e-12 {
        return Ok(LatticePrice {
            price: deterministic(terms, steps),
            steps,
            warning: None,
        });
    }

    if let Some(lattice) = Lattice::new(terms, steps) {
        return Ok(LatticePrice {
            price: roll_back(terms, lattice, steps, token)?,
            steps,
            warning: None,
        });
    }

    let refined = steps * 2;
    tracing::warn!(steps, refined, "risk-neutral probability outside [0, 1], refining lattice");
    let lattice = Lattice::new(terms, refined).ok_or_else(|| {
        PricingError::convergence(format!(
            "binomial risk-neutral probability outside [0, 1] at {} steps",
            refined
        ))
    })?;
    Ok(LatticePrice {
        price: roll_back(terms, lattice, refined, token)?,
        steps: refined,
        warning: Some(PricingWarning::instability(
            InstabilityKind::LatticeProbability,
            format!("lattice refined from {} to {} steps", steps, refined),
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pricer_models::analytical::BlackScholes;
    use pricer_models::instruments::OptionType;

    fn terms(payoff: OptionType) -> OptionTerms {
        OptionTerms::new(100.0, 100.0, 1.0, 0.05, 0.0, 0.2, payoff)
    }

    fn price(t: &OptionTerms, steps: usize) -> LatticePrice {
        binomial_price(t, steps, &CancellationToken::new()).unwrap()
    }

    // ==========================================================
    // Convergence
    // ==========================================================

    #[test]
    fn test_converges_to_black_scholes() {
        let bs = BlackScholes::new(100.0, 0.05, 0.0, 0.2).unwrap().price_call(100.0, 1.0);
        let coarse = (price(&terms(OptionType::Call), 50).price - bs).abs();
        let fine = (price(&terms(OptionType::Call), 2000).price - bs).abs();
        assert!(fine < coarse);
        assert!(fine < 0.01, "error {}", fine);
    }

    #[test]
    fn test_american_put_reference() {
        // Converged CRR value for S = K = 100, T = 1, r = 5%, σ = 20%
        let american = terms(OptionType::Put).with_style(ExerciseStyle::American);
        assert_abs_diff_eq!(price(&american, 2000).price, 6.09, epsilon = 0.01);
    }

    #[test]
    fn test_american_call_without_dividends_is_european() {
        let european = price(&terms(OptionType::Call), 500).price;
        let american =
            price(&terms(OptionType::Call).with_style(ExerciseStyle::American), 500).price;
        assert_abs_diff_eq!(european, american, epsilon = 1e-10);
    }

    // ==========================================================
    // Edge cases
    // ==========================================================

    #[test]
    fn test_expired_is_intrinsic() {
        let mut t = terms(OptionType::Put);
        t.strike = 110.0;
        t.time_to_expiration = 0.0;
        assert_eq!(price(&t, 100).price, 10.0);
    }

    #[test]
    fn test_zero_vol_american_put_exercises_early() {
        let mut t = terms(OptionType::Put).with_style(ExerciseStyle::American);
        t.strike = 120.0;
        t.volatility = 0.0;
        // Deep in the money with positive rates: exercise today
        assert_abs_diff_eq!(price(&t, 100).price, 20.0, epsilon = 1e-12);
    }

    #[test]
    fn test_probability_refinement() {
        // e^{rΔt} > u at one step, valid again at two
        let t = OptionTerms::new(100.0, 100.0, 1.0, 0.1, 0.0, 0.09, OptionType::Call);
        let lp = price(&t, 1);
        assert_eq!(lp.steps, 2);
        assert_eq!(
            lp.warning.and_then(|w| w.instability_kind()),
            Some(InstabilityKind::LatticeProbability)
        );
    }

    #[test]
    fn test_probability_failure_after_refinement() {
        let t = OptionTerms::new(100.0, 100.0, 1.0, 0.5, 0.0, 0.05, OptionType::Call);
        let result = binomial_price(&t, 1, &CancellationToken::new());
        assert!(matches!(result, Err(PricingError::Convergence(_))));
    }

    #[test]
    fn test_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(
            binomial_price(&terms(OptionType::Call), 100, &token),
            Err(PricingError::Cancelled)
        );
    }
}
