//! Default loss measures.

use pricer_models::instruments::CreditAnalysis;

/// Confidence level of the credit VaR.
pub const CREDIT_VAR_CONFIDENCE: f64 = 0.99;

/// Expected default loss, `pd × (1 − R) × face`.
pub fn expected_loss(face_value: f64, credit: &CreditAnalysis) -> f64 {
    credit.default_probability * credit.loss_given_default() * face_value
}

/// 99th-percentile default loss.
///
/// The face is split into `trials` equal exposures that default
/// independently with the bond's default probability, so the number of
/// defaults is binomial. With one trial the loss is either zero or the
/// full loss given default.
///
/// # Examples
///
/// ```
/// use pricer_models::instruments::CreditAnalysis;
/// use pricer_pricing::bond::credit_var;
///
/// let credit = CreditAnalysis { default_probability: 0.02, ..CreditAnalysis::default() };
/// assert_eq!(credit_var(1000.0, &credit, 1), 600.0);
/// let safe = CreditAnalysis { default_probability: 0.005, ..CreditAnalysis::default() };
/// assert_eq!(credit_var(1000.0, &safe, 1), 0.0);
/// ```
pub fn credit_var(face_value: f64, credit: &CreditAnalysis, trials: usize) -> f64 {
    let n = trials.max(1);
    let p = credit.default_probability;
    let loss_per_default = face_value / n as f64 * credit.loss_given_default();
    if p <= 0.0 {
        return 0.0;
    }
    if p >= 1.0 {
        return n as f64 * loss_per_default;
    }

    // ln P(k) walked up from ln P(0) = n ln(1 − p)
    let odds = p.ln() - (1.0 - p).ln();
    let mut log_mass = n as f64 * (1.0 - p).ln();
    let mut cumulative = 0.0;
    for k in 0..=n {
        cumulative += log_mass.exp();
        if cumulative >= CREDIT_VAR_CONFIDENCE - 1e-12 {
            return k as f64 * loss_per_default;
        }
        log_mass += ((n - k) as f64).ln() - ((k + 1) as f64).ln() + odds;
    }
    n as f64 * loss_per_default
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn credit(pd: f64, recovery: f64) -> CreditAnalysis {
        CreditAnalysis {
            rating: "BBB".to_string(),
            spread: 0.015,
            recovery_rate: recovery,
            default_probability: pd,
        }
    }

    #[test]
    fn test_expected_loss() {
        assert_relative_eq!(expected_loss(1000.0, &credit(0.02, 0.4)), 12.0, epsilon = 1e-12);
        assert_eq!(expected_loss(1000.0, &credit(0.0, 0.4)), 0.0);
    }

    #[test]
    fn test_single_trial_threshold() {
        // P(no default) = 0.99 already reaches the quantile
        assert_eq!(credit_var(1000.0, &credit(0.01, 0.4), 1), 0.0);
        assert_eq!(credit_var(1000.0, &credit(0.0101, 0.4), 1), 600.0);
        assert_eq!(credit_var(1000.0, &credit(1.0, 0.25), 1), 750.0);
    }

    #[test]
    fn test_many_trials_quantile() {
        // Binomial(100, 0.05): P(X <= 10) ≈ 0.9885, P(X <= 11) ≈ 0.9961
        let var = credit_var(1000.0, &credit(0.05, 0.0), 100);
        assert_relative_eq!(var, 110.0, epsilon = 1e-9);
    }

    #[test]
    fn test_var_not_below_expected_loss_for_large_pools() {
        let c = credit(0.03, 0.4);
        assert!(credit_var(1000.0, &c, 500) >= expected_loss(1000.0, &c));
    }
}
