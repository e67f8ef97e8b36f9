//! Longstaff-Schwartz least-squares Monte Carlo for American exercise.
//!
//! At every exercise date the discounted future cash flow of the in-the-money
//! paths is regressed on `{1, x, x²}` with `x = S/K`; a path exercises when
//! its intrinsic value beats the fitted continuation value.

use pricer_core::cancel::CancellationToken;
use pricer_core::types::PricingError;
use pricer_models::instruments::OptionType;
use pricer_models::models::VarianceReduction;

use super::engine::{McEstimate, MonteCarloEngine, PathStats};

/// Minimum in-the-money paths needed to fit the regression.
const MIN_REGRESSION_PATHS: usize = 3;

/// Solves a 3×3 linear system by Gaussian elimination with partial pivoting.
fn solve3(mut a: [[f64; 3]; 3], mut b: [f64; 3]) -> Option<[f64; 3]> {
    for col in 0..3 {
        let pivot = (col..3).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-14 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..3 {
            let factor = a[row][col] / a[col][col];
            for k in col..3 {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = [0.0; 3];
    for row in (0..3).rev() {
        let tail: f64 = (row + 1..3).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

/// Least-squares fit of `y` on `{1, x, x²}`.
fn regress(points: &[(f64, f64)]) -> Option<[f64; 3]> {
    let mut ata = [[0.0; 3]; 3];
    let mut aty = [0.0; 3];
    for &(x, y) in points {
        let basis = [1.0, x, x * x];
        for i in 0..3 {
            aty[i] += basis[i] * y;
            for j in 0..3 {
                ata[i][j] += basis[i] * basis[j];
            }
        }
    }
    solve3(ata, aty)
}

/// Prices an American option by Longstaff-Schwartz on the engine's paths.
///
/// Exercise is allowed at every simulation date after inception; immediate
/// exercise is compared against the estimate at the end.
///
/// # Errors
///
/// `PricingError::Cancelled` if `token` is set during simulation or between
/// exercise dates.
pub fn price_american(
    engine: &MonteCarloEngine,
    payoff: OptionType,
    strike: f64,
    token: &CancellationToken,
) -> Result<McEstimate, PricingError> {
    let paths = engine.simulate_paths(token)?;
    let sim = engine.simulator();
    let steps = sim.steps();
    let dt = sim.dt();
    let rate = sim.rate();

    let mut cash: Vec<f64> = paths.iter().map(|p| payoff.intrinsic(p[steps], strike)).collect();
    let mut stop: Vec<usize> = vec![steps; paths.len()];

    for t in (1..steps).rev() {
        token.check()?;
        let itm: Vec<usize> = (0..paths.len())
            .filter(|&i| payoff.intrinsic(paths[i][t], strike) > 0.0)
            .collect();
        if itm.len() < MIN_REGRESSION_PATHS {
            continue;
        }
        let points: Vec<(f64, f64)> = itm
            .iter()
            .map(|&i| {
                let discounted = cash[i] * (-rate * (stop[i] - t) as f64 * dt).exp();
                (paths[i][t] / strike, discounted)
            })
            .collect();
        let Some(beta) = regress(&points) else {
            tracing::debug!(step = t, "singular regression, skipping exercise date");
            continue;
        };
        for (&i, &(x, _)) in itm.iter().zip(&points) {
            let continuation = beta[0] + beta[1] * x + beta[2] * x * x;
            let exercise = payoff.intrinsic(paths[i][t], strike);
            if exercise > continuation {
                cash[i] = exercise;
                stop[i] = t;
            }
        }
    }

    let values: Vec<f64> = cash
        .iter()
        .zip(&stop)
        .map(|(c, &s)| c * (-rate * s as f64 * dt).exp())
        .collect();
    let samples: Vec<f64> = if engine.variance_reduction() == VarianceReduction::Antithetic {
        values.chunks(2).map(|pair| pair.iter().sum::<f64>() / pair.len() as f64).collect()
    } else {
        values
    };

    let n = samples.len().max(1) as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let var = if samples.len() > 1 {
        samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
    } else {
        0.0
    };

    let immediate = payoff.intrinsic(sim.spot(), strike);
    tracing::debug!(paths = paths.len(), steps, mean, immediate, "Longstaff-Schwartz complete");
    let (price, std_error) = if immediate > mean {
        (immediate, 0.0)
    } else {
        (mean, (var / n).sqrt())
    };
    Ok(McEstimate {
        price,
        std_error,
        samples: samples.len(),
        stats: PathStats::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mc::{Dynamics, PathSimulator};
    use approx::assert_abs_diff_eq;
    use pricer_models::analytical::BlackScholes;
    use pricer_models::instruments::OptionTerms;
    use pricer_models::models::MonteCarloConfig;

    fn engine(spot: f64, paths: usize) -> MonteCarloEngine {
        let terms = OptionTerms::new(spot, 100.0, 1.0, 0.06, 0.0, 0.2, OptionType::Put);
        let cfg = MonteCarloConfig::builder()
            .n_paths(paths)
            .n_steps(50)
            .seed(17)
            .build()
            .unwrap();
        MonteCarloEngine::new(&cfg, PathSimulator::new(&terms, Dynamics::Gbm, 50))
    }

    #[test]
    fn test_solve3() {
        let a = [[2.0, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 4.0]];
        let x = solve3(a, [3.0, 5.0, 5.0]).unwrap();
        assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[1], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[2], 1.0, epsilon = 1e-12);
        assert!(solve3([[0.0; 3]; 3], [1.0; 3]).is_none());
    }

    #[test]
    fn test_regression_recovers_quadratic() {
        let points: Vec<(f64, f64)> = (0..20)
            .map(|i| {
                let x = 0.5 + i as f64 * 0.05;
                (x, 1.0 - 2.0 * x + 0.5 * x * x)
            })
            .collect();
        let beta = regress(&points).unwrap();
        assert_abs_diff_eq!(beta[0], 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(beta[1], -2.0, epsilon = 1e-8);
        assert_abs_diff_eq!(beta[2], 0.5, epsilon = 1e-8);
    }

    #[test]
    fn test_american_put_exceeds_european() {
        let token = CancellationToken::new();
        let est = price_american(&engine(100.0, 20_000), OptionType::Put, 100.0, &token).unwrap();
        let european = BlackScholes::new(100.0, 0.06, 0.0, 0.2).unwrap().price_put(100.0, 1.0);
        // Longstaff and Schwartz (2001) report 2.314 for S = K = 40, i.e. 5.785 here
        assert!(est.price > european);
        assert!((est.price - 5.785).abs() < 0.2, "{}", est.price);
    }

    #[test]
    fn test_deep_itm_exercises_immediately() {
        let token = CancellationToken::new();
        let est = price_american(&engine(40.0, 2_000), OptionType::Put, 100.0, &token).unwrap();
        assert_abs_diff_eq!(est.price, 60.0, epsilon = 1e-12);
        assert_eq!(est.std_error, 0.0);
    }

    #[test]
    fn test_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(
            price_american(&engine(100.0, 100), OptionType::Put, 100.0, &token),
            Err(PricingError::Cancelled)
        );
    }
}
