//! Simulation of path-dependent payoffs.
//!
//! Paths are monitored on the simulation grid. Barrier levels and path
//! extrema are shifted by the Broadie-Glasserman-Kou factor
//! `exp(±0.5826·σ·√Δt)` so that discrete monitoring approximates the
//! continuous contract. The initial spot is known exactly and is never
//! shifted.

use pricer_core::cancel::CancellationToken;
use pricer_core::types::PricingError;
use pricer_models::instruments::{
    AsianSpec, AveragingType, BarrierSpec, ExoticPayoff, LookbackSpec, LookbackType, OptionTerms,
    OptionType,
};
use pricer_models::models::{MonteCarloConfig, MAX_STEPS};

use super::asian::geometric_asian_price;
use super::lookback::LookbackExtrema;
use super::ExoticValue;
use crate::mc::{Dynamics, MonteCarloEngine, PathOutcome, PathSimulator, PathStats};

/// Broadie-Glasserman-Kou continuity correction, `ζ(1/2)/√(2π)`.
pub const BGK_BETA: f64 = 0.5826;

/// Time steps used to simulate `payoff` given the configured step count.
///
/// Asian grids are rounded up to a multiple of the observation count so
/// that every observation date lies on the grid.
pub(crate) fn simulation_steps(payoff: &ExoticPayoff, configured: usize) -> usize {
    match payoff {
        ExoticPayoff::Asian(spec) => {
            let m = spec.observations.max(1);
            let per_observation = configured.div_ceil(m).max(1);
            let steps = m * per_observation;
            if steps > MAX_STEPS && m <= MAX_STEPS {
                m * (MAX_STEPS / m).max(1)
            } else {
                steps
            }
        }
        ExoticPayoff::Barrier(_) | ExoticPayoff::Lookback(_) => configured.max(1),
    }
}

/// Path evaluator for one exotic payoff.
#[derive(Debug, Clone, Copy)]
struct PathPayoff {
    option: OptionType,
    strike: f64,
    payoff: ExoticPayoff,
    correction: f64,
    asian_stride: usize,
}

impl PathPayoff {
    fn new(terms: &OptionTerms, payoff: ExoticPayoff, sim: &PathSimulator) -> Self {
        let correction = (BGK_BETA * sim.reference_volatility() * sim.dt().sqrt()).exp();
        let asian_stride = match payoff {
            ExoticPayoff::Asian(spec) => sim.steps() / spec.observations.max(1),
            _ => 0,
        };
        Self {
            option: terms.payoff,
            strike: terms.strike,
            payoff,
            correction,
            asian_stride,
        }
    }

    fn evaluate(&self, path: &[f64]) -> PathOutcome {
        let terminal = path[path.len() - 1];
        match self.payoff {
            ExoticPayoff::Barrier(spec) => self.barrier(&spec, path, terminal),
            ExoticPayoff::Asian(spec) => self.asian(&spec, path, terminal),
            ExoticPayoff::Lookback(spec) => self.lookback(&spec, path, terminal),
        }
    }

    fn barrier(&self, spec: &BarrierSpec, path: &[f64], terminal: f64) -> PathOutcome {
        let kind = spec.barrier_type;
        let shifted = if kind.is_up() {
            spec.level / self.correction
        } else {
            spec.level * self.correction
        };
        let knocked = kind.is_breached(path[0], spec.level)
            || path[1..].iter().any(|&s| kind.is_breached(s, shifted));
        let vanilla = self.option.intrinsic(terminal, self.strike);
        let payoff = match (kind.is_in(), knocked) {
            (true, true) | (false, false) => vanilla,
            _ => spec.rebate,
        };
        PathOutcome {
            payoff,
            control: terminal,
            stats: PathStats {
                knocked: if knocked { 1.0 } else { 0.0 },
                ..PathStats::default()
            },
        }
    }

    fn asian(&self, spec: &AsianSpec, path: &[f64], terminal: f64) -> PathOutcome {
        let m = spec.observations.max(1);
        let observed = (1..=m).map(|i| path[(i * self.asian_stride).min(path.len() - 1)]);
        let (arithmetic, log_sum) =
            observed.fold((0.0, 0.0), |(sum, logs), s| (sum + s, logs + s.ln()));
        let arithmetic = arithmetic / m as f64;
        let geometric = (log_sum / m as f64).exp();
        let (average, control) = match spec.averaging {
            // Geometric payoff has a closed form and is highly correlated
            AveragingType::Arithmetic => {
                (arithmetic, self.option.intrinsic(geometric, self.strike))
            }
            AveragingType::Geometric => (geometric, terminal),
        };
        PathOutcome {
            payoff: self.option.intrinsic(average, self.strike),
            control,
            stats: PathStats {
                average,
                ..PathStats::default()
            },
        }
    }

    fn lookback(&self, spec: &LookbackSpec, path: &[f64], terminal: f64) -> PathOutcome {
        // The start is observed exactly; only later grid points are shifted
        let (lo, hi) = path[1..]
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| (lo.min(s), hi.max(s)));
        let minimum = (lo / self.correction).min(path[0]);
        let maximum = (hi * self.correction).max(path[0]);
        let payoff = match (spec.lookback_type, self.option) {
            (LookbackType::FloatingStrike, OptionType::Call) => terminal - minimum,
            (LookbackType::FloatingStrike, OptionType::Put) => maximum - terminal,
            (LookbackType::FixedStrike, OptionType::Call) => (maximum - self.strike).max(0.0),
            (LookbackType::FixedStrike, OptionType::Put) => (self.strike - minimum).max(0.0),
        };
        PathOutcome {
            payoff: payoff.max(0.0),
            control: terminal,
            stats: PathStats {
                minimum,
                maximum,
                ..PathStats::default()
            },
        }
    }
}

/// Prices `payoff` by simulation under `dynamics`.
///
/// # Errors
///
/// `PricingError::Cancelled` if `token` is set while paths are running.
pub fn simulate(
    terms: &OptionTerms,
    payoff: &ExoticPayoff,
    dynamics: Dynamics,
    config: &MonteCarloConfig,
    token: &CancellationToken,
) -> Result<ExoticValue, PricingError> {
    let steps = simulation_steps(payoff, config.n_steps());
    let sim = PathSimulator::new(terms, dynamics, steps);
    let engine = MonteCarloEngine::new(config, sim);
    let evaluator = PathPayoff::new(terms, *payoff, &sim);

    let growth = (terms.risk_free_rate * terms.time_to_expiration).exp();
    let control_mean = match (payoff, dynamics) {
        (ExoticPayoff::Asian(spec), Dynamics::Gbm)
            if spec.averaging == AveragingType::Arithmetic =>
        {
            geometric_asian_price(terms, spec.observations) * growth
        }
        _ => terms.forward(),
    };

    let estimate = engine.run(|path| evaluator.evaluate(path), Some(control_mean), token)?;
    tracing::debug!(
        payoff = payoff.label(),
        steps,
        price = estimate.price,
        std_error = estimate.std_error,
        "exotic simulation complete"
    );

    let stats = estimate.stats;
    let mut value = ExoticValue::priced(estimate.price);
    value.std_error = Some(estimate.std_error);
    value.confidence_interval = Some(estimate.confidence_interval());
    match payoff {
        ExoticPayoff::Barrier(_) => value.knock_probability = Some(stats.knocked),
        ExoticPayoff::Asian(_) => value.average_price = Some(stats.average),
        ExoticPayoff::Lookback(_) => {
            value.extrema = Some(LookbackExtrema {
                minimum: stats.minimum,
                maximum: stats.maximum,
            })
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_models::instruments::BarrierType;

    fn gbm_sim(steps: usize) -> PathSimulator {
        let terms = OptionTerms::new(100.0, 100.0, 1.0, 0.05, 0.0, 0.2, OptionType::Call);
        PathSimulator::new(&terms, Dynamics::Gbm, steps)
    }

    fn terms() -> OptionTerms {
        OptionTerms::new(100.0, 100.0, 1.0, 0.05, 0.0, 0.2, OptionType::Call)
    }

    fn market(payoff: OptionType, strike: f64) -> OptionTerms {
        OptionTerms::new(100.0, strike, 1.0, 0.05, 0.02, 0.25, payoff)
    }

    /// Simulated price of `payoff` in standard errors from its closed form.
    fn z_score(terms: &OptionTerms, payoff: ExoticPayoff, seed: u64) -> f64 {
        let config = MonteCarloConfig::builder()
            .n_paths(40_000)
            .n_steps(100)
            .seed(seed)
            .build()
            .unwrap();
        let exact = crate::exotic::closed_form(terms, &payoff).unwrap().price;
        let simulated =
            simulate(terms, &payoff, Dynamics::Gbm, &config, &CancellationToken::new()).unwrap();
        (simulated.price - exact) / simulated.std_error.unwrap()
    }

    // ==========================================================
    // Agreement with closed forms
    // ==========================================================

    #[test]
    fn test_barriers_match_reiner_rubinstein() {
        let cases = [
            (OptionType::Call, BarrierType::DownOut, 85.0),
            (OptionType::Call, BarrierType::DownIn, 90.0),
            (OptionType::Put, BarrierType::UpOut, 115.0),
            (OptionType::Put, BarrierType::UpIn, 115.0),
        ];
        for (i, (payoff, kind, level)) in cases.into_iter().enumerate() {
            let barrier = ExoticPayoff::Barrier(BarrierSpec {
                barrier_type: kind,
                level,
                rebate: 0.0,
            });
            let z = z_score(&market(payoff, 100.0), barrier, 101 + i as u64);
            assert!(z.abs() < 4.0, "{:?} {:?} at {}: z = {}", payoff, kind, level, z);
        }
    }

    #[test]
    fn test_lookbacks_match_closed_forms() {
        let cases = [
            (OptionType::Call, LookbackType::FloatingStrike, 100.0),
            (OptionType::Put, LookbackType::FloatingStrike, 100.0),
            (OptionType::Call, LookbackType::FixedStrike, 110.0),
            (OptionType::Put, LookbackType::FixedStrike, 100.0),
        ];
        for (i, (payoff, kind, strike)) in cases.into_iter().enumerate() {
            let lookback = ExoticPayoff::Lookback(LookbackSpec { lookback_type: kind });
            let z = z_score(&market(payoff, strike), lookback, 201 + i as u64);
            assert!(z.abs() < 4.0, "{:?} {:?} K = {}: z = {}", payoff, kind, strike, z);
        }
    }

    #[test]
    fn test_geometric_asian_matches_closed_form() {
        let asian = ExoticPayoff::Asian(AsianSpec {
            averaging: AveragingType::Geometric,
            observations: 12,
        });
        for (i, payoff) in [OptionType::Call, OptionType::Put].into_iter().enumerate() {
            let z = z_score(&market(payoff, 100.0), asian, 301 + i as u64);
            assert!(z.abs() < 4.0, "{:?}: z = {}", payoff, z);
        }
    }

    #[test]
    fn test_asian_steps_align_with_observations() {
        let asian = ExoticPayoff::Asian(AsianSpec {
            averaging: AveragingType::Arithmetic,
            observations: 12,
        });
        assert_eq!(simulation_steps(&asian, 100), 108);
        assert_eq!(simulation_steps(&asian, 12), 12);
        assert_eq!(simulation_steps(&asian, 1), 12);
    }

    #[test]
    fn test_barrier_path_evaluation() {
        let spec = BarrierSpec {
            barrier_type: BarrierType::UpOut,
            level: 120.0,
            rebate: 1.5,
        };
        let sim = gbm_sim(4);
        let eval = PathPayoff::new(&terms(), ExoticPayoff::Barrier(spec), &sim);
        let alive = eval.evaluate(&[100.0, 105.0, 110.0, 108.0, 112.0]);
        assert_eq!(alive.payoff, 12.0);
        assert_eq!(alive.stats.knocked, 0.0);
        let dead = eval.evaluate(&[100.0, 125.0, 110.0, 108.0, 112.0]);
        assert_eq!(dead.payoff, 1.5);
        assert_eq!(dead.stats.knocked, 1.0);
    }

    #[test]
    fn test_asian_path_evaluation() {
        let spec = AsianSpec {
            averaging: AveragingType::Arithmetic,
            observations: 2,
        };
        let sim = gbm_sim(4);
        let eval = PathPayoff::new(&terms(), ExoticPayoff::Asian(spec), &sim);
        let out = eval.evaluate(&[100.0, 90.0, 110.0, 95.0, 120.0]);
        // Observed at steps 2 and 4
        assert_eq!(out.stats.average, 115.0);
        assert_eq!(out.payoff, 15.0);
    }

    #[test]
    fn test_lookback_path_evaluation() {
        let spec = LookbackSpec {
            lookback_type: LookbackType::FloatingStrike,
        };
        let sim = gbm_sim(4);
        let eval = PathPayoff::new(&terms(), ExoticPayoff::Lookback(spec), &sim);
        let out = eval.evaluate(&[100.0, 90.0, 110.0, 95.0, 105.0]);
        assert!(out.stats.minimum < 90.0);
        assert!(out.stats.maximum > 110.0);
        assert!(out.payoff > 15.0);
    }
}
