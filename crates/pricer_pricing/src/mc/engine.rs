//! Parallel Monte Carlo estimator.
//!
//! Paths are split into batches of `batch_size` samples and the batches run
//! on the rayon pool. Each sample draws from its own generator seeded by
//! `(seed, sample index)`; per-sample outcomes are collected in index order
//! and reduced sequentially, so the estimate is bit-identical for any batch
//! size or thread count.

use pricer_core::cancel::CancellationToken;
use pricer_core::types::PricingError;
use pricer_models::models::{MonteCarloConfig, VarianceReduction};
use rayon::prelude::*;

use super::paths::{PathDraws, PathSimulator};
use crate::rng::{entropy_seed, PricerRng};

/// Two-sided 95% normal quantile.
pub const CONFIDENCE_Z: f64 = 1.96;

/// Path statistics reported alongside the price.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PathStats {
    /// 1 if the path touched the monitored barrier, else 0
    pub knocked: f64,
    /// Average of the spot over the observation dates
    pub average: f64,
    /// Path minimum
    pub minimum: f64,
    /// Path maximum
    pub maximum: f64,
}

impl PathStats {
    fn accumulate(&mut self, other: &PathStats, weight: f64) {
        self.knocked += weight * other.knocked;
        self.average += weight * other.average;
        self.minimum += weight * other.minimum;
        self.maximum += weight * other.maximum;
    }
}

/// Undiscounted result of evaluating one path.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PathOutcome {
    /// Payoff at expiry
    pub payoff: f64,
    /// Control variate value, with known expectation supplied to the engine
    pub control: f64,
    /// Statistics of the path
    pub stats: PathStats,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    payoff: f64,
    control: f64,
    stats: PathStats,
}

/// Monte Carlo price with its sampling error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct McEstimate {
    /// Discounted mean payoff
    pub price: f64,
    /// Standard error of `price`
    pub std_error: f64,
    /// Number of independent samples (antithetic pairs count once)
    pub samples: usize,
    /// Mean path statistics
    pub stats: PathStats,
}

impl McEstimate {
    /// `price ± 1.96·SE`.
    pub fn confidence_interval(&self) -> (f64, f64) {
        let half = CONFIDENCE_Z * self.std_error;
        (self.price - half, self.price + half)
    }
}

/// Monte Carlo engine for a fixed configuration and path simulator.
///
/// # Examples
///
/// ```
/// use pricer_core::cancel::CancellationToken;
/// use pricer_models::instruments::{OptionTerms, OptionType};
/// use pricer_models::models::MonteCarloConfig;
/// use pricer_pricing::mc::{Dynamics, MonteCarloEngine, PathOutcome, PathSimulator};
///
/// let terms = OptionTerms::new(100.0, 100.0, 1.0, 0.05, 0.0, 0.2, OptionType::Call);
/// let config = MonteCarloConfig::builder().n_paths(20_000).n_steps(1).seed(7).build().unwrap();
/// let engine = MonteCarloEngine::new(&config, PathSimulator::new(&terms, Dynamics::Gbm, 1));
///
/// let estimate = engine
///     .run(
///         |path: &[f64]| PathOutcome {
///             payoff: (path[path.len() - 1] - 100.0).max(0.0),
///             ..Default::default()
///         },
///         None,
///         &CancellationToken::new(),
///     )
///     .unwrap();
/// assert!((estimate.price - 10.45).abs() < 4.0 * estimate.std_error + 0.05);
/// ```
#[derive(Debug, Clone)]
pub struct MonteCarloEngine {
    n_paths: usize,
    seed: u64,
    variance_reduction: VarianceReduction,
    batch_size: usize,
    simulator: PathSimulator,
}

impl MonteCarloEngine {
    /// Creates an engine; a missing seed is drawn from the clock once here.
    pub fn new(config: &MonteCarloConfig, simulator: PathSimulator) -> Self {
        let seed = config.seed().unwrap_or_else(entropy_seed);
        Self {
            n_paths: config.n_paths(),
            seed,
            variance_reduction: config.variance_reduction(),
            batch_size: config.batch_size().max(1),
            simulator,
        }
    }

    /// Seed in effect for this engine.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Path simulator.
    pub fn simulator(&self) -> &PathSimulator {
        &self.simulator
    }

    /// Variance reduction in effect.
    pub fn variance_reduction(&self) -> VarianceReduction {
        self.variance_reduction
    }

    fn antithetic(&self) -> bool {
        self.variance_reduction == VarianceReduction::Antithetic
    }

    /// Number of independent samples drawn.
    pub fn sample_count(&self) -> usize {
        if self.antithetic() {
            (self.n_paths / 2).max(1)
        } else {
            self.n_paths
        }
    }

    fn batches(&self) -> Vec<(usize, usize)> {
        let total = self.sample_count();
        (0..total)
            .step_by(self.batch_size)
            .map(|start| (start, (start + self.batch_size).min(total)))
            .collect()
    }

    /// Prices the payoff evaluated by `evaluate` on each simulated path.
    ///
    /// `control_mean` is the known expectation of [`PathOutcome::control`];
    /// it is used only under `VarianceReduction::ControlVariate`.
    ///
    /// # Errors
    ///
    /// `PricingError::Cancelled` if `token` is set before a batch starts.
    pub fn run<E>(
        &self,
        evaluate: E,
        control_mean: Option<f64>,
        token: &CancellationToken,
    ) -> Result<McEstimate, PricingError>
    where
        E: Fn(&[f64]) -> PathOutcome + Sync,
    {
        let antithetic = self.antithetic();
        let sim = &self.simulator;
        tracing::debug!(
            paths = self.n_paths,
            steps = sim.steps(),
            seed = self.seed,
            dynamics = sim.dynamics().label(),
            variance_reduction = ?self.variance_reduction,
            "running Monte Carlo"
        );

        let batches: Vec<Vec<Sample>> = self
            .batches()
            .into_par_iter()
            .map(|(start, end)| {
                token.check()?;
                let mut draws = PathDraws::default();
                let mut path = Vec::with_capacity(sim.steps() + 1);
                let mut out = Vec::with_capacity(end - start);
                for index in start..end {
                    let mut rng = PricerRng::for_path(self.seed, index as u64);
                    sim.draw(&mut rng, &mut draws);
                    sim.build(&draws, 1.0, &mut path);
                    let first = evaluate(&path);
                    if antithetic {
                        sim.build(&draws, -1.0, &mut path);
                        let second = evaluate(&path);
                        let mut stats = PathStats::default();
                        stats.accumulate(&first.stats, 0.5);
                        stats.accumulate(&second.stats, 0.5);
                        out.push(Sample {
                            payoff: 0.5 * (first.payoff + second.payoff),
                            control: 0.5 * (first.control + second.control),
                            stats,
                        });
                    } else {
                        out.push(Sample {
                            payoff: first.payoff,
                            control: first.control,
                            stats: first.stats,
                        });
                    }
                }
                Ok(out)
            })
            .collect::<Result<_, PricingError>>()?;
        token.check()?;

        let samples: Vec<Sample> = batches.into_iter().flatten().collect();
        let control = match (self.variance_reduction, control_mean) {
            (VarianceReduction::ControlVariate, Some(mean)) => Some(mean),
            _ => None,
        };
        Ok(self.reduce(&samples, control))
    }

    fn reduce(&self, samples: &[Sample], control_mean: Option<f64>) -> McEstimate {
        let n = samples.len().max(1) as f64;
        let mut stats = PathStats::default();
        let mut mean_y = 0.0;
        let mut mean_x = 0.0;
        for s in samples {
            mean_y += s.payoff;
            mean_x += s.control;
            stats.accumulate(&s.stats, 1.0 / n);
        }
        mean_y /= n;
        mean_x /= n;

        let beta = match control_mean {
            Some(_) => {
                let (mut cov, mut var_x) = (0.0, 0.0);
                for s in samples {
                    cov += (s.payoff - mean_y) * (s.control - mean_x);
                    var_x += (s.control - mean_x).powi(2);
                }
                if var_x > 0.0 {
                    cov / var_x
                } else {
                    0.0
                }
            }
            None => 0.0,
        };
        let shift = control_mean.map_or(0.0, |mu| beta * (mean_x - mu));
        let estimate = mean_y - shift;

        let mut var = 0.0;
        for s in samples {
            let adjusted = s.payoff - beta * (s.control - mean_x);
            var += (adjusted - mean_y).powi(2);
        }
        let var = if samples.len() > 1 {
            var / (n - 1.0)
        } else {
            0.0
        };

        let discount = (-self.simulator.rate() * self.simulator.expiry()).exp();
        McEstimate {
            price: discount * estimate,
            std_error: discount * (var / n).sqrt(),
            samples: samples.len(),
            stats,
        }
    }

    /// Simulates every path and returns them in index order.
    ///
    /// Under antithetic sampling the partner of path `2k` is path `2k + 1`.
    pub fn simulate_paths(&self, token: &CancellationToken) -> Result<Vec<Vec<f64>>, PricingError> {
        let antithetic = self.antithetic();
        let sim = &self.simulator;
        let batches: Vec<Vec<Vec<f64>>> = self
            .batches()
            .into_par_iter()
            .map(|(start, end)| {
                token.check()?;
                let mut draws = PathDraws::default();
                let mut out = Vec::with_capacity((end - start) * 2);
                for index in start..end {
                    let mut rng = PricerRng::for_path(self.seed, index as u64);
                    sim.draw(&mut rng, &mut draws);
                    let mut path = Vec::new();
                    sim.build(&draws, 1.0, &mut path);
                    out.push(path);
                    if antithetic {
                        let mut partner = Vec::new();
                        sim.build(&draws, -1.0, &mut partner);
                        out.push(partner);
                    }
                }
                Ok(out)
            })
            .collect::<Result<_, PricingError>>()?;
        Ok(batches.into_iter().flatten().collect())
    }
}
