//! Path simulation for the supported underlying dynamics.
//!
//! A path is the spot at `steps + 1` equally spaced dates, starting with the
//! current spot. Random draws are generated first and the path is built from
//! them, so an antithetic partner is the same draws with the normals negated.

use pricer_models::instruments::OptionTerms;
use pricer_models::models::{HestonParams, JumpDiffusionParams, SabrParams};

use crate::rng::PricerRng;

/// Stochastic dynamics of the underlying.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dynamics {
    /// Geometric Brownian motion, stepped exactly in log space.
    Gbm,
    /// Heston stochastic variance, full-truncation Euler.
    Heston(HestonParams),
    /// SABR forward, Euler with absorption at zero.
    Sabr(SabrParams),
    /// Merton lognormal jumps on top of GBM.
    JumpDiffusion(JumpDiffusionParams),
}

impl Dynamics {
    /// Normal draws consumed per time step.
    fn normals_per_step(&self) -> usize {
        match self {
            Dynamics::Gbm => 1,
            Dynamics::Heston(_) | Dynamics::Sabr(_) | Dynamics::JumpDiffusion(_) => 2,
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Dynamics::Gbm => "gbm",
            Dynamics::Heston(_) => "heston",
            Dynamics::Sabr(_) => "sabr",
            Dynamics::JumpDiffusion(_) => "jump_diffusion",
        }
    }
}

/// Random inputs of one path.
#[derive(Debug, Clone, Default)]
pub struct PathDraws {
    normals: Vec<f64>,
    jumps: Vec<u64>,
}

/// Discretised dynamics over a fixed time grid.
///
/// # Examples
///
/// ```
/// use pricer_models::instruments::{OptionTerms, OptionType};
/// use pricer_pricing::mc::{Dynamics, PathDraws, PathSimulator};
/// use pricer_pricing::rng::PricerRng;
///
/// let terms = OptionTerms::new(100.0, 100.0, 1.0, 0.05, 0.0, 0.2, OptionType::Call);
/// let sim = PathSimulator::new(&terms, Dynamics::Gbm, 12);
///
/// let mut draws = PathDraws::default();
/// let mut path = Vec::new();
/// sim.draw(&mut PricerRng::for_path(1, 0), &mut draws);
/// sim.build(&draws, 1.0, &mut path);
/// assert_eq!(path.len(), 13);
/// assert_eq!(path[0], 100.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSimulator {
    spot: f64,
    rate: f64,
    dividend_yield: f64,
    volatility: f64,
    expiry: f64,
    steps: usize,
    dynamics: Dynamics,
}

impl PathSimulator {
    /// Simulator for the underlying described by `terms`.
    ///
    /// `terms.volatility` drives GBM and the diffusion part of the jump
    /// model; Heston and SABR use their own parameters. `steps` is clamped
    /// to at least one.
    pub fn new(terms: &OptionTerms, dynamics: Dynamics, steps: usize) -> Self {
        Self {
            spot: terms.spot,
            rate: terms.risk_free_rate,
            dividend_yield: terms.dividend_yield,
            volatility: terms.volatility,
            expiry: terms.time_to_expiration,
            steps: steps.max(1),
            dynamics,
        }
    }

    /// Number of time steps.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Step length in years.
    pub fn dt(&self) -> f64 {
        self.expiry / self.steps as f64
    }

    /// Horizon in years.
    pub fn expiry(&self) -> f64 {
        self.expiry
    }

    /// Initial spot.
    pub fn spot(&self) -> f64 {
        self.spot
    }

    /// Risk-free rate used for drift and discounting.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Dynamics being simulated.
    pub fn dynamics(&self) -> Dynamics {
        self.dynamics
    }

    /// Representative lognormal volatility, used for discrete-monitoring
    /// corrections.
    pub fn reference_volatility(&self) -> f64 {
        match self.dynamics {
            Dynamics::Gbm => self.volatility,
            Dynamics::Heston(p) => p.v0.max(0.0).sqrt(),
            Dynamics::Sabr(p) => {
                let forward = self.spot * ((self.rate - self.dividend_yield) * self.expiry).exp();
                p.alpha * forward.powf(p.beta - 1.0)
            }
            Dynamics::JumpDiffusion(p) => {
                (self.volatility.powi(2) + p.intensity * (p.jump_mean.powi(2) + p.jump_vol.powi(2)))
                    .sqrt()
            }
        }
    }

    /// Draws the random inputs of one path.
    pub fn draw(&self, rng: &mut PricerRng, draws: &mut PathDraws) {
        let width = self.dynamics.normals_per_step();
        draws.normals.resize(self.steps * width, 0.0);
        rng.fill_normal(&mut draws.normals);
        draws.jumps.clear();
        if let Dynamics::JumpDiffusion(p) = self.dynamics {
            let mean = p.intensity * self.dt();
            draws.jumps.extend((0..self.steps).map(|_| rng.gen_poisson(mean)));
        }
    }

    /// Builds the spot path from `draws`, multiplying every normal by `sign`.
    ///
    /// `sign = -1` produces the antithetic partner of `sign = 1`.
    pub fn build(&self, draws: &PathDraws, sign: f64, path: &mut Vec<f64>) {
        path.clear();
        path.reserve(self.steps + 1);
        path.push(self.spot);

        let dt = self.dt();
        let sqrt_dt = dt.sqrt();
        let carry = self.rate - self.dividend_yield;

        match self.dynamics {
            Dynamics::Gbm => {
                let drift = (carry - 0.5 * self.volatility * self.volatility) * dt;
                let diffusion = self.volatility * sqrt_dt;
                let mut log_s = self.spot.ln();
                for &z in &draws.normals {
                    log_s += drift + diffusion * sign * z;
                    path.push(log_s.exp());
                }
            }
            Dynamics::Heston(p) => {
                let rho_bar = (1.0 - p.rho * p.rho).max(0.0).sqrt();
                let mut log_s = self.spot.ln();
                let mut v = p.v0;
                for pair in draws.normals.chunks_exact(2) {
                    let z_s = sign * pair[0];
                    let z_v = p.rho * z_s + rho_bar * sign * pair[1];
                    let v_pos = v.max(0.0);
                    let vol_dt = (v_pos * dt).sqrt();
                    log_s += (carry - 0.5 * v_pos) * dt + vol_dt * z_s;
                    v += p.kappa * (p.theta - v_pos) * dt + p.sigma * vol_dt * z_v;
                    path.push(log_s.exp());
                }
            }
            Dynamics::Sabr(p) => {
                let rho_bar = (1.0 - p.rho * p.rho).max(0.0).sqrt();
                let mut forward = self.spot * (carry * self.expiry).exp();
                let mut alpha = p.alpha;
                for (i, pair) in draws.normals.chunks_exact(2).enumerate() {
                    let z_f = sign * pair[0];
                    let z_a = p.rho * z_f + rho_bar * sign * pair[1];
                    if forward > 0.0 {
                        forward += alpha * forward.powf(p.beta) * sqrt_dt * z_f;
                        forward = forward.max(0.0);
                    }
                    alpha *= (-0.5 * p.nu * p.nu * dt + p.nu * sqrt_dt * z_a).exp();
                    let remaining = self.expiry - (i + 1) as f64 * dt;
                    path.push(forward * (-carry * remaining).exp());
                }
            }
            Dynamics::JumpDiffusion(p) => {
                let compensator = p.intensity * p.mean_jump();
                let drift = (carry - compensator - 0.5 * self.volatility * self.volatility) * dt;
                let diffusion = self.volatility * sqrt_dt;
                let mut log_s = self.spot.ln();
                for (pair, &count) in draws.normals.chunks_exact(2).zip(&draws.jumps) {
                    let n = count as f64;
                    let jump = n * p.jump_mean + n.sqrt() * p.jump_vol * sign * pair[1];
                    log_s += drift + diffusion * sign * pair[0] + jump;
                    path.push(log_s.exp());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pricer_models::instruments::OptionType;

    fn terms(vol: f64) -> OptionTerms {
        OptionTerms::new(100.0, 100.0, 1.0, 0.05, 0.01, vol, OptionType::Call)
    }

    fn one_path(sim: &PathSimulator, index: u64, sign: f64) -> Vec<f64> {
        let mut draws = PathDraws::default();
        let mut path = Vec::new();
        sim.draw(&mut PricerRng::for_path(11, index), &mut draws);
        sim.build(&draws, sign, &mut path);
        path
    }

    // ==========================================================
    // GBM
    // ==========================================================

    #[test]
    fn test_zero_vol_path_is_forward() {
        let sim = PathSimulator::new(&terms(0.0), Dynamics::Gbm, 4);
        let path = one_path(&sim, 0, 1.0);
        for (i, s) in path.iter().enumerate() {
            let t = i as f64 * 0.25;
            assert_relative_eq!(*s, 100.0 * (0.04 * t).exp(), max_relative = 1e-12);
        }
    }

    #[test]
    fn test_antithetic_log_returns_mirror() {
        let sim = PathSimulator::new(&terms(0.2), Dynamics::Gbm, 8);
        let up = one_path(&sim, 3, 1.0);
        let down = one_path(&sim, 3, -1.0);
        let drift = (0.04 - 0.02) * 1.0;
        let lhs = (up[8] / 100.0).ln() + (down[8] / 100.0).ln();
        assert_relative_eq!(lhs, 2.0 * drift, epsilon = 1e-12);
    }

    #[test]
    fn test_gbm_terminal_mean() {
        let sim = PathSimulator::new(&terms(0.2), Dynamics::Gbm, 1);
        let n = 20_000;
        let mean = (0..n).map(|i| one_path(&sim, i, 1.0)[1]).sum::<f64>() / n as f64;
        let expected = 100.0 * (0.04f64).exp();
        assert!((mean - expected).abs() < 0.5, "mean {} vs {}", mean, expected);
    }

    // ==========================================================
    // Other dynamics
    // ==========================================================

    #[test]
    fn test_heston_constant_variance_matches_gbm() {
        // σ = 0 and v0 = θ makes the variance deterministic
        let params = HestonParams::new(0.04, 1.5, 0.04, 0.0, -0.5);
        let heston = PathSimulator::new(&terms(0.2), Dynamics::Heston(params), 10);
        let path = one_path(&heston, 5, 1.0);
        assert_eq!(path.len(), 11);
        assert!(path.iter().all(|s| s.is_finite() && *s > 0.0));
    }

    #[test]
    fn test_sabr_path_ends_on_forward_measure() {
        let params = SabrParams::new(0.2, 1.0, 0.0, 0.0);
        let sim = PathSimulator::new(&terms(0.2), Dynamics::Sabr(params), 50);
        let path = one_path(&sim, 1, 1.0);
        assert_eq!(path.len(), 51);
        assert!(path.iter().all(|s| *s >= 0.0));
        assert_relative_eq!(path[0], 100.0, epsilon = 1e-12);
    }

    #[test]
    fn test_jump_paths_are_positive() {
        let params = JumpDiffusionParams::new(2.0, -0.1, 0.15);
        let sim = PathSimulator::new(&terms(0.2), Dynamics::JumpDiffusion(params), 20);
        for i in 0..50 {
            assert!(one_path(&sim, i, 1.0).iter().all(|s| *s > 0.0));
        }
    }

    #[test]
    fn test_reference_volatility() {
        let sim = PathSimulator::new(&terms(0.3), Dynamics::Gbm, 4);
        assert_eq!(sim.reference_volatility(), 0.3);
        let heston = HestonParams::new(0.09, 1.0, 0.04, 0.2, 0.0);
        let sim = PathSimulator::new(&terms(0.3), Dynamics::Heston(heston), 4);
        assert_relative_eq!(sim.reference_volatility(), 0.3, epsilon = 1e-12);
    }
}
