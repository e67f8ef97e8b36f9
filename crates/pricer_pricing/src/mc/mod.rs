//! Monte Carlo simulation.
//!
//! - [`PathSimulator`]: GBM, Heston, SABR and jump-diffusion path generation
//! - [`MonteCarloEngine`]: parallel, batch-invariant estimator with antithetic
//!   and control-variate variance reduction
//! - [`price_american`]: Longstaff-Schwartz early exercise

mod engine;
mod lsm;
mod paths;

pub use engine::{McEstimate, MonteCarloEngine, PathOutcome, PathStats, CONFIDENCE_Z};
pub use lsm::price_american;
pub use paths::{Dynamics, PathDraws, PathSimulator};
