//! Bisection root-finding solver.

use super::SolverConfig;
use crate::types::SolverError;
use num_traits::Float;

/// Interval-halving root finder.
///
/// Slow (linear convergence) but guaranteed to converge for any continuous
/// function whose values at the bracket endpoints differ in sign. Used as the
/// deterministic fallback for Newton-Raphson and for spread solving on
/// lattices where derivatives are unavailable.
///
/// # Example
///
/// ```
/// use pricer_core::math::solvers::{BisectionSolver, SolverConfig};
///
/// let solver = BisectionSolver::new(SolverConfig::bracketing());
/// let root = solver.find_root(|x: f64| x * x * x - 8.0, 0.0, 5.0).unwrap();
/// assert!((root - 2.0).abs() < 1e-8);
/// ```
#[derive(Debug, Clone)]
pub struct BisectionSolver<T: Float> {
    config: SolverConfig<T>,
}

impl<T: Float> BisectionSolver<T> {
    /// Create a new bisection solver with the given configuration.
    pub fn new(config: SolverConfig<T>) -> Self {
        Self { config }
    }

    /// Find a root of `f` inside `[a, b]`.
    ///
    /// Stops when the half-width falls below `tolerance` or `|f(mid)|`
    /// falls below `tolerance`.
    ///
    /// # Returns
    ///
    /// * `Err(SolverError::NoBracket)` - `f(a)` and `f(b)` share a sign
    /// * `Err(SolverError::MaxIterationsExceeded)` - Bracket not narrowed in time
    pub fn find_root<F>(&self, f: F, a: T, b: T) -> Result<T, SolverError>
    where
        F: Fn(T) -> T,
    {
        self.find_root_with(|x| Ok(f(x)), a, b)
    }

    /// Fallible variant of [`find_root`](Self::find_root).
    ///
    /// The objective may abort the search by returning an error (for
    /// instance `SolverError::Cancelled` when a calculation is superseded).
    pub fn find_root_with<F>(&self, f: F, a: T, b: T) -> Result<T, SolverError>
    where
        F: Fn(T) -> Result<T, SolverError>,
    {
        let (mut lo, mut hi) = if a <= b { (a, b) } else { (b, a) };
        let mut f_lo = f(lo)?;
        let f_hi = f(hi)?;

        if f_lo == T::zero() {
            return Ok(lo);
        }
        if f_hi == T::zero() {
            return Ok(hi);
        }
        if f_lo.signum() == f_hi.signum() || !f_lo.is_finite() || !f_hi.is_finite() {
            return Err(SolverError::NoBracket {
                a: lo.to_f64().unwrap_or(f64::NAN),
                b: hi.to_f64().unwrap_or(f64::NAN),
            });
        }

        let two: T = super::constant(2.0);
        for _iteration in 0..self.config.max_iterations {
            let mid = (lo + hi) / two;
            let f_mid = f(mid)?;

            if f_mid.abs() < self.config.tolerance || (hi - lo) / two < self.config.tolerance {
                return Ok(mid);
            }

            if f_mid.signum() == f_lo.signum() {
                lo = mid;
                f_lo = f_mid;
            } else {
                hi = mid;
            }
        }

        Err(SolverError::MaxIterationsExceeded {
            iterations: self.config.max_iterations,
        })
    }

    /// Returns a reference to the solver configuration.
    pub fn config(&self) -> &SolverConfig<T> {
        &self.config
    }
}
