//! Root-finding solvers for numerical computation.
//!
//! This module provides the root-finding algorithms used across the pricing
//! engines: bond yields, Z-spreads, OAS, lattice calibration and implied
//! volatility.
//!
//! ## Available Solvers
//!
//! - [`NewtonRaphsonSolver`]: Fast quadratic convergence using derivatives
//! - [`BisectionSolver`]: Guaranteed convergence on a sign-changing bracket
//! - [`BrentSolver`]: Robust bracketing method without derivative requirement
//!
//! [`solve_with_fallback`] chains Newton-Raphson with exactly one bisection
//! retry, which is the convergence policy used by every engine.
//!
//! ## Configuration
//!
//! All solvers use [`SolverConfig`] for configuring:
//! - `tolerance`: Convergence tolerance (default: 1e-10)
//! - `max_iterations`: Maximum iteration count (default: 100)
//!
//! ## Examples
//!
//! ```
//! use pricer_core::math::solvers::{solve_with_fallback, SolveMethod, SolverConfig};
//!
//! let cfg = SolverConfig::yield_solver();
//! let (root, method) = solve_with_fallback(
//!     |x: f64| x * x - 2.0,
//!     |x| 2.0 * x,
//!     1.0,
//!     (0.0, 2.0),
//!     cfg,
//!     SolverConfig::bracketing(),
//! )
//! .unwrap();
//! assert_eq!(method, SolveMethod::NewtonRaphson);
//! assert!((root - std::f64::consts::SQRT_2).abs() < 1e-8);
//! ```

mod bisection;
mod brent;
mod config;
mod newton_raphson;

// Re-export public types at module level
pub use bisection::BisectionSolver;
pub use brent::BrentSolver;
pub use config::SolverConfig;
pub use newton_raphson::NewtonRaphsonSolver;

use crate::types::SolverError;
use num_traits::Float;

/// Converts an `f64` literal into the solver's float type.
#[inline]
pub(crate) fn constant<T: Float>(x: f64) -> T {
    T::from(x).unwrap_or_else(T::nan)
}

/// Which algorithm produced a root in [`solve_with_fallback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveMethod {
    /// Newton-Raphson converged from the initial guess.
    NewtonRaphson,
    /// Newton-Raphson failed and bisection found the root.
    Bisection,
}

/// Newton-Raphson with a single bisection fallback.
///
/// Runs Newton from `x0` under `newton`. If that fails for any reason, or
/// converges outside `bracket`, bisection over `bracket` under `bisection`
/// is attempted once. Only when both fail is the bisection error returned.
///
/// # Arguments
///
/// * `f` - Objective
/// * `f_prime` - Derivative of the objective
/// * `x0` - Newton initial guess
/// * `bracket` - Fallback interval `(lo, hi)`; also the admissible range
/// * `newton` - Newton configuration
/// * `bisection` - Bisection configuration
pub fn solve_with_fallback<T, F, G>(
    f: F,
    f_prime: G,
    x0: T,
    bracket: (T, T),
    newton: SolverConfig<T>,
    bisection: SolverConfig<T>,
) -> Result<(T, SolveMethod), SolverError>
where
    T: Float,
    F: Fn(T) -> T,
    G: Fn(T) -> T,
{
    let (lo, hi) = bracket;
    match NewtonRaphsonSolver::new(newton).find_root(&f, f_prime, x0) {
        Ok(root) if root >= lo && root <= hi => return Ok((root, SolveMethod::NewtonRaphson)),
        Ok(root) => {
            tracing::warn!(
                root = root.to_f64().unwrap_or(f64::NAN),
                "Newton-Raphson root outside admissible range, falling back to bisection"
            );
        }
        Err(err) => {
            tracing::warn!(error = %err, "Newton-Raphson failed, falling back to bisection");
        }
    }

    BisectionSolver::new(bisection)
        .find_root(f, lo, hi)
        .map(|root| (root, SolveMethod::Bisection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_fallback_used_when_derivative_vanishes() {
        // f'(x0) = 0 at x0 = 0 forces the bisection path
        let (root, method) = solve_with_fallback(
            |x: f64| x * x * x - 1.0,
            |x| 3.0 * x * x,
            0.0,
            (-2.0, 2.0),
            SolverConfig::yield_solver(),
            SolverConfig::bracketing(),
        )
        .unwrap();
        assert_eq!(method, SolveMethod::Bisection);
        assert_abs_diff_eq!(root, 1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_out_of_range_newton_root_rejected() {
        // Newton from 5 finds +2, but only [-3, 0] is admissible
        let (root, method) = solve_with_fallback(
            |x: f64| x * x - 4.0,
            |x| 2.0 * x,
            5.0,
            (-3.0, 0.0),
            SolverConfig::yield_solver(),
            SolverConfig::bracketing(),
        )
        .unwrap();
        assert_eq!(method, SolveMethod::Bisection);
        assert_abs_diff_eq!(root, -2.0, epsilon = 1e-8);
    }

    #[test]
    fn test_both_fail() {
        let result = solve_with_fallback(
            |x: f64| x * x + 1.0,
            |x| 2.0 * x,
            0.0,
            (-1.0, 1.0),
            SolverConfig::yield_solver(),
            SolverConfig::bracketing(),
        );
        assert!(matches!(result, Err(SolverError::NoBracket { .. })));
    }
}
