//! Brent's method root-finding solver.

use super::SolverConfig;
use crate::types::SolverError;
use num_traits::Float;

/// Brent root finder combining bisection, secant and inverse quadratic
/// interpolation.
///
/// Keeps the robustness of bisection with close to superlinear convergence.
/// Used for per-step lattice calibration where the objective is monotone but
/// its derivative is awkward to write down.
///
/// # Example
///
/// ```
/// use pricer_core::math::solvers::{BrentSolver, SolverConfig};
///
/// let solver = BrentSolver::new(SolverConfig::default());
/// let root = solver.find_root(|x: f64| x.cos() - x, 0.0, 1.0).unwrap();
/// assert!((root.cos() - root).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct BrentSolver<T: Float> {
    config: SolverConfig<T>,
}

impl<T: Float> BrentSolver<T> {
    /// Create a new Brent solver with the given configuration.
    pub fn new(config: SolverConfig<T>) -> Self {
        Self { config }
    }

    /// Find a root of `f` bracketed by `[a, b]`.
    ///
    /// # Returns
    ///
    /// * `Err(SolverError::NoBracket)` - `f(a)` and `f(b)` share a sign
    /// * `Err(SolverError::MaxIterationsExceeded)` - Failed to converge
    pub fn find_root<F>(&self, f: F, a: T, b: T) -> Result<T, SolverError>
    where
        F: Fn(T) -> T,
    {
        let two: T = super::constant(2.0);
        let three: T = super::constant(3.0);
        let half: T = super::constant(0.5);

        let mut a = a;
        let mut b = b;
        let mut fa = f(a);
        let mut fb = f(b);

        if fa == T::zero() {
            return Ok(a);
        }
        if fb == T::zero() {
            return Ok(b);
        }
        if fa.signum() == fb.signum() {
            return Err(SolverError::NoBracket {
                a: a.to_f64().unwrap_or(f64::NAN),
                b: b.to_f64().unwrap_or(f64::NAN),
            });
        }

        let mut c = b;
        let mut fc = fb;
        let mut d = b - a;
        let mut e = d;

        for _iteration in 0..self.config.max_iterations {
            if fb.signum() == fc.signum() {
                // Root lies between a and b; reset c
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }

            let tol = two * T::epsilon() * b.abs() + half * self.config.tolerance;
            let m = half * (c - b);

            if m.abs() <= tol || fb.abs() < self.config.tolerance {
                return Ok(b);
            }

            if e.abs() >= tol && fa.abs() > fb.abs() {
                let s = fb / fa;
                let (mut p, mut q);
                if a == c {
                    // Secant step
                    p = two * m * s;
                    q = T::one() - s;
                } else {
                    // Inverse quadratic interpolation
                    let qa = fa / fc;
                    let r = fb / fc;
                    p = s * (two * m * qa * (qa - r) - (b - a) * (r - T::one()));
                    q = (qa - T::one()) * (r - T::one()) * (s - T::one());
                }
                if p > T::zero() {
                    q = -q;
                } else {
                    p = -p;
                }
                let min1 = three * m * q - (tol * q).abs();
                let min2 = (e * q).abs();
                if two * p < min1.min(min2) {
                    e = d;
                    d = p / q;
                } else {
                    d = m;
                    e = d;
                }
            } else {
                d = m;
                e = d;
            }

            a = b;
            fa = fb;
            if d.abs() > tol {
                b = b + d;
            } else {
                b = b + if m > T::zero() { tol } else { -tol };
            }
            fb = f(b);
            if !fb.is_finite() {
                return Err(SolverError::NumericalInstability(
                    "Brent objective produced non-finite value".to_string(),
                ));
            }
        }

        Err(SolverError::MaxIterationsExceeded {
            iterations: self.config.max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_cubic() {
        let solver = BrentSolver::new(SolverConfig::default());
        let root = solver.find_root(|x: f64| x * x * x - x - 2.0, 1.0, 2.0).unwrap();
        assert_abs_diff_eq!(root * root * root - root - 2.0, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_exponential_decay_level() {
        // Typical lattice calibration shape: find a such that exp(-a) = 0.95
        let solver = BrentSolver::new(SolverConfig::default());
        let root = solver
            .find_root(|a: f64| (-a).exp() - 0.95, -1.0, 1.0)
            .unwrap();
        assert_abs_diff_eq!(root, -(0.95f64.ln()), epsilon = 1e-9);
    }

    #[test]
    fn test_no_bracket() {
        let solver = BrentSolver::new(SolverConfig::default());
        assert!(solver.find_root(|x: f64| x * x + 1.0, -2.0, 2.0).is_err());
    }
}
