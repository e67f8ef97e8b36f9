//! Solver configuration types.

use num_traits::Float;

/// Configuration for root-finding algorithms.
///
/// Provides common settings shared across all solver implementations,
/// including convergence tolerance and iteration limits.
///
/// # Type Parameters
///
/// * `T` - Floating-point type for tolerance (e.g., `f64`)
///
/// # Example
///
/// ```
/// use pricer_core::math::solvers::SolverConfig;
///
/// // Use default configuration
/// let config: SolverConfig<f64> = SolverConfig::default();
/// assert!(config.tolerance < 1e-8);
/// assert!(config.max_iterations >= 50);
///
/// // Bond yield settings
/// let ytm = SolverConfig::<f64>::yield_solver();
/// assert_eq!(ytm.max_iterations, 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverConfig<T: Float> {
    /// Convergence tolerance for root finding.
    ///
    /// The solver stops when `|f(x)| < tolerance` (or, for bracketing
    /// methods, when the bracket is narrower than `tolerance`).
    pub tolerance: T,

    /// Maximum number of iterations before giving up.
    ///
    /// If the solver doesn't converge within this limit,
    /// it returns `SolverError::MaxIterationsExceeded`.
    pub max_iterations: usize,
}

impl<T: Float> Default for SolverConfig<T> {
    /// Default values:
    /// - `tolerance`: 1e-10
    /// - `max_iterations`: 100
    fn default() -> Self {
        Self {
            tolerance: super::constant(1e-10),
            max_iterations: 100,
        }
    }
}

impl<T: Float> SolverConfig<T> {
    /// Create a new configuration with specified values.
    ///
    /// Non-positive tolerances and a zero iteration cap are clamped to the
    /// smallest usable values rather than rejected.
    ///
    /// # Example
    ///
    /// ```
    /// use pricer_core::math::solvers::SolverConfig;
    ///
    /// let config = SolverConfig::new(1e-12, 200);
    /// assert_eq!(config.max_iterations, 200);
    /// ```
    pub fn new(tolerance: T, max_iterations: usize) -> Self {
        let tolerance = if tolerance > T::zero() {
            tolerance
        } else {
            T::epsilon()
        };
        Self {
            tolerance,
            max_iterations: max_iterations.max(1),
        }
    }

    /// Settings used for bond yield solving: tolerance 1e-8, 100 iterations.
    pub fn yield_solver() -> Self {
        Self {
            tolerance: super::constant(1e-8),
            max_iterations: 100,
        }
    }

    /// Settings for bracketing fallbacks, which converge linearly and need
    /// a larger iteration budget.
    pub fn bracketing() -> Self {
        Self {
            tolerance: super::constant(1e-10),
            max_iterations: 200,
        }
    }

    /// Create a configuration with high precision settings.
    ///
    /// Uses tighter tolerance (1e-14) and more iterations (500).
    pub fn high_precision() -> Self {
        Self {
            tolerance: super::constant(1e-14),
            max_iterations: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config: SolverConfig<f64> = SolverConfig::default();
        assert!((config.tolerance - 1e-10).abs() < 1e-15);
        assert_eq!(config.max_iterations, 100);
    }

    #[test]
    fn test_yield_solver_config() {
        let config: SolverConfig<f64> = SolverConfig::yield_solver();
        assert!((config.tolerance - 1e-8).abs() < 1e-20);
        assert_eq!(config.max_iterations, 100);
    }

    #[test]
    fn test_new_clamps_degenerate_values() {
        let config: SolverConfig<f64> = SolverConfig::new(-1.0, 0);
        assert!(config.tolerance > 0.0);
        assert_eq!(config.max_iterations, 1);
    }
}
