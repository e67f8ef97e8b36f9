//! Error and warning types for structured error handling.
//!
//! This module provides:
//! - `PricingError`: Fatal errors from pricing operations
//! - `SolverError`: Errors from root-finding solvers
//! - `PricingWarning`: Non-fatal diagnostics attached to otherwise valid results
//!
//! Validation failures reject a request before any computation starts.
//! Convergence failures surface only after one deterministic fallback has
//! been attempted by the caller of the solver.

use std::fmt;
use thiserror::Error;

/// Categorised pricing errors.
///
/// # Variants
/// - `Validation`: Input outside its valid domain, no partial result
/// - `Convergence`: Root-finder or lattice exhausted its budget after a fallback
/// - `Cancelled`: Calculation abandoned because a newer request superseded it
///
/// # Examples
/// ```
/// use pricer_core::types::PricingError;
///
/// let err = PricingError::validation("strike must be positive");
/// assert_eq!(format!("{}", err), "Validation error: strike must be positive");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PricingError {
    /// Input data or parameters outside their valid domain.
    #[error("Validation error: {0}")]
    Validation(String),
    /// Iterative method failed to converge.
    #[error("Convergence error: {0}")]
    Convergence(String),
    /// Calculation was cancelled before completion.
    #[error("Calculation cancelled")]
    Cancelled,
}

impl PricingError {
    /// Creates a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        PricingError::Validation(msg.into())
    }

    /// Creates a convergence error from any displayable message.
    pub fn convergence(msg: impl Into<String>) -> Self {
        PricingError::Convergence(msg.into())
    }

    /// Returns `true` for input-domain failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, PricingError::Validation(_))
    }
}

/// Root-finding solver errors.
///
/// # Examples
/// ```
/// use pricer_core::types::SolverError;
///
/// let err = SolverError::MaxIterationsExceeded { iterations: 100 };
/// assert!(format!("{}", err).contains("100 iterations"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverError {
    /// Solver failed to converge within maximum iterations.
    #[error("Failed to converge after {iterations} iterations")]
    MaxIterationsExceeded {
        /// Number of iterations attempted
        iterations: usize,
    },
    /// Derivative near zero (division by zero risk in Newton-Raphson).
    #[error("Derivative near zero at x = {x}")]
    DerivativeNearZero {
        /// The x value where derivative was near zero
        x: f64,
    },
    /// No valid bracket (function values at endpoints have same sign).
    #[error("No bracket: f({a}) and f({b}) have same sign")]
    NoBracket {
        /// Left bracket endpoint
        a: f64,
        /// Right bracket endpoint
        b: f64,
    },
    /// Numerical instability during computation.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
    /// Solver observed a cancelled token between iterations.
    #[error("Solver cancelled")]
    Cancelled,
}

impl From<SolverError> for PricingError {
    fn from(err: SolverError) -> Self {
        match err {
            SolverError::Cancelled => PricingError::Cancelled,
            other => PricingError::Convergence(other.to_string()),
        }
    }
}

/// Source of a numerical instability warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InstabilityKind {
    /// Heston variance can touch zero: 2κθ < σ².
    FellerCondition,
    /// A sensitivity evaluated to a non-finite value and was zeroed.
    DegenerateGreeks,
    /// Lattice risk-neutral probability left [0, 1] and the grid was refined.
    LatticeProbability,
    /// Series or quadrature truncated before reaching its tolerance.
    Truncation,
}

/// Non-fatal diagnostic attached to an otherwise valid result.
///
/// Warnings never block a result; callers decide whether to surface them.
///
/// # Examples
/// ```
/// use pricer_core::types::{InstabilityKind, PricingWarning};
///
/// let w = PricingWarning::instability(InstabilityKind::FellerCondition, "2κθ < σ²");
/// assert!(w.to_string().starts_with("Numerical instability"));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PricingWarning {
    /// Computation completed but a numerical assumption was violated.
    NumericalInstability {
        /// What went wrong
        kind: InstabilityKind,
        /// Human-readable detail
        message: String,
    },
    /// The requested model could not serve the request and another one did.
    ModelFallback(String),
}

impl PricingWarning {
    /// Shorthand for a `NumericalInstability` warning.
    pub fn instability(kind: InstabilityKind, message: impl Into<String>) -> Self {
        PricingWarning::NumericalInstability {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a `ModelFallback` warning.
    pub fn fallback(message: impl Into<String>) -> Self {
        PricingWarning::ModelFallback(message.into())
    }

    /// Returns the instability kind, if any.
    pub fn instability_kind(&self) -> Option<InstabilityKind> {
        match self {
            PricingWarning::NumericalInstability { kind, .. } => Some(*kind),
            PricingWarning::ModelFallback(_) => None,
        }
    }
}

impl fmt::Display for PricingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingWarning::NumericalInstability { kind, message } => {
                write!(f, "Numerical instability ({:?}): {}", kind, message)
            }
            PricingWarning::ModelFallback(msg) => write!(f, "Model fallback: {}", msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_error_display() {
        let err = PricingError::convergence("ytm did not converge");
        assert_eq!(format!("{}", err), "Convergence error: ytm did not converge");
        assert_eq!(format!("{}", PricingError::Cancelled), "Calculation cancelled");
    }

    #[test]
    fn test_solver_error_converts_to_convergence() {
        let err: PricingError = SolverError::NoBracket { a: 0.0, b: 1.0 }.into();
        assert!(matches!(err, PricingError::Convergence(_)));
    }

    #[test]
    fn test_solver_cancel_converts_to_cancelled() {
        let err: PricingError = SolverError::Cancelled.into();
        assert_eq!(err, PricingError::Cancelled);
    }

    #[test]
    fn test_warning_kind() {
        let w = PricingWarning::instability(InstabilityKind::DegenerateGreeks, "vega");
        assert_eq!(w.instability_kind(), Some(InstabilityKind::DegenerateGreeks));
        assert_eq!(PricingWarning::fallback("mc").instability_kind(), None);
    }

    #[test]
    fn test_is_validation() {
        assert!(PricingError::validation("x").is_validation());
        assert!(!PricingError::Cancelled.is_validation());
    }
}
