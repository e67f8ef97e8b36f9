//! Core error and diagnostic types.
//!
//! This module provides:
//! - `error`: Structured error types for pricing and solver operations, plus
//!   the non-fatal warnings attached to results
//!
//! # Re-exports
//!
//! - [`PricingError`], [`SolverError`], [`PricingWarning`], [`InstabilityKind`] from `error`

pub mod error;

// Re-export commonly used types at module level
pub use error::{InstabilityKind, PricingError, PricingWarning, SolverError};
