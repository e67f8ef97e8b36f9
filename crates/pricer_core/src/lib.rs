//! # pricer_core: Numerical Foundation for the Pricing Engines
//!
//! ## Layer 1 (Foundation) Role
//!
//! pricer_core serves as the bottom layer of the 4-layer architecture, providing:
//! - Root finders: Newton-Raphson, bisection, Brent (`math::solvers`)
//! - Standard normal CDF, PDF and quantile (`math::distributions`)
//! - Yield curves with log-discount interpolation (`market_data::curves`)
//! - Error and warning types: `PricingError`, `SolverError`, `PricingWarning` (`types::error`)
//! - Cooperative cancellation: `CancellationToken`, `RequestGate` (`cancel`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other pricer_* crates, with minimal external dependencies:
//! - num-traits: Traits for generic numerical computation
//! - thiserror: Error derivation
//! - tracing: Diagnostics for solver fallbacks and stale results
//! - serde: Serialisation support (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use pricer_core::market_data::curves::{LogDiscountCurve, YieldCurve};
//! use pricer_core::math::distributions::norm_cdf;
//!
//! let curve = LogDiscountCurve::new(&[(1.0, 0.97), (5.0, 0.82)]).unwrap();
//! let point = curve.rate(3.0).unwrap();
//! assert!(point.discount_factor < 0.97 && point.discount_factor > 0.82);
//!
//! assert!((norm_cdf(0.0_f64) - 0.5).abs() < 1e-15);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialisation for curves, errors and warnings

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod cancel;
pub mod market_data;
pub mod math;
pub mod types;
