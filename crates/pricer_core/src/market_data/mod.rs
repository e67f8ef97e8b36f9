//! Market data structures for quantitative finance pricing.
//!
//! # Components
//!
//! - [`curves`]: Yield curve trait and implementations (FlatCurve, LogDiscountCurve, ShiftedCurve)
//! - [`error`]: Market data error types (MarketDataError)
//!
//! # Example
//!
//! ```
//! use pricer_core::market_data::curves::{YieldCurve, FlatCurve};
//!
//! // Create a flat yield curve with 5% rate
//! let curve = FlatCurve::new(0.05);
//! let df = curve.discount_factor(1.0).unwrap();
//! assert!((df - 0.951229).abs() < 1e-5);
//! ```

pub mod curves;
pub mod error;

// Re-export commonly used types
pub use curves::{FlatCurve, LogDiscountCurve, ShiftedCurve, YieldCurve, YieldCurvePoint};
pub use error::MarketDataError;
