//! Yield curve abstractions for discounting and rate calculations.
//!
//! This module provides:
//! - [`YieldCurve`]: Trait for discount factor and rate calculations
//! - [`YieldCurvePoint`]: Spot, forward and discount factor at one maturity
//! - [`FlatCurve`]: Constant rate yield curve implementation
//! - [`LogDiscountCurve`]: Anchor-based curve interpolated in log-discount space
//! - [`ShiftedCurve`]: Parallel-shifted view of another curve

mod flat;
mod log_discount;
mod shifted;
mod traits;

pub use flat::FlatCurve;
pub use log_discount::LogDiscountCurve;
pub use shifted::ShiftedCurve;
pub use traits::{YieldCurve, YieldCurvePoint};
