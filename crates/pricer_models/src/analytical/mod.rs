//! Closed-form pricing formulas.
//!
//! This module provides:
//! - [`BlackScholes`]: European options with continuous dividend yield,
//!   including all eleven analytic Greeks and implied volatility
//! - [`black76`]: Options on a forward, used by the SABR route
//! - [`AnalyticalError`]: Errors from the formulas above

pub mod black_scholes;
pub mod error;

pub use black_scholes::{black76, BlackScholes};
pub use error::AnalyticalError;
