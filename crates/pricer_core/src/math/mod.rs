//! Mathematical building blocks shared by every pricing layer.
//!
//! - [`distributions`]: Standard normal density, CDF and quantile
//! - [`solvers`]: Newton-Raphson, bisection and Brent root finders

pub mod distributions;
pub mod solvers;
