//! Command-line front end for the pricing engines.
//!
//! Request files (TOML, or JSON by extension) are deserialised into engine
//! requests, priced, and the results written as JSON. Configuration layers
//! a TOML file, `PRICER_*` environment variables and flags; see [`config`].
//!
//! # Commands
//!
//! - `pricer bond --input bond.toml` - bond analytics against a curve
//! - `pricer option --input call.toml` - single option under any model
//! - `pricer strategy --input straddle.toml` - multi-leg strategy
//! - `pricer risk --input book.toml` - portfolio Greeks, VaR and stress P&L

#![deny(missing_docs)]

pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use error::{CliError, Result};
