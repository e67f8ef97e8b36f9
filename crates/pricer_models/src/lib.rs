//! # Pricer Models (L2: Business Logic)
//!
//! Instrument terms, model parameters and closed-form formulas.
//!
//! This crate provides:
//! - Instrument definitions: vanilla and exotic options, bonds with embedded
//!   options, multi-leg strategies
//! - Model parameter sets: Heston, SABR, Merton jump diffusion, plus the
//!   Monte Carlo and binomial settings
//! - Black-Scholes and Black-76 with analytic Greeks
//! - [`greeks::GreeksSet`], the sensitivity vector shared by every engine
//!
//! ## Design Principles
//!
//! - **Enum-based models** for static dispatch
//! - **Validate before compute**: every input type exposes `validate`
//! - **Builder pattern** for configuration with sensible defaults

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod analytical;
pub mod greeks;
pub mod instruments;
pub mod models;
