//! # pricer_pricing: Pricing Engines (Layer 3)
//!
//! ## Layer 3 Role
//!
//! pricer_pricing turns the instrument and model descriptions of
//! `pricer_models` into prices and risk measures:
//! - Bonds: yields, durations, Z-spread, OAS on a Black-Derman-Toy lattice,
//!   convertibles, credit and tax measures (`bond`)
//! - Single options under Black-Scholes, CRR binomial, Monte Carlo,
//!   Heston, SABR and Merton jump diffusion, with all eleven Greeks (`options`)
//! - Barrier, Asian and lookback payoffs in closed form or by simulation (`exotic`)
//! - Multi-leg strategies with breakevens and P&L bounds (`strategy`)
//! - The Monte Carlo engine and Longstaff-Schwartz regression they share (`mc`)
//!
//! ## Determinism and Cancellation
//!
//! Every path draws from its own generator seeded by mixing the request
//! seed with the path index (`rng`), so a seeded Monte Carlo price does not
//! depend on batch size or thread count. Every engine has a `*_with_cancel`
//! variant that checks a `CancellationToken` per lattice step, per path
//! batch and per root-finder iteration.
//!
//! ## Usage Examples
//!
//! ```rust
//! use pricer_models::instruments::{OptionTerms, OptionType};
//! use pricer_pricing::options::{price_option, OptionRequest};
//!
//! let call = OptionTerms::new(100.0, 100.0, 0.25, 0.05, 0.0, 0.2, OptionType::Call);
//! let put = OptionTerms::new(100.0, 100.0, 0.25, 0.05, 0.0, 0.2, OptionType::Put);
//! let c = price_option(&OptionRequest::new(call)).unwrap().fair_value;
//! let p = price_option(&OptionRequest::new(put)).unwrap().fair_value;
//! let parity = 100.0 - 100.0 * (-0.05_f64 * 0.25).exp();
//! assert!((c - p - parity).abs() < 1e-10);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialisation for requests and results

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod bond;
pub mod exotic;
pub mod mc;
pub mod options;
pub mod rng;
pub mod strategy;
