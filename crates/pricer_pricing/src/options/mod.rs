//! Single-option pricing across models.
//!
//! - [`price_option`]: validates a request, routes it to an engine and
//!   assembles the [`OptionResult`]
//! - Engines: [`binomial_price`] (CRR), [`heston_price`] (Fourier),
//!   [`sabr_price`] (Hagan + Black-76), [`merton_price`] (jump series); Black-Scholes
//!   and Black-76 live in `pricer_models::analytical`, simulation in [`crate::mc`]
//! - [`finite_difference_greeks`]: bump-and-revalue sensitivities for every
//!   engine without analytic Greeks
//!
//! # Example
//!
//! ```
//! use pricer_models::instruments::{OptionTerms, OptionType};
//! use pricer_models::models::{ModelKind, PricingModel, SabrParams};
//! use pricer_pricing::options::{price_option, OptionRequest};
//!
//! let terms = OptionTerms::new(100.0, 110.0, 1.0, 0.03, 0.0, 0.2, OptionType::Call);
//! let request = OptionRequest::new(terms).with_model(PricingModel::Sabr(SabrParams::new(0.2, 1.0, 0.5, -0.3)));
//! let result = price_option(&request).unwrap();
//! assert_eq!(result.model, ModelKind::Sabr);
//! assert!(result.greeks.vega > 0.0);
//! ```

mod binomial;
mod dispatch;
mod greeks;
mod heston;
mod merton;
mod request;
mod sabr;

pub use binomial::{binomial_price, LatticePrice};
pub use dispatch::{price_option, price_option_with_cancel};
pub use greeks::{finite_difference_greeks, BaseInputs, Bump, GreeksConfig};
pub use heston::{heston_price, HestonPrice};
pub use merton::{merton_price, MertonPrice};
pub use request::{OptionRequest, OptionResult};
pub use sabr::{sabr_price, sabr_reference_vol};
