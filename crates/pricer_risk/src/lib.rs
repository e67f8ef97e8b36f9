//! # Pricer Risk (L4: Application)
//!
//! Portfolio-level risk on top of the bond and option engines.
//!
//! This crate provides:
//! - Weighted aggregation of option and bond positions into portfolio
//!   value and Greeks
//! - Parallel pricing of a portfolio of requests with rayon
//! - Delta-normal and historical Value-at-Risk with Expected Shortfall
//! - Stress scenarios evaluated by second-order Taylor expansion, with
//!   presets for an equity crash, ±100bp rate moves and a vol spike
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            pricer_risk (L4)             │
//! ├─────────────────────────────────────────┤
//! │  aggregator  - Position, portfolio sum  │
//! │  var         - VaR / Expected Shortfall │
//! │  scenarios   - stress P&L, presets      │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │           pricer_pricing (L3)           │
//! │  bond, option and strategy engines      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use pricer_core::cancel::CancellationToken;
//! use pricer_core::market_data::curves::FlatCurve;
//! use pricer_models::instruments::{BondTerms, OptionTerms, OptionType};
//! use pricer_pricing::bond::BondRequest;
//! use pricer_pricing::options::OptionRequest;
//! use pricer_risk::{
//!     delta_normal_var, run_scenarios, preset_scenarios, PositionRequest,
//!     RiskFactorVolatilities, RiskMetricsAggregator,
//! };
//!
//! let curve = FlatCurve::new(0.05);
//! let call = OptionRequest::new(OptionTerms::new(
//!     100.0, 100.0, 0.25, 0.05, 0.0, 0.2, OptionType::Call,
//! ));
//! let note = BondRequest::new(BondTerms::fixed(1000.0, 0.05, 5.0, 2));
//!
//! let book = RiskMetricsAggregator::price_portfolio(
//!     &[
//!         PositionRequest::option("call", call, 100.0),
//!         PositionRequest::bond("note", note, 1.0),
//!     ],
//!     &curve,
//!     &CancellationToken::new(),
//! )
//! .unwrap();
//! let risk = book.aggregate();
//!
//! let factors = RiskFactorVolatilities::new(100.0, 0.2).with_rate_vol(0.01);
//! let var = delta_normal_var(&risk, &factors, 10.0 / 252.0, 0.99).unwrap();
//! assert!(var.expected_shortfall > var.var);
//!
//! let stressed = run_scenarios(&risk, 100.0, &preset_scenarios()).unwrap();
//! assert_eq!(stressed.len(), 4);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod aggregator;
pub mod error;
pub mod scenarios;
pub mod var;

pub use aggregator::{
    PortfolioRisk, Position, PositionInstrument, PositionKind, PositionRequest,
    RiskMetricsAggregator,
};
pub use error::RiskError;
pub use scenarios::{
    preset_scenarios, run_scenarios, stress_pnl, PnlExplain, PresetScenario, ScenarioPnl,
    StressScenario,
};
pub use var::{
    delta_normal_var, historical_var, normal_quantile, portfolio_stdev, RiskFactorVolatilities,
    VarEstimate, VarMethod, DEFAULT_CONFIDENCE, Z_99,
};
