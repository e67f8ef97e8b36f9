//! Instrument definitions.
//!
//! This module provides:
//! - `option`: Vanilla option terms, payoff and exercise style
//! - `exotic`: Barrier, Asian and lookback payoff specifications
//! - `bond`: Bond terms with embedded options, credit, tax and conversion inputs
//! - `strategy`: Multi-leg option strategies
//! - `error`: Validation errors
//!
//! Instruments are immutable value types. Each exposes a `validate` method
//! that engines call before any computation.

pub mod bond;
pub mod error;
pub mod exotic;
pub mod option;
pub mod strategy;

pub use bond::{
    validate_bond_features, BondStructure, BondTerms, ConversionTerms, CreditAnalysis,
    EmbeddedExercise, EmbeddedOption, TaxAnalysis, SUPPORTED_FREQUENCIES,
};
pub use error::InstrumentError;
pub use exotic::{
    AsianSpec, AveragingType, BarrierSpec, BarrierType, ExoticPayoff, LookbackSpec, LookbackType,
};
pub use option::{ExerciseStyle, OptionTerms, OptionType};
pub use strategy::{StrategyDefinition, StrategyKind, StrategyLeg};
