//! Cooperative cancellation and "latest request wins" across the engines.

use pricer_core::cancel::{CancellationToken, RequestGate};
use pricer_core::market_data::curves::FlatCurve;
use pricer_core::types::PricingError;
use pricer_models::instruments::{
    BondStructure, BondTerms, EmbeddedExercise, EmbeddedOption, ExerciseStyle, OptionTerms,
    OptionType,
};
use pricer_models::models::{BinomialConfig, MonteCarloConfig, PricingModel};
use pricer_pricing::bond::{price_bond_with_cancel, BondRequest};
use pricer_pricing::options::{price_option_with_cancel, OptionRequest};

fn put() -> OptionTerms {
    OptionTerms::new(100.0, 105.0, 1.0, 0.04, 0.0, 0.3, OptionType::Put)
}

#[test]
fn test_cancelled_token_stops_every_engine() {
    let token = CancellationToken::new();
    token.cancel();

    let lattice = OptionRequest::new(put().with_style(ExerciseStyle::American))
        .with_model(PricingModel::BinomialTree(BinomialConfig::new(2_000)));
    assert_eq!(
        price_option_with_cancel(&lattice, &token),
        Err(PricingError::Cancelled)
    );

    let config = MonteCarloConfig::builder()
        .n_paths(50_000)
        .n_steps(50)
        .seed(3)
        .build()
        .unwrap();
    let simulation = OptionRequest::new(put().with_style(ExerciseStyle::American))
        .with_model(PricingModel::MonteCarlo(config));
    assert_eq!(
        price_option_with_cancel(&simulation, &token),
        Err(PricingError::Cancelled)
    );

    let callable = BondRequest::new(
        BondTerms::fixed(100.0, 0.05, 10.0, 2).with_structure(BondStructure::Callable),
    )
    .with_embedded_option(EmbeddedOption {
        option_type: OptionType::Call,
        exercise_style: EmbeddedExercise::American,
        exercise_price: 100.0,
        exercise_dates: vec![3.0],
        volatility: 0.1,
    });
    assert_eq!(
        price_bond_with_cancel(&callable, &FlatCurve::new(0.04), &token),
        Err(PricingError::Cancelled)
    );
}

#[test]
fn test_superseded_request_is_discarded() {
    let gate = RequestGate::new();
    let request = OptionRequest::new(put());

    let stale = gate.begin();
    let latest = gate.begin();
    assert!(stale.token().is_cancelled());

    let stale_result = price_option_with_cancel(&request, stale.token());
    assert_eq!(stale_result, Err(PricingError::Cancelled));
    assert!(gate.accept(&stale, stale_result).is_none());

    let fresh = price_option_with_cancel(&request, latest.token());
    let accepted = gate.accept(&latest, fresh).unwrap().unwrap();
    assert!(accepted.fair_value > 0.0);
}
