//! Cross-crate checks of portfolio aggregation, VaR and stress P&L against
//! full revaluation with the pricing engines.

use approx::assert_relative_eq;
use pricer_core::cancel::CancellationToken;
use pricer_core::market_data::curves::FlatCurve;
use pricer_models::instruments::{BondTerms, OptionTerms, OptionType};
use pricer_pricing::bond::{price_bond, BondRequest};
use pricer_pricing::options::{price_option, OptionRequest};
use pricer_risk::{
    delta_normal_var, historical_var, stress_pnl, PositionRequest, PresetScenario,
    RiskFactorVolatilities, RiskMetricsAggregator, StressScenario,
};
use proptest::prelude::*;

fn call(spot: f64) -> OptionRequest {
    OptionRequest::new(OptionTerms::new(
        spot,
        100.0,
        0.5,
        0.05,
        0.0,
        0.2,
        OptionType::Call,
    ))
}

fn ten_year_note() -> BondRequest {
    BondRequest::new(BondTerms::fixed(1000.0, 0.05, 10.0, 2))
}

// ========================================
// Stress P&L against full revaluation
// ========================================

#[test]
fn test_small_spot_move_matches_reprice() {
    let curve = FlatCurve::new(0.05);
    let book = RiskMetricsAggregator::price_portfolio(
        &[PositionRequest::option("call", call(100.0), 1.0)],
        &curve,
        &CancellationToken::new(),
    )
    .unwrap();
    let risk = book.aggregate();

    let scenario = StressScenario::named("spot -1%").with_spot_shift(-0.01);
    let estimate = stress_pnl(&risk, 100.0, &scenario).unwrap();

    let base = price_option(&call(100.0)).unwrap().fair_value;
    let shocked = price_option(&call(99.0)).unwrap().fair_value;
    assert_relative_eq!(estimate.pnl, shocked - base, epsilon = 1e-2);
}

#[test]
fn test_rate_shock_tracks_bond_reprice() {
    let curve = FlatCurve::new(0.05);
    let book = RiskMetricsAggregator::price_portfolio(
        &[PositionRequest::bond("note", ten_year_note(), 1.0)],
        &curve,
        &CancellationToken::new(),
    )
    .unwrap();
    let risk = book.aggregate();
    assert!(risk.greeks.rho < 0.0);
    assert!(risk.rate_convexity > 0.0);

    let up = stress_pnl(&risk, 100.0, &PresetScenario::RatesUp100bp.scenario()).unwrap();

    let base = price_bond(&ten_year_note(), &curve).unwrap().dirty_price;
    let shocked = price_bond(&ten_year_note(), &FlatCurve::new(0.06))
        .unwrap()
        .dirty_price;
    let actual = shocked - base;

    assert!(up.pnl < 0.0);
    assert!((up.pnl - actual).abs() < 0.05 * actual.abs());
}

#[test]
fn test_equity_crash_hurts_long_calls_less_than_delta_alone() {
    let curve = FlatCurve::new(0.05);
    let book = RiskMetricsAggregator::price_portfolio(
        &[PositionRequest::option("calls", call(100.0), 100.0)],
        &curve,
        &CancellationToken::new(),
    )
    .unwrap();
    let risk = book.aggregate();
    let crash = stress_pnl(&risk, 100.0, &PresetScenario::EquityCrash.scenario()).unwrap();

    assert!(crash.pnl < 0.0);
    assert!(crash.explain.gamma > 0.0);
    assert!(crash.explain.vega > 0.0);
    assert!(crash.pnl > crash.explain.delta);
}

// ========================================
// VaR on a priced portfolio
// ========================================

#[test]
fn test_priced_portfolio_delta_normal_var() {
    let curve = FlatCurve::new(0.05);
    let book = RiskMetricsAggregator::price_portfolio(
        &[
            PositionRequest::option("calls", call(100.0), 100.0),
            PositionRequest::bond("note", ten_year_note(), 10.0),
        ],
        &curve,
        &CancellationToken::new(),
    )
    .unwrap();
    let risk = book.aggregate();
    let factors = RiskFactorVolatilities::new(100.0, 0.2)
        .with_vol_of_vol(0.3)
        .with_rate_vol(0.01);

    let estimate = delta_normal_var(&risk, &factors, 10.0 / 252.0, 0.99).unwrap();
    assert!(estimate.stdev > 0.0);
    assert_relative_eq!(estimate.var, 2.33 * estimate.stdev, epsilon = 1e-9);
    assert!(estimate.expected_shortfall > estimate.var);
}

#[test]
fn test_historical_var_from_scenario_pnl() {
    let curve = FlatCurve::new(0.05);
    let book = RiskMetricsAggregator::price_portfolio(
        &[PositionRequest::option("calls", call(100.0), 100.0)],
        &curve,
        &CancellationToken::new(),
    )
    .unwrap();
    let risk = book.aggregate();

    // Spot moves from −5% to +5% in 0.1% steps
    let pnl: Vec<f64> = (-50..=50)
        .map(|i| {
            let scenario = StressScenario::named("grid").with_spot_shift(i as f64 / 1000.0);
            stress_pnl(&risk, 100.0, &scenario).unwrap().pnl
        })
        .collect();

    let estimate = historical_var(&pnl, 0.99).unwrap();
    let worst = pnl.iter().cloned().fold(f64::INFINITY, f64::min);
    assert!(estimate.var > 0.0);
    assert!(estimate.var <= -worst + 1e-12);
    assert!(estimate.expected_shortfall >= estimate.var);
}

// ========================================
// Aggregation properties
// ========================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_aggregation_is_linear_in_weights(
        w_call in -50.0f64..50.0,
        w_bond in -5.0f64..5.0,
        scale in 0.1f64..10.0,
    ) {
        let curve = FlatCurve::new(0.04);
        let token = CancellationToken::new();
        let requests = |k: f64| {
            vec![
                PositionRequest::option("call", call(105.0), k * w_call),
                PositionRequest::bond("note", ten_year_note(), k * w_bond),
            ]
        };

        let base = RiskMetricsAggregator::price_portfolio(&requests(1.0), &curve, &token)
            .unwrap()
            .aggregate();
        let scaled = RiskMetricsAggregator::price_portfolio(&requests(scale), &curve, &token)
            .unwrap()
            .aggregate();

        let tol = 1e-9 * (1.0 + base.value.abs() * scale);
        prop_assert!((scaled.value - scale * base.value).abs() < tol);
        let delta_tol = 1e-9 * (1.0 + scale * 50.0);
        prop_assert!((scaled.greeks.delta - scale * base.greeks.delta).abs() < delta_tol);
        let rho_tol = 1e-9 * (1.0 + (scale * base.greeks.rho).abs());
        prop_assert!((scaled.greeks.rho - scale * base.greeks.rho).abs() < rho_tol);
    }
}
