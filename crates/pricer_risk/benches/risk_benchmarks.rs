//! Criterion benchmarks for portfolio risk.
//!
//! Benchmarks cover:
//! - Parallel pricing of mixed option and bond portfolios
//! - Aggregation of pre-priced positions
//! - Historical VaR over growing P&L samples
//! - Preset stress scenarios

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pricer_core::cancel::CancellationToken;
use pricer_core::market_data::curves::FlatCurve;
use pricer_models::greeks::GreeksSet;
use pricer_models::instruments::{BondTerms, OptionTerms, OptionType};
use pricer_pricing::bond::BondRequest;
use pricer_pricing::options::OptionRequest;
use pricer_risk::{
    historical_var, preset_scenarios, run_scenarios, Position, PositionKind, PositionRequest,
    RiskMetricsAggregator,
};

/// Alternating calls, puts and bullet bonds with staggered terms.
fn mixed_portfolio(n: usize) -> Vec<PositionRequest> {
    (0..n)
        .map(|i| {
            let label = format!("pos-{i}");
            match i % 3 {
                0 | 1 => {
                    let payoff = if i % 3 == 0 {
                        OptionType::Call
                    } else {
                        OptionType::Put
                    };
                    let strike = 90.0 + (i % 21) as f64;
                    let terms = OptionTerms::new(100.0, strike, 0.5, 0.04, 0.01, 0.22, payoff);
                    PositionRequest::option(label, OptionRequest::new(terms), 10.0)
                }
                _ => {
                    let maturity = 2.0 + (i % 9) as f64;
                    let terms = BondTerms::fixed(1000.0, 0.045, maturity, 2);
                    PositionRequest::bond(label, BondRequest::new(terms), 1.0)
                }
            }
        })
        .collect()
}

/// Deterministic P&L sample spread around zero.
fn pnl_sample(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| (((i * 7919) % 1000) as f64 - 500.0) * 0.37)
        .collect()
}

fn bench_price_portfolio(c: &mut Criterion) {
    let mut group = c.benchmark_group("price_portfolio");
    group.sample_size(20);
    let curve = FlatCurve::new(0.04);

    for n in [30usize, 300] {
        let requests = mixed_portfolio(n);
        group.bench_with_input(BenchmarkId::new("mixed", n), &requests, |b, requests| {
            b.iter(|| {
                RiskMetricsAggregator::price_portfolio(
                    black_box(requests),
                    &curve,
                    &CancellationToken::new(),
                )
            })
        });
    }

    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for n in [1_000usize, 100_000] {
        let book: RiskMetricsAggregator = (0..n)
            .map(|i| Position {
                label: format!("pos-{i}"),
                kind: PositionKind::Option,
                weight: if i % 2 == 0 { 1.0 } else { -0.5 },
                value: 5.0,
                greeks: GreeksSet {
                    delta: 0.5,
                    gamma: 0.02,
                    vega: 19.0,
                    ..GreeksSet::zero()
                },
                rate_convexity: 0.0,
            })
            .collect();
        group.bench_with_input(BenchmarkId::new("positions", n), &book, |b, book| {
            b.iter(|| black_box(book).aggregate())
        });
    }

    group.finish();
}

fn bench_historical_var(c: &mut Criterion) {
    let mut group = c.benchmark_group("historical_var");

    for n in [250usize, 10_000] {
        let sample = pnl_sample(n);
        group.bench_with_input(BenchmarkId::new("sample", n), &sample, |b, sample| {
            b.iter(|| historical_var(black_box(sample), 0.99))
        });
    }

    group.finish();
}

fn bench_stress(c: &mut Criterion) {
    let curve = FlatCurve::new(0.04);
    let book = RiskMetricsAggregator::price_portfolio(
        &mixed_portfolio(30),
        &curve,
        &CancellationToken::new(),
    );
    let Ok(book) = book else {
        return;
    };
    let risk = book.aggregate();
    let scenarios = preset_scenarios();

    c.bench_function("stress_presets", |b| {
        b.iter(|| run_scenarios(black_box(&risk), 100.0, &scenarios))
    });
}

criterion_group!(
    benches,
    bench_price_portfolio,
    bench_aggregate,
    bench_historical_var,
    bench_stress
);
criterion_main!(benches);
