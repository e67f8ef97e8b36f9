//! Benchmarks for the option and bond engines.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pricer_core::cancel::CancellationToken;
use pricer_core::market_data::curves::FlatCurve;
use pricer_models::instruments::{
    BondStructure, BondTerms, EmbeddedExercise, EmbeddedOption, ExerciseStyle, OptionTerms,
    OptionType,
};
use pricer_models::models::{MonteCarloConfig, PricingModel};
use pricer_pricing::bond::{price_bond, BondRequest};
use pricer_pricing::options::{binomial_price, price_option, OptionRequest};

fn terms() -> OptionTerms {
    OptionTerms::new(100.0, 100.0, 1.0, 0.05, 0.01, 0.2, OptionType::Put)
}

fn bench_black_scholes(c: &mut Criterion) {
    let request = OptionRequest::new(terms());
    c.bench_function("black_scholes_with_greeks", |b| {
        b.iter(|| price_option(black_box(&request)))
    });
}

fn bench_binomial(c: &mut Criterion) {
    let american = terms().with_style(ExerciseStyle::American);
    let token = CancellationToken::new();
    let mut group = c.benchmark_group("binomial");
    for steps in [100, 500, 2_000] {
        group.bench_with_input(BenchmarkId::from_parameter(steps), &steps, |b, &steps| {
            b.iter(|| binomial_price(black_box(&american), steps, &token))
        });
    }
    group.finish();
}

fn bench_monte_carlo(c: &mut Criterion) {
    let mut group = c.benchmark_group("monte_carlo");
    group.sample_size(10);
    for paths in [10_000, 100_000] {
        let config = MonteCarloConfig::builder()
            .n_paths(paths)
            .n_steps(1)
            .seed(42)
            .build()
            .unwrap_or_default();
        let request = OptionRequest::new(terms()).with_model(PricingModel::MonteCarlo(config));
        group.bench_with_input(BenchmarkId::from_parameter(paths), &request, |b, request| {
            b.iter(|| price_option(black_box(request)))
        });
    }
    group.finish();
}

fn bench_callable_bond(c: &mut Criterion) {
    let curve = FlatCurve::new(0.04);
    let request = BondRequest::new(
        BondTerms::fixed(100.0, 0.06, 10.0, 2).with_structure(BondStructure::Callable),
    )
    .with_embedded_option(EmbeddedOption {
        option_type: OptionType::Call,
        exercise_style: EmbeddedExercise::American,
        exercise_price: 100.0,
        exercise_dates: vec![3.0],
        volatility: 0.15,
    });
    let mut group = c.benchmark_group("bond");
    group.sample_size(10);
    group.bench_function("callable_oas", |b| {
        b.iter(|| price_bond(black_box(&request), &curve))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_black_scholes,
    bench_binomial,
    bench_monte_carlo,
    bench_callable_bond
);
criterion_main!(benches);
