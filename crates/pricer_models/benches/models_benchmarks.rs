//! Benchmarks for the closed-form Black-Scholes formulas.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pricer_models::analytical::BlackScholes;
use pricer_models::instruments::OptionType;

fn bench_black_scholes(c: &mut Criterion) {
    let bs = BlackScholes::new(100.0, 0.05, 0.01, 0.2).unwrap();
    let mut group = c.benchmark_group("black_scholes");

    group.bench_function("price_call", |b| {
        b.iter(|| bs.price(OptionType::Call, black_box(105.0), black_box(0.5)))
    });

    group.bench_function("greeks_put", |b| {
        b.iter(|| bs.greeks(OptionType::Put, black_box(95.0), black_box(1.0)))
    });

    let target = bs.price_call(110.0, 1.0);
    group.bench_function("implied_volatility", |b| {
        b.iter(|| bs.implied_volatility(OptionType::Call, 110.0, 1.0, black_box(target)))
    });

    group.finish();
}

criterion_group!(benches, bench_black_scholes);
criterion_main!(benches);
