//! Criterion benchmarks for pricer_core curve lookups and root finders.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pricer_core::market_data::curves::{LogDiscountCurve, YieldCurve};
use pricer_core::math::distributions::norm_cdf;
use pricer_core::math::solvers::{BisectionSolver, NewtonRaphsonSolver, SolverConfig};

/// Curve with `n` annual anchors on an upward sloping zero curve.
fn build_curve(n: usize) -> LogDiscountCurve {
    let anchors: Vec<(f64, f64)> = (1..=n)
        .map(|i| {
            let t = i as f64;
            (t, 0.02 + 0.001 * t.sqrt())
        })
        .collect();
    LogDiscountCurve::from_zero_rates(&anchors).unwrap()
}

fn bench_curve_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("log_discount_curve");
    for size in [10, 50, 200] {
        let curve = build_curve(size);
        group.bench_with_input(BenchmarkId::new("rate", size), &curve, |b, curve| {
            b.iter(|| curve.rate(black_box(size as f64 * 0.37)).unwrap());
        });
    }
    group.finish();
}

fn bench_solvers(c: &mut Criterion) {
    // Annual-pay 10y 5% bond yield at price 95
    let price = |y: f64| {
        (1..=10).map(|t| 5.0 / (1.0 + y).powi(t)).sum::<f64>() + 100.0 / (1.0 + y).powi(10) - 95.0
    };
    let d_price = |y: f64| {
        (1..=10)
            .map(|t| -(t as f64) * 5.0 / (1.0 + y).powi(t + 1))
            .sum::<f64>()
            - 1000.0 / (1.0 + y).powi(11)
    };

    c.bench_function("newton_ytm", |b| {
        let solver = NewtonRaphsonSolver::new(SolverConfig::yield_solver());
        b.iter(|| solver.find_root(price, d_price, black_box(0.05)).unwrap());
    });
    c.bench_function("bisection_ytm", |b| {
        let solver = BisectionSolver::new(SolverConfig::bracketing());
        b.iter(|| solver.find_root(price, black_box(-0.5), black_box(1.0)).unwrap());
    });
    c.bench_function("norm_cdf", |b| b.iter(|| norm_cdf(black_box(0.37_f64))));
}

criterion_group!(benches, bench_curve_lookup, bench_solvers);
criterion_main!(benches);
