//! Criterion benchmarks for the signal path.
//!
//! 1. Oscillator computation (WaveTrend + RSI) over a month of 15m bars
//! 2. Full signal generation for the same series

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use divlab_core::data::SyntheticProvider;
use divlab_core::domain::{Interval, Period, PriceSeries};
use divlab_core::indicators::{compute_oscillators, WaveTrendParams};
use divlab_core::signals::{generate_signals, StrategyParams};

fn series(period: Period) -> PriceSeries {
    let provider =
        SyntheticProvider::with_anchor(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
    PriceSeries::new(
        "BENCH-USD",
        Interval::M15,
        provider.generate("BENCH-USD", Interval::M15, period),
    )
}

fn bench_oscillators(c: &mut Criterion) {
    let mut group = c.benchmark_group("oscillators");
    for period in [Period::D5, Period::Mo1, Period::Mo3] {
        let s = series(period);
        group.bench_with_input(BenchmarkId::from_parameter(period), &s, |b, s| {
            b.iter(|| compute_oscillators(black_box(s), &WaveTrendParams::default(), 14))
        });
    }
    group.finish();
}

fn bench_signals(c: &mut Criterion) {
    let s = series(Period::Mo1);
    let params = StrategyParams::default();
    c.bench_function("generate_signals_1mo_15m", |b| {
        b.iter(|| generate_signals(black_box(&s), &params))
    });
}

criterion_group!(benches, bench_oscillators, bench_signals);
criterion_main!(benches);
