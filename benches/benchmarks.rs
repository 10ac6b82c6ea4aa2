use criterion::{black_box, criterion_group, criterion_main, Criterion};
use liquidity_usd::currency::Currency;
use liquidity_usd::data::fx::{normalize, CurrencyNormalizer, FillPolicy};
use liquidity_usd::series::TimeSeries;

const DAY: i64 = 86_400;

fn daily_series(days: i64, step: i64, value: f64) -> TimeSeries {
    let points = (0..days)
        .step_by(step as usize)
        .map(|d| (d * DAY, value + d as f64))
        .collect();
    TimeSeries::from_epoch_seconds(points).unwrap()
}

fn benchmark_normalize(c: &mut Criterion) {
    // 40 years of daily prices against weekday-ish rates
    let prices = daily_series(14_600, 1, 1000.0);
    let rates = daily_series(14_601, 2, 0.0067);

    c.bench_function("normalize_40y_daily", |b| {
        b.iter(|| normalize(black_box(&prices), black_box(&rates), Currency::JPY).unwrap())
    });
}

fn benchmark_forward_fill(c: &mut Criterion) {
    let prices = daily_series(14_600, 1, 1000.0);
    let rates = daily_series(7_300, 1, 1.1);
    let normalizer = CurrencyNormalizer::with_fill_policy(FillPolicy::BackwardThenForward);

    c.bench_function("normalize_trailing_gap_forward_fill", |b| {
        b.iter(|| {
            normalizer
                .convert(black_box(&prices), black_box(&rates), Currency::EUR)
                .unwrap()
        })
    });
}

criterion_group!(benches, benchmark_normalize, benchmark_forward_fill);
criterion_main!(benches);
