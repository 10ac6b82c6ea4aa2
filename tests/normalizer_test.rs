//! Integration tests for the currency normalizer
//!
//! Covers alignment, fill behaviour and error reporting through the public API

use approx::assert_relative_eq;
use liquidity_usd::currency::Currency;
use liquidity_usd::data::fx::{normalize, CurrencyNormalizer, FillPolicy};
use liquidity_usd::error::LiquidityError;
use liquidity_usd::series::{epoch_to_timestamp, TimeSeries};
use proptest::prelude::*;

fn series(points: &[(i64, f64)]) -> TimeSeries {
    TimeSeries::from_epoch_seconds(points.to_vec()).unwrap()
}

#[test]
fn test_jpy_scenario() {
    let prices = series(&[(100, 1000.0)]);
    let rates = series(&[(100, 0.0067)]);

    let usd = normalize(&prices, &rates, Currency::JPY).unwrap();

    assert_eq!(usd.len(), 1);
    assert_eq!(usd.timestamps(), prices.timestamps());
    assert_relative_eq!(usd.values()[0], 6.7, epsilon = 1e-9);
}

#[test]
fn test_backward_fill_from_single_later_rate() {
    let prices = series(&[(1, 10.0), (2, 20.0), (3, 30.0)]);
    let rates = series(&[(3, 2.0)]);

    let usd = normalize(&prices, &rates, Currency::EUR).unwrap();

    for (converted, original) in usd.iter().zip(prices.iter()) {
        assert_eq!(converted.timestamp, original.timestamp);
        assert_relative_eq!(converted.value, original.value * 2.0);
    }
}

#[test]
fn test_trailing_gap_names_timestamps() {
    let prices = series(&[(1, 10.0), (2, 20.0), (3, 30.0)]);
    let rates = series(&[(1, 2.0)]);

    let err = normalize(&prices, &rates, Currency::CNY).unwrap_err();

    assert!(matches!(err, LiquidityError::MissingRateData { currency: Currency::CNY, .. }));
    assert_eq!(
        err.missing_timestamps(),
        &[epoch_to_timestamp(2).unwrap(), epoch_to_timestamp(3).unwrap()]
    );
}

#[test]
fn test_out_of_order_prices_rejected() {
    let result = TimeSeries::from_epoch_seconds(vec![(2, 1.0), (1, 1.0), (3, 1.0)]);
    assert!(matches!(result, Err(LiquidityError::InvalidInput(_))));
}

#[test]
fn test_empty_inputs() {
    let prices = series(&[(1, 10.0)]);

    let err = normalize(&TimeSeries::empty(), &prices, Currency::EUR).unwrap_err();
    assert!(matches!(err, LiquidityError::InvalidInput(_)));

    let err = normalize(&prices, &TimeSeries::empty(), Currency::EUR).unwrap_err();
    assert!(matches!(err, LiquidityError::MissingRateData { .. }));
}

#[test]
fn test_usd_ignores_rates() {
    let prices = series(&[(1, 10.0), (2, 20.0)]);
    // Rates that would fail alignment for any other currency
    let rates = series(&[(0, 5.0)]);

    assert_eq!(normalize(&prices, &rates, Currency::USD).unwrap(), prices);
}

#[test]
fn test_forward_fill_is_opt_in() {
    let prices = series(&[(1, 10.0), (5, 10.0)]);
    let rates = series(&[(1, 1.5), (2, 1.6)]);

    assert!(normalize(&prices, &rates, Currency::GBP).is_err());

    let conversion = CurrencyNormalizer::with_fill_policy(FillPolicy::BackwardThenForward)
        .convert(&prices, &rates, Currency::GBP)
        .unwrap();
    assert_relative_eq!(conversion.series.values()[0], 15.0);
    assert_relative_eq!(conversion.series.values()[1], 16.0);
    assert_eq!(conversion.stats.forward_filled, 1);
}

#[test]
fn test_irregular_calendars() {
    // Prices on weekends, rates only on weekdays
    const DAY: i64 = 86_400;
    let prices = series(&[(5 * DAY, 100.0), (6 * DAY, 101.0), (7 * DAY, 102.0)]);
    let rates = series(&[(4 * DAY, 1.0), (7 * DAY, 1.1), (8 * DAY, 1.2)]);

    let conversion = CurrencyNormalizer::new()
        .convert(&prices, &rates, Currency::EUR)
        .unwrap();

    assert_relative_eq!(conversion.series.values()[0], 110.0, epsilon = 1e-9);
    assert_relative_eq!(conversion.series.values()[1], 111.1, epsilon = 1e-9);
    assert_relative_eq!(conversion.series.values()[2], 112.2, epsilon = 1e-9);
    assert_eq!(conversion.stats.exact, 1);
    assert_eq!(conversion.stats.backward_filled, 2);
}

fn sorted_series(max_len: usize) -> impl Strategy<Value = Vec<(i64, f64)>> {
    prop::collection::btree_map(0i64..10_000, 0.01f64..1_000_000.0, 1..max_len)
        .prop_map(|points| points.into_iter().collect())
}

proptest! {
    #[test]
    fn prop_output_matches_price_index(
        prices in sorted_series(50),
        rates in sorted_series(50),
    ) {
        let prices = TimeSeries::from_epoch_seconds(prices).unwrap();
        // A rate after every price guarantees backward fill succeeds
        let mut rates = rates;
        rates.push((20_000, 1.5));
        let rates = TimeSeries::from_epoch_seconds(rates).unwrap();

        let usd = normalize(&prices, &rates, Currency::JPY).unwrap();
        prop_assert_eq!(usd.len(), prices.len());
        prop_assert_eq!(usd.timestamps(), prices.timestamps());
    }

    #[test]
    fn prop_converted_value_uses_next_rate(
        prices in sorted_series(30),
        rates in sorted_series(30),
    ) {
        let prices = TimeSeries::from_epoch_seconds(prices).unwrap();
        let rates = TimeSeries::from_epoch_seconds(rates).unwrap();

        match normalize(&prices, &rates, Currency::EUR) {
            Ok(usd) => {
                for (converted, price) in usd.iter().zip(prices.iter()) {
                    let rate = rates
                        .iter()
                        .find(|r| r.timestamp >= price.timestamp)
                        .map(|r| r.value)
                        .unwrap();
                    prop_assert!((converted.value - price.value * rate).abs() <= 1e-9 * converted.value.abs().max(1.0));
                }
            }
            Err(err) => {
                let last_rate = rates.last().unwrap().timestamp;
                let expected: Vec<_> = prices
                    .timestamps()
                    .into_iter()
                    .filter(|ts| *ts > last_rate)
                    .collect();
                prop_assert!(!expected.is_empty());
                prop_assert_eq!(err.missing_timestamps(), expected.as_slice());
            }
        }
    }
}
