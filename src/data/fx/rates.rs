//! Exchange-rate sources
//!
//! A [`RateSource`] hands back materialized `{CODE}/USD` rate series for a
//! requested window. The normalizer never knows where the rates came from.

use super::normalizer::{Conversion, CurrencyNormalizer};
use crate::currency::Currency;
use crate::data::csv_io;
use crate::error::{LiquidityError, Result};
use crate::series::TimeSeries;
use crate::types::{Timestamp, DEFAULT_VALUE_COLUMN};
use hashbrown::HashMap;
use std::path::{Path, PathBuf};

/// Days of padding on each side of the price span when requesting rates
pub const DEFAULT_PAD_DAYS: i64 = 1;

/// Supplier of daily source-currency-to-USD rates
pub trait RateSource: Send + Sync {
    /// Rates for `currency`/USD with `start <= timestamp <= end`
    fn usd_rates(&self, currency: Currency, start: Timestamp, end: Timestamp)
        -> Result<TimeSeries>;

    /// Get the source name
    fn name(&self) -> &str;
}

/// Rate series held in memory, one per currency
///
/// # Example
/// ```
/// use liquidity_usd::currency::Currency;
/// use liquidity_usd::data::fx::{InMemoryRateSource, RateSource};
/// use liquidity_usd::series::{epoch_to_timestamp, TimeSeries};
///
/// let mut source = InMemoryRateSource::new();
/// source.insert(Currency::EUR, TimeSeries::from_epoch_seconds(vec![(1, 1.1), (5, 1.2)]).unwrap());
///
/// let rates = source
///     .usd_rates(Currency::EUR, epoch_to_timestamp(0).unwrap(), epoch_to_timestamp(2).unwrap())
///     .unwrap();
/// assert_eq!(rates.values(), vec![1.1]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryRateSource {
    rates: HashMap<Currency, TimeSeries>,
}

impl InMemoryRateSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) the rate series of a currency
    pub fn insert(&mut self, currency: Currency, rates: TimeSeries) {
        self.rates.insert(currency, rates);
    }

    pub fn contains(&self, currency: Currency) -> bool {
        self.rates.contains_key(&currency)
    }

    pub fn num_currencies(&self) -> usize {
        self.rates.len()
    }
}

impl RateSource for InMemoryRateSource {
    fn usd_rates(
        &self,
        currency: Currency,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<TimeSeries> {
        Ok(self
            .rates
            .get(&currency)
            .map(|series| series.between(start, end))
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Rate series stored as `{dir}/{CODE}USD.csv` files
///
/// Files use the same `time,close` layout as the price series.
#[derive(Debug, Clone)]
pub struct CsvRateSource {
    dir: PathBuf,
}

impl CsvRateSource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// File holding the rates of `currency`
    pub fn path_for(&self, currency: Currency) -> PathBuf {
        self.dir.join(format!("{}USD.csv", currency.code()))
    }
}

impl RateSource for CsvRateSource {
    fn usd_rates(
        &self,
        currency: Currency,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<TimeSeries> {
        let path = self.path_for(currency);
        if !path.exists() {
            return Err(LiquidityError::DataError(format!(
                "Rate file not found: {}",
                path.display()
            )));
        }

        let series = csv_io::read_series(&path, DEFAULT_VALUE_COLUMN)?;
        Ok(series.between(start, end))
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// Fetch rates for the padded price span and convert `prices` to USD
///
/// USD prices are returned unchanged without touching `source`.
pub fn convert_with_source(
    normalizer: &CurrencyNormalizer,
    prices: &TimeSeries,
    source: &dyn RateSource,
    currency: Currency,
    pad_days: i64,
) -> Result<Conversion> {
    if currency.is_usd() {
        return normalizer.convert(prices, &TimeSeries::empty(), currency);
    }

    let (start, end) = prices
        .padded_span(pad_days)
        .ok_or_else(|| LiquidityError::InvalidInput("Price series is empty".to_string()))?;

    let rates = source.usd_rates(currency, start, end)?;
    log::debug!(
        "Fetched {} {}/USD rates from {} source for {} .. {}",
        rates.len(),
        currency,
        source.name(),
        start,
        end
    );

    normalizer.convert(prices, &rates, currency)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::epoch_to_timestamp;
    use std::fs;
    use tempfile::TempDir;

    const DAY: i64 = 86_400;

    /// Panics on any lookup; proves USD conversion never fetches
    struct PanickingSource;

    impl RateSource for PanickingSource {
        fn usd_rates(&self, currency: Currency, _: Timestamp, _: Timestamp) -> Result<TimeSeries> {
            panic!("rate lookup attempted for {}", currency);
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    #[test]
    fn test_in_memory_clips_window() {
        let mut source = InMemoryRateSource::new();
        source.insert(
            Currency::JPY,
            TimeSeries::from_epoch_seconds(vec![(1, 0.01), (2, 0.02), (3, 0.03)]).unwrap(),
        );

        let rates = source
            .usd_rates(
                Currency::JPY,
                epoch_to_timestamp(2).unwrap(),
                epoch_to_timestamp(3).unwrap(),
            )
            .unwrap();
        assert_eq!(rates.values(), vec![0.02, 0.03]);
        assert!(source.contains(Currency::JPY));
        assert_eq!(source.num_currencies(), 1);
    }

    #[test]
    fn test_in_memory_unknown_currency_is_empty() {
        let source = InMemoryRateSource::new();
        let rates = source
            .usd_rates(
                Currency::EUR,
                epoch_to_timestamp(0).unwrap(),
                epoch_to_timestamp(10).unwrap(),
            )
            .unwrap();
        assert!(rates.is_empty());
    }

    #[test]
    fn test_padding_reaches_next_day_rate() {
        // Price on day 1, rate only on day 2: padding brings it into the window
        let prices = TimeSeries::from_epoch_seconds(vec![(DAY, 100.0)]).unwrap();
        let mut source = InMemoryRateSource::new();
        source.insert(
            Currency::EUR,
            TimeSeries::from_epoch_seconds(vec![(2 * DAY, 1.5)]).unwrap(),
        );

        let conversion =
            convert_with_source(&CurrencyNormalizer::new(), &prices, &source, Currency::EUR, 1)
                .unwrap();
        assert_eq!(conversion.series.values(), vec![150.0]);

        let err =
            convert_with_source(&CurrencyNormalizer::new(), &prices, &source, Currency::EUR, 0)
                .unwrap_err();
        assert!(matches!(err, LiquidityError::MissingRateData { .. }));
    }

    #[test]
    fn test_prices_at_timestamp_upper_bound() {
        let max = chrono::DateTime::<chrono::Utc>::MAX_UTC.timestamp();
        let prices = TimeSeries::from_epoch_seconds(vec![(max - 10, 100.0)]).unwrap();
        let mut source = InMemoryRateSource::new();
        source.insert(
            Currency::EUR,
            TimeSeries::from_epoch_seconds(vec![(max - 5, 1.5)]).unwrap(),
        );

        let conversion =
            convert_with_source(&CurrencyNormalizer::new(), &prices, &source, Currency::EUR, 1)
                .unwrap();
        assert_eq!(conversion.series.values(), vec![150.0]);
    }

    #[test]
    fn test_usd_never_fetches() {
        let prices = TimeSeries::from_epoch_seconds(vec![(1, 5.0)]).unwrap();
        let conversion = convert_with_source(
            &CurrencyNormalizer::new(),
            &prices,
            &PanickingSource,
            Currency::USD,
            DEFAULT_PAD_DAYS,
        )
        .unwrap();

        assert_eq!(conversion.series, prices);
    }

    #[test]
    fn test_csv_source() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("GBPUSD.csv"),
            "time,close\n100,1.25\n200,1.30\n",
        )
        .unwrap();

        let source = CsvRateSource::new(dir.path());
        assert_eq!(source.name(), "csv");

        let rates = source
            .usd_rates(
                Currency::GBP,
                epoch_to_timestamp(0).unwrap(),
                epoch_to_timestamp(150).unwrap(),
            )
            .unwrap();
        assert_eq!(rates.values(), vec![1.25]);

        let err = source
            .usd_rates(
                Currency::CNY,
                epoch_to_timestamp(0).unwrap(),
                epoch_to_timestamp(150).unwrap(),
            )
            .unwrap_err();
        assert!(matches!(err, LiquidityError::DataError(_)));
    }
}
