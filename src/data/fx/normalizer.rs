//! Currency normalizer - converts a price series to USD
//!
//! Rates are reindexed onto the exact price timestamps. A price timestamp
//! without an exact rate takes the nearest rate at or after it (backward
//! fill). Timestamps past the last rate are reported as missing unless the
//! caller opts into [`FillPolicy::BackwardThenForward`].

use crate::currency::Currency;
use crate::error::{LiquidityError, Result};
use crate::series::TimeSeries;
use crate::types::{Observation, Rate, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How rate gaps are filled when aligning rates onto price timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    /// Nearest rate at or after the timestamp; trailing gaps are an error
    #[default]
    Backward,
    /// Backward fill, then carry the last known rate over trailing gaps
    BackwardThenForward,
}

impl FromStr for FillPolicy {
    type Err = LiquidityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "backward" | "bfill" => Ok(FillPolicy::Backward),
            "backward_then_forward" | "backward-then-forward" | "forward" => {
                Ok(FillPolicy::BackwardThenForward)
            }
            _ => Err(LiquidityError::InvalidInput(format!(
                "Unknown fill policy: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for FillPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillPolicy::Backward => write!(f, "backward"),
            FillPolicy::BackwardThenForward => write!(f, "backward_then_forward"),
        }
    }
}

/// How each price timestamp found its rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FillStats {
    /// Rate observed at exactly the price timestamp
    pub exact: usize,
    /// Rate taken from a later observation
    pub backward_filled: usize,
    /// Rate carried from the last observation (trailing gap)
    pub forward_filled: usize,
}

impl FillStats {
    pub fn total(&self) -> usize {
        self.exact + self.backward_filled + self.forward_filled
    }
}

/// A converted series together with its alignment statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub source: Currency,
    pub series: TimeSeries,
    pub stats: FillStats,
}

/// Converts source-currency series into USD
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrencyNormalizer {
    fill_policy: FillPolicy,
}

impl CurrencyNormalizer {
    /// Create a normalizer with the default backward-fill policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a normalizer with an explicit fill policy
    pub fn with_fill_policy(fill_policy: FillPolicy) -> Self {
        Self { fill_policy }
    }

    /// Convert `prices` to USD using `rates` (source currency to USD)
    ///
    /// For USD the prices are returned unchanged and `rates` is never read.
    pub fn convert(
        &self,
        prices: &TimeSeries,
        rates: &TimeSeries,
        source: Currency,
    ) -> Result<Conversion> {
        if prices.is_empty() {
            return Err(LiquidityError::InvalidInput(
                "Price series is empty".to_string(),
            ));
        }

        if source.is_usd() {
            return Ok(Conversion {
                source,
                series: prices.clone(),
                stats: FillStats {
                    exact: prices.len(),
                    ..FillStats::default()
                },
            });
        }

        if rates.is_empty() {
            return Err(LiquidityError::MissingRateData {
                currency: source,
                timestamps: prices.timestamps(),
            });
        }

        if let Some(bad) = rates.iter().find(|r| r.value <= 0.0) {
            return Err(LiquidityError::InvalidInput(format!(
                "{}/USD rate must be positive, got {} at {}",
                source, bad.value, bad.timestamp
            )));
        }

        let (aligned, stats) = self.align(prices, rates, source)?;

        let converted = prices
            .iter()
            .zip(aligned)
            .map(|(price, rate)| Observation::new(price.timestamp, price.value * rate))
            .collect();

        log::debug!(
            "Converted {} {} observations to USD ({} exact, {} backward-filled, {} forward-filled)",
            stats.total(),
            source,
            stats.exact,
            stats.backward_filled,
            stats.forward_filled
        );

        Ok(Conversion {
            source,
            series: TimeSeries::new(converted)?,
            stats,
        })
    }

    /// Reindex `rates` onto the price timestamps in one merge pass
    fn align(
        &self,
        prices: &TimeSeries,
        rates: &TimeSeries,
        source: Currency,
    ) -> Result<(Vec<Rate>, FillStats)> {
        let rates = rates.observations();
        let mut aligned = Vec::with_capacity(prices.len());
        let mut missing: Vec<Timestamp> = Vec::new();
        let mut stats = FillStats::default();
        let mut j = 0;

        for price in prices {
            // First rate at or after the price timestamp
            while j < rates.len() && rates[j].timestamp < price.timestamp {
                j += 1;
            }

            match rates.get(j) {
                Some(rate) if rate.timestamp == price.timestamp => {
                    stats.exact += 1;
                    aligned.push(rate.value);
                }
                Some(rate) => {
                    stats.backward_filled += 1;
                    aligned.push(rate.value);
                }
                None => match (self.fill_policy, rates.last()) {
                    (FillPolicy::BackwardThenForward, Some(last)) => {
                        stats.forward_filled += 1;
                        aligned.push(last.value);
                    }
                    _ => missing.push(price.timestamp),
                },
            }
        }

        if !missing.is_empty() {
            return Err(LiquidityError::MissingRateData {
                currency: source,
                timestamps: missing,
            });
        }

        Ok((aligned, stats))
    }
}

/// Convert `prices` to USD with the default backward-fill policy
///
/// # Example
/// ```
/// use liquidity_usd::currency::Currency;
/// use liquidity_usd::data::fx::normalize;
/// use liquidity_usd::series::TimeSeries;
///
/// let prices = TimeSeries::from_epoch_seconds(vec![(100, 1000.0)]).unwrap();
/// let rates = TimeSeries::from_epoch_seconds(vec![(100, 0.0067)]).unwrap();
///
/// let usd = normalize(&prices, &rates, Currency::JPY).unwrap();
/// assert!((usd.values()[0] - 6.7).abs() < 1e-9);
/// ```
pub fn normalize(prices: &TimeSeries, rates: &TimeSeries, source: Currency) -> Result<TimeSeries> {
    CurrencyNormalizer::new()
        .convert(prices, rates, source)
        .map(|conversion| conversion.series)
}
