//! Yahoo Finance FX rate source
//!
//! Downloads the daily `{CODE}USD=X` history from the chart API. No API key
//! required.

use crate::cache::{SeriesCache, SeriesKey};
use crate::currency::Currency;
use crate::data::fx::InMemoryRateSource;
use crate::error::{LiquidityError, Result};
use crate::series::TimeSeries;
use crate::types::{Observation, Timestamp};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance FX source
pub struct YahooFxSource {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl YahooFxSource {
    /// Create a new Yahoo Finance FX source
    pub fn new() -> Result<Self> {
        Self::with_base_url(YAHOO_BASE_URL)
    }

    /// Create a source pointing at another chart endpoint
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| LiquidityError::DataError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch daily `currency`/USD closes between `start` and `end`
    pub async fn fetch_usd_rates(
        &self,
        currency: Currency,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<TimeSeries> {
        let url = format!(
            "{}/{}?period1={}&period2={}&interval=1d",
            self.base_url,
            currency.yahoo_fx_symbol(),
            start.timestamp(),
            end.timestamp()
        );

        log::info!("Downloading {} rates", currency.yahoo_fx_symbol());

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LiquidityError::DataError(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(LiquidityError::DataError(format!(
                "Yahoo Finance returned error for {}: {}",
                currency.yahoo_fx_symbol(),
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| LiquidityError::DataError(format!("Failed to read response: {}", e)))?;

        parse_chart_data(&text)
    }
}

/// Parse a chart API response into daily closes
///
/// Each bar is keyed by the UTC midnight of its trading day. `null` closes
/// (market holidays) are skipped; when two bars fall on the same day (the
/// live bar of the current session) the later one wins.
pub(crate) fn parse_chart_data(json: &str) -> Result<TimeSeries> {
    let response: ChartResponse = serde_json::from_str(json)?;

    if let Some(error) = response.chart.error {
        return Err(LiquidityError::DataError(format!(
            "Yahoo Finance chart error {}: {}",
            error.code, error.description
        )));
    }

    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| LiquidityError::DataError("Yahoo response has no chart result".to_string()))?;

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|quote| quote.close)
        .unwrap_or_default();

    if closes.len() != result.timestamp.len() {
        return Err(LiquidityError::DataError(format!(
            "Yahoo response has {} timestamps but {} closes",
            result.timestamp.len(),
            closes.len()
        )));
    }

    let mut observations: Vec<Observation> = Vec::with_capacity(closes.len());
    for (secs, close) in result.timestamp.into_iter().zip(closes) {
        let Some(rate) = close else {
            continue;
        };

        let day = DateTime::from_timestamp(secs, 0)
            .and_then(|dt| dt.date_naive().and_hms_opt(0, 0, 0))
            .ok_or_else(|| LiquidityError::DataError(format!("Invalid timestamp: {}", secs)))?;
        let timestamp = DateTime::<Utc>::from_naive_utc_and_offset(day, Utc);

        match observations.last_mut() {
            Some(last) if last.timestamp == timestamp => last.value = rate,
            _ => observations.push(Observation::new(timestamp, rate)),
        }
    }

    TimeSeries::new(observations)
}

/// Download rates for every non-USD currency into an in-memory source
///
/// Downloads go through `cache`, so repeated requests for the same range
/// hit the network once. A currency whose download fails is left out of
/// the source, so only the jobs needing it fail.
pub async fn prefetch_rates(
    yahoo: &YahooFxSource,
    currencies: &[Currency],
    start: Timestamp,
    end: Timestamp,
    cache: &mut SeriesCache,
) -> Result<InMemoryRateSource> {
    let mut source = InMemoryRateSource::new();

    for &currency in currencies.iter().filter(|c| !c.is_usd()) {
        let key = SeriesKey::new(currency.yahoo_fx_symbol(), start.date_naive(), end.date_naive());

        let rates = match cache.get(&key) {
            Some(series) => series.clone(),
            None => match yahoo.fetch_usd_rates(currency, start, end).await {
                Ok(series) => {
                    cache.insert(key, series.clone());
                    series
                }
                Err(e) => {
                    log::warn!("Skipping {} rates: {}", currency.yahoo_fx_symbol(), e);
                    continue;
                }
            },
        };

        source.insert(currency, rates);
    }

    Ok(source)
}
