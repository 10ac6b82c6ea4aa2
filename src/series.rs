//! Time-indexed series with strictly increasing timestamps

use crate::error::{LiquidityError, Result};
use crate::types::{Observation, Timestamp};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;

/// Ordered (timestamp, value) series
///
/// Timestamps are strictly increasing (no duplicates) and every value is
/// finite. Both properties are checked on construction, so a `TimeSeries`
/// in hand is always well-formed. An empty series is allowed.
///
/// # Example
/// ```
/// use liquidity_usd::series::TimeSeries;
///
/// let series = TimeSeries::from_epoch_seconds(vec![(1, 10.0), (2, 11.0)]).unwrap();
/// assert_eq!(series.len(), 2);
///
/// // Out of order
/// assert!(TimeSeries::from_epoch_seconds(vec![(2, 10.0), (1, 11.0)]).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeSeries {
    observations: Vec<Observation>,
}

impl TimeSeries {
    /// Create a series, validating ordering and values
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        for (idx, obs) in observations.iter().enumerate() {
            if !obs.value.is_finite() {
                return Err(LiquidityError::InvalidInput(format!(
                    "Non-finite value {} at {}",
                    obs.value, obs.timestamp
                )));
            }

            if idx > 0 {
                let prev = observations[idx - 1].timestamp;
                if obs.timestamp <= prev {
                    return Err(LiquidityError::InvalidInput(format!(
                        "Timestamps must be strictly increasing: {} follows {} at position {}",
                        obs.timestamp, prev, idx
                    )));
                }
            }
        }

        Ok(Self { observations })
    }

    /// Create an empty series
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a series from (Unix-epoch seconds, value) pairs
    pub fn from_epoch_seconds(points: Vec<(i64, f64)>) -> Result<Self> {
        let observations = points
            .into_iter()
            .map(|(secs, value)| Ok(Observation::new(epoch_to_timestamp(secs)?, value)))
            .collect::<Result<Vec<_>>>()?;

        Self::new(observations)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    pub fn timestamps(&self) -> Vec<Timestamp> {
        self.observations.iter().map(|o| o.timestamp).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    pub fn first(&self) -> Option<&Observation> {
        self.observations.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// First and last timestamps, `None` when empty
    pub fn span(&self) -> Option<(Timestamp, Timestamp)> {
        Some((self.first()?.timestamp, self.last()?.timestamp))
    }

    /// Span widened by `days` on both sides
    ///
    /// Rate sources are asked for this window so that a rate exists at or
    /// after the last observation. The window saturates at the bounds of
    /// the timestamp range.
    pub fn padded_span(&self, days: i64) -> Option<(Timestamp, Timestamp)> {
        let (start, end) = self.span()?;
        let Some(pad) = Duration::try_days(days) else {
            return Some((DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC));
        };

        Some((
            start.checked_sub_signed(pad).unwrap_or(DateTime::<Utc>::MIN_UTC),
            end.checked_add_signed(pad).unwrap_or(DateTime::<Utc>::MAX_UTC),
        ))
    }

    /// Sub-series with `start <= timestamp <= end`
    pub fn between(&self, start: Timestamp, end: Timestamp) -> TimeSeries {
        let lo = self.observations.partition_point(|o| o.timestamp < start);
        let hi = self.observations.partition_point(|o| o.timestamp <= end);

        TimeSeries {
            observations: if lo < hi {
                self.observations[lo..hi].to_vec()
            } else {
                Vec::new()
            },
        }
    }
}

impl<'a> IntoIterator for &'a TimeSeries {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

/// Convert Unix-epoch seconds to a UTC timestamp
pub fn epoch_to_timestamp(secs: i64) -> Result<Timestamp> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| LiquidityError::InvalidInput(format!("Timestamp out of range: {}", secs)))
}
