//! Core types and constants

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp type used throughout the library
pub type Timestamp = DateTime<Utc>;

/// Source-currency-to-USD exchange rate
pub type Rate = f64;

/// Name of the timestamp column in series files (Unix-epoch seconds)
pub const TIME_COLUMN: &str = "time";

/// Default name of the value column in series files
pub const DEFAULT_VALUE_COLUMN: &str = "close";

/// A single (timestamp, value) point of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: Timestamp,
    pub value: f64,
}

impl Observation {
    /// Create a new observation
    pub fn new(timestamp: Timestamp, value: f64) -> Self {
        Self { timestamp, value }
    }
}
