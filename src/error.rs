//! Error types for liquidity-usd

use crate::currency::Currency;
use crate::types::Timestamp;
use thiserror::Error;

/// Number of offending timestamps spelled out in a `MissingRateData` message
const MAX_LISTED_TIMESTAMPS: usize = 5;

/// Main error type for liquidity-usd
#[derive(Error, Debug)]
pub enum LiquidityError {
    /// Malformed or empty series, non-monotonic timestamps, bad values
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No usable exchange rate for one or more required timestamps
    #[error(
        "Missing {currency}/USD rate data at {} timestamp(s): {}",
        .timestamps.len(),
        list_timestamps(.timestamps)
    )]
    MissingRateData {
        currency: Currency,
        timestamps: Vec<Timestamp>,
    },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl LiquidityError {
    /// Timestamps a `MissingRateData` error names; empty for every other variant
    pub fn missing_timestamps(&self) -> &[Timestamp] {
        match self {
            LiquidityError::MissingRateData { timestamps, .. } => timestamps,
            _ => &[],
        }
    }
}

fn list_timestamps(timestamps: &[Timestamp]) -> String {
    let mut listed: Vec<String> = timestamps
        .iter()
        .take(MAX_LISTED_TIMESTAMPS)
        .map(|ts| ts.to_rfc3339())
        .collect();

    if timestamps.len() > MAX_LISTED_TIMESTAMPS {
        listed.push(format!(
            "... and {} more",
            timestamps.len() - MAX_LISTED_TIMESTAMPS
        ));
    }

    listed.join(", ")
}

/// Result type alias for liquidity-usd operations
pub type Result<T> = std::result::Result<T, LiquidityError>;
