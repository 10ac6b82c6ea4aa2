//! Batch conversion configuration (TOML)
//!
//! ```toml
//! rates_dir = "rates"
//! output_dir = "out"
//! fill_policy = "backward"
//! pad_days = 1
//!
//! [[jobs]]
//! input = "JPCBBS.csv"
//! currency = "JPY"
//! ```

use crate::currency::Currency;
use crate::data::fx::{FillPolicy, DEFAULT_PAD_DAYS};
use crate::error::{LiquidityError, Result};
use crate::types::DEFAULT_VALUE_COLUMN;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One series file to convert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionJob {
    pub input: PathBuf,
    pub currency: Currency,
    #[serde(default = "default_value_column")]
    pub value_column: String,
    /// Defaults to `<stem>_USD.<ext>` next to the input (or in `output_dir`)
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl ConversionJob {
    pub fn new<P: AsRef<Path>>(input: P, currency: Currency) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            currency,
            value_column: default_value_column(),
            output: None,
        }
    }
}

/// Batch of conversion jobs plus shared settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "BatchConfig::default_jobs")]
    pub jobs: Vec<ConversionJob>,
    /// Directory holding `{CODE}USD.csv` rate files
    #[serde(default = "default_rates_dir")]
    pub rates_dir: PathBuf,
    /// Where converted files go; next to each input when unset
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub fill_policy: FillPolicy,
    #[serde(default = "default_pad_days")]
    pub pad_days: i64,
}

fn default_value_column() -> String {
    DEFAULT_VALUE_COLUMN.to_string()
}

fn default_rates_dir() -> PathBuf {
    PathBuf::from("rates")
}

fn default_pad_days() -> i64 {
    DEFAULT_PAD_DAYS
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            jobs: Self::default_jobs(),
            rates_dir: default_rates_dir(),
            output_dir: None,
            fill_policy: FillPolicy::default(),
            pad_days: default_pad_days(),
        }
    }
}

impl BatchConfig {
    /// Central-bank balance-sheet series for Japan, China, the euro area,
    /// the UK and the US
    pub fn default_jobs() -> Vec<ConversionJob> {
        vec![
            ConversionJob::new("JPCBBS.csv", Currency::JPY),
            ConversionJob::new("CNCBBS.csv", Currency::CNY),
            ConversionJob::new("EUCBBS.csv", Currency::EUR),
            ConversionJob::new("GBCBBS.csv", Currency::GBP),
            ConversionJob::new("USCBBS.csv", Currency::USD),
        ]
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: BatchConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            LiquidityError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pad_days < 0 {
            return Err(LiquidityError::ConfigError(format!(
                "pad_days must not be negative, got {}",
                self.pad_days
            )));
        }

        if self.jobs.iter().any(|job| job.value_column.is_empty()) {
            return Err(LiquidityError::ConfigError(
                "value_column must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Distinct currencies across all jobs
    pub fn currencies(&self) -> Vec<Currency> {
        let mut currencies: Vec<Currency> = self.jobs.iter().map(|j| j.currency).collect();
        currencies.sort();
        currencies.dedup();
        currencies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BatchConfig::default();
        assert_eq!(config.jobs.len(), 5);
        assert_eq!(config.fill_policy, FillPolicy::Backward);
        assert_eq!(config.pad_days, 1);
        assert_eq!(config.jobs[0].input, PathBuf::from("JPCBBS.csv"));
        assert_eq!(config.jobs[0].value_column, "close");
    }

    #[test]
    fn test_parse_toml() {
        let config = BatchConfig::from_toml_str(
            r#"
            rates_dir = "fx"
            fill_policy = "backward_then_forward"

            [[jobs]]
            input = "EUCBBS.csv"
            currency = "eur"

            [[jobs]]
            input = "USCBBS.csv"
            currency = "USD"
            value_column = "value"
            "#,
        )
        .unwrap();

        assert_eq!(config.rates_dir, PathBuf::from("fx"));
        assert_eq!(config.fill_policy, FillPolicy::BackwardThenForward);
        assert_eq!(config.jobs.len(), 2);
        assert_eq!(config.jobs[0].currency, Currency::EUR);
        assert_eq!(config.jobs[1].value_column, "value");
        assert_eq!(config.currencies(), vec![Currency::USD, Currency::EUR]);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = BatchConfig::from_toml_str("").unwrap();
        assert_eq!(config, BatchConfig::default());
    }

    #[test]
    fn test_unknown_currency_rejected() {
        let result = BatchConfig::from_toml_str(
            r#"
            [[jobs]]
            input = "X.csv"
            currency = "ABC"
            "#,
        );
        assert!(matches!(result, Err(LiquidityError::TomlError(_))));
    }

    #[test]
    fn test_negative_padding_rejected() {
        let result = BatchConfig::from_toml_str("pad_days = -1");
        assert!(matches!(result, Err(LiquidityError::ConfigError(_))));
    }
}
