//! # liquidity-usd
//!
//! Converts central-bank balance-sheet series (and any other time-indexed
//! amounts) from their source currency to USD using historical daily FX
//! rates.
//!
//! Rates are aligned onto the exact price timestamps with backward fill.
//! A price timestamp that no rate can reach is reported as
//! [`LiquidityError::MissingRateData`](error::LiquidityError) instead of
//! being passed through unconverted.
//!
//! ## Example
//!
//! ```rust
//! use liquidity_usd::prelude::*;
//!
//! let prices = TimeSeries::from_epoch_seconds(vec![(100, 1000.0)]).unwrap();
//! let rates = TimeSeries::from_epoch_seconds(vec![(100, 0.0067)]).unwrap();
//!
//! let usd = normalize(&prices, &rates, Currency::JPY).unwrap();
//! assert_eq!(usd.timestamps(), prices.timestamps());
//! assert!((usd.values()[0] - 6.7).abs() < 1e-9);
//! ```

pub mod batch;
pub mod cache;
pub mod config;
pub mod currency;
pub mod data;
pub mod error;
pub mod series;
pub mod types;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::batch::{run_batch, JobReport};
    pub use crate::cache::{SeriesCache, SeriesKey};
    pub use crate::config::{BatchConfig, ConversionJob};
    pub use crate::currency::Currency;
    pub use crate::data::fx::{
        convert_with_source, normalize, Conversion, CsvRateSource, CurrencyNormalizer, FillPolicy,
        FillStats, InMemoryRateSource, RateSource,
    };
    pub use crate::error::{LiquidityError, Result};
    pub use crate::series::TimeSeries;
    pub use crate::types::*;
}
