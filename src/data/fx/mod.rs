//! Foreign exchange (FX) conversion to USD
//!
//! # Components
//!
//! - **normalizer**: aligns a rate series onto price timestamps and multiplies
//! - **rates**: rate sources (in-memory, CSV directory) and the fetch-then-convert step
//!
//! # Example
//!
//! ```rust
//! use liquidity_usd::currency::Currency;
//! use liquidity_usd::data::fx::{normalize, LiquidityError};
//! use liquidity_usd::series::TimeSeries;
//!
//! let prices = TimeSeries::from_epoch_seconds(vec![(1, 10.0), (2, 20.0), (3, 30.0)]).unwrap();
//!
//! // Only one rate, after every price: backward fill covers all of them
//! let rates = TimeSeries::from_epoch_seconds(vec![(3, 2.0)]).unwrap();
//! let usd = normalize(&prices, &rates, Currency::EUR).unwrap();
//! assert_eq!(usd.values(), vec![20.0, 40.0, 60.0]);
//!
//! // Only one rate, before the last prices: trailing gap
//! let rates = TimeSeries::from_epoch_seconds(vec![(1, 2.0)]).unwrap();
//! let err = normalize(&prices, &rates, Currency::EUR).unwrap_err();
//! assert!(matches!(err, LiquidityError::MissingRateData { .. }));
//! ```

pub mod normalizer;
pub mod rates;

pub use crate::error::LiquidityError;
pub use normalizer::{normalize, Conversion, CurrencyNormalizer, FillPolicy, FillStats};
pub use rates::{convert_with_source, CsvRateSource, InMemoryRateSource, RateSource, DEFAULT_PAD_DAYS};
