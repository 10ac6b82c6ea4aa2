//! Remote rate sources
//!
//! - Yahoo Finance: daily `{CODE}USD=X` closes (feature `async`)

#[cfg(feature = "async")]
pub mod yahoo;

#[cfg(feature = "async")]
pub use yahoo::{prefetch_rates, YahooFxSource};
