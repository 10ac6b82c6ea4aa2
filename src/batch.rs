//! Batch conversion of series files to USD
//!
//! Each job reads a series file, converts it with rates from a
//! [`RateSource`] and writes the `_USD` file. Jobs run in parallel and fail
//! independently: a missing rate for one currency does not stop the rest.

use crate::config::{BatchConfig, ConversionJob};
use crate::currency::Currency;
use crate::data::csv_io;
use crate::data::fx::{convert_with_source, CurrencyNormalizer, FillStats, RateSource};
use crate::error::Result;
use crate::types::Timestamp;
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of a single job
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub input: PathBuf,
    pub currency: Currency,
    pub output: Option<PathBuf>,
    pub observations: usize,
    pub stats: FillStats,
    /// Set when the job failed
    pub error: Option<String>,
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Run every job in `config` against `source`
///
/// Reports come back in job order.
pub fn run_batch(config: &BatchConfig, source: &dyn RateSource) -> Vec<JobReport> {
    let normalizer = CurrencyNormalizer::with_fill_policy(config.fill_policy);

    config
        .jobs
        .par_iter()
        .map(|job| match run_job(config, &normalizer, job, source) {
            Ok(report) => report,
            Err(e) => {
                log::warn!("Failed to convert {}: {}", job.input.display(), e);
                JobReport {
                    input: job.input.clone(),
                    currency: job.currency,
                    output: None,
                    observations: 0,
                    stats: FillStats::default(),
                    error: Some(e.to_string()),
                }
            }
        })
        .collect()
}

/// Convert one file and write its `_USD` counterpart
pub fn run_job(
    config: &BatchConfig,
    normalizer: &CurrencyNormalizer,
    job: &ConversionJob,
    source: &dyn RateSource,
) -> Result<JobReport> {
    let prices = csv_io::read_series(&job.input, &job.value_column)?;
    let conversion = convert_with_source(normalizer, &prices, source, job.currency, config.pad_days)?;

    let output = output_path(config, job);
    csv_io::write_series(&output, &conversion.series, &job.value_column)?;

    log::info!(
        "Converted {} from {} to USD -> {}",
        job.input.display(),
        job.currency,
        output.display()
    );

    Ok(JobReport {
        input: job.input.clone(),
        currency: job.currency,
        output: Some(output),
        observations: conversion.series.len(),
        stats: conversion.stats,
        error: None,
    })
}

/// Padded window covering every non-USD input, for downloading rates up front
///
/// Inputs that cannot be read are logged and left out; their jobs fail on
/// their own when the batch runs.
pub fn rate_window(config: &BatchConfig) -> Option<(Timestamp, Timestamp)> {
    let mut window: Option<(Timestamp, Timestamp)> = None;

    for job in config.jobs.iter().filter(|j| !j.currency.is_usd()) {
        let prices = match csv_io::read_series(&job.input, &job.value_column) {
            Ok(prices) => prices,
            Err(e) => {
                log::warn!("Skipping {} when sizing rate window: {}", job.input.display(), e);
                continue;
            }
        };

        if let Some((start, end)) = prices.padded_span(config.pad_days) {
            window = Some(match window {
                Some((s, e)) => (s.min(start), e.max(end)),
                None => (start, end),
            });
        }
    }

    window
}

fn output_path(config: &BatchConfig, job: &ConversionJob) -> PathBuf {
    if let Some(output) = &job.output {
        return output.clone();
    }

    let default = csv_io::usd_output_path(&job.input);
    match (&config.output_dir, default.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => default,
    }
}
