//! Series files: a `time` column in Unix-epoch seconds plus a value column
//!
//! ```text
//! time,open,high,low,close
//! 1704153600,118.2,118.9,117.8,118.5
//! ```
//!
//! Columns other than `time` and the requested value column are ignored.

use crate::error::{LiquidityError, Result};
use crate::series::{epoch_to_timestamp, TimeSeries};
use crate::types::{Observation, TIME_COLUMN};
use csv::{ReaderBuilder, StringRecord, Writer};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Suffix inserted before the extension of converted files
pub const USD_SUFFIX: &str = "_USD";

/// Read a series from a CSV file
pub fn read_series<P: AsRef<Path>>(path: P, value_column: &str) -> Result<TimeSeries> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| {
        LiquidityError::DataError(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let series = read_series_from_reader(file, value_column)?;
    log::debug!("Loaded {} observations from {}", series.len(), path.display());
    Ok(series)
}

/// Read a series from any CSV source
pub fn read_series_from_reader<R: Read>(reader: R, value_column: &str) -> Result<TimeSeries> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr.headers()?.clone();
    let time_idx = find_column(&headers, TIME_COLUMN)?;
    let value_idx = find_column(&headers, value_column)?;

    let mut observations = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        // Header is line 1
        let line = row + 2;

        let secs: i64 = field(&record, time_idx, TIME_COLUMN, line)?
            .parse()
            .map_err(|_| {
                LiquidityError::ParseError(format!(
                    "Invalid {} value at line {}: {:?}",
                    TIME_COLUMN,
                    line,
                    record.get(time_idx).unwrap_or_default()
                ))
            })?;

        let value: f64 = field(&record, value_idx, value_column, line)?
            .parse()
            .map_err(|_| {
                LiquidityError::ParseError(format!(
                    "Invalid {} value at line {}: {:?}",
                    value_column,
                    line,
                    record.get(value_idx).unwrap_or_default()
                ))
            })?;

        observations.push(Observation::new(epoch_to_timestamp(secs)?, value));
    }

    TimeSeries::new(observations)
}

/// Write a series as `time,<value_column>` with epoch-second timestamps
pub fn write_series<P: AsRef<Path>>(
    path: P,
    series: &TimeSeries,
    value_column: &str,
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = std::fs::File::create(path)?;
    write_series_to_writer(file, series, value_column)?;
    log::debug!("Wrote {} observations to {}", series.len(), path.display());
    Ok(())
}

/// Write a series to any CSV sink
pub fn write_series_to_writer<W: Write>(
    writer: W,
    series: &TimeSeries,
    value_column: &str,
) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record([TIME_COLUMN, value_column])?;

    for obs in series {
        wtr.write_record([obs.timestamp.timestamp().to_string(), obs.value.to_string()])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Path of the converted file: `JPCBBS.csv` -> `JPCBBS_USD.csv`
pub fn usd_output_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let file_name = match path.extension() {
        Some(ext) => format!("{}{}.{}", stem, USD_SUFFIX, ext.to_string_lossy()),
        None => format!("{}{}", stem, USD_SUFFIX),
    };

    path.with_file_name(file_name)
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or_else(|| LiquidityError::InvalidInput(format!("Column '{}' not found", name)))
}

fn field<'r>(record: &'r StringRecord, idx: usize, name: &str, line: usize) -> Result<&'r str> {
    record
        .get(idx)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| LiquidityError::InvalidInput(format!("Missing {} at line {}", name, line)))
}
