//! liquidity-usd CLI - convert balance-sheet series files to USD
//!
//! ## Example Usage
//!
//! ```bash
//! # Convert one file with a local rate file
//! liquidity-usd convert JPCBBS.csv --currency JPY --rates rates/JPYUSD.csv
//!
//! # Run every job from the config file
//! liquidity-usd batch --config liquidity.toml
//!
//! # List supported currencies
//! liquidity-usd info
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use liquidity_usd::batch::{run_batch, JobReport};
use liquidity_usd::config::BatchConfig;
use liquidity_usd::currency::Currency;
use liquidity_usd::data::csv_io;
use liquidity_usd::data::fx::{
    convert_with_source, CsvRateSource, CurrencyNormalizer, FillPolicy, InMemoryRateSource,
    RateSource, DEFAULT_PAD_DAYS,
};
use liquidity_usd::series::TimeSeries;
use liquidity_usd::types::DEFAULT_VALUE_COLUMN;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};

/// liquidity-usd: convert central-bank balance-sheet series to USD
#[derive(Parser)]
#[command(name = "liquidity-usd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Convert time series to USD with historical FX rates", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a single series file
    Convert {
        /// Series file with `time` and value columns
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Source currency (ISO 4217 code)
        #[arg(short = 'C', long)]
        currency: String,

        /// Rate file ({CODE}USD rates in the same layout)
        #[arg(short = 'r', long)]
        rates: Option<PathBuf>,

        /// Output file (default: <stem>_USD.csv next to the input)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Fill policy for rate gaps (backward, forward)
        #[arg(short = 'f', long, default_value = "backward")]
        fill: String,

        /// Value column to convert
        #[arg(long, default_value = DEFAULT_VALUE_COLUMN)]
        column: String,

        /// Days of rate padding around the price span
        #[arg(long, default_value_t = DEFAULT_PAD_DAYS, value_parser = clap::value_parser!(i64).range(0..))]
        pad_days: i64,
    },

    /// Convert every job listed in the config file
    Batch {
        /// Download rates from Yahoo Finance instead of the rates directory
        #[arg(long)]
        fetch: bool,
    },

    /// Show supported currencies
    Info,
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".liquidity-usd").join("config.toml"))
}

fn load_config(path: Option<&Path>) -> Result<BatchConfig> {
    if let Some(config_path) = path {
        return BatchConfig::load(config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()));
    }

    if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            match BatchConfig::load(&default_path) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    eprintln!("{} Ignoring {}: {}", "Warning:".yellow(), default_path.display(), e);
                }
            }
        }
    }

    Ok(BatchConfig::default())
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.verbose {
        println!(
            "{} v{}",
            "liquidity-usd".cyan().bold(),
            env!("CARGO_PKG_VERSION")
        );
    }

    let result = match cli.command {
        Commands::Convert {
            input,
            currency,
            rates,
            output,
            fill,
            column,
            pad_days,
        } => convert(ConvertConfig {
            input,
            currency,
            rates,
            output,
            fill,
            column,
            pad_days,
            json: cli.json,
        }),

        Commands::Batch { fetch } => {
            load_config(cli.config.as_deref()).and_then(|config| batch(config, fetch, cli.json))
        }

        Commands::Info => show_info(),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

struct ConvertConfig {
    input: PathBuf,
    currency: String,
    rates: Option<PathBuf>,
    output: Option<PathBuf>,
    fill: String,
    column: String,
    pad_days: i64,
    json: bool,
}

fn convert(cfg: ConvertConfig) -> Result<()> {
    let currency: Currency = cfg.currency.parse()?;
    let fill: FillPolicy = cfg.fill.parse()?;
    let normalizer = CurrencyNormalizer::with_fill_policy(fill);

    let prices = csv_io::read_series(&cfg.input, &cfg.column)?;

    let mut source = InMemoryRateSource::new();
    if !currency.is_usd() {
        source.insert(currency, load_rates(&cfg, currency, &prices)?);
    }

    let conversion = convert_with_source(&normalizer, &prices, &source, currency, cfg.pad_days)?;

    let output = cfg
        .output
        .clone()
        .unwrap_or_else(|| csv_io::usd_output_path(&cfg.input));
    csv_io::write_series(&output, &conversion.series, &cfg.column)?;

    let report = JobReport {
        input: cfg.input.clone(),
        currency,
        output: Some(output),
        observations: conversion.series.len(),
        stats: conversion.stats,
        error: None,
    };

    if cfg.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn load_rates(cfg: &ConvertConfig, currency: Currency, prices: &TimeSeries) -> Result<TimeSeries> {
    if let Some(path) = &cfg.rates {
        return Ok(csv_io::read_series(path, DEFAULT_VALUE_COLUMN)?);
    }

    fetch_rates(currency, prices, cfg.pad_days)
}

#[cfg(feature = "async")]
fn fetch_rates(currency: Currency, prices: &TimeSeries, pad_days: i64) -> Result<TimeSeries> {
    use liquidity_usd::data::sources::YahooFxSource;

    let Some((start, end)) = prices.padded_span(pad_days) else {
        bail!("Price series is empty");
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let yahoo = YahooFxSource::new()?;
    Ok(runtime.block_on(yahoo.fetch_usd_rates(currency, start, end))?)
}

#[cfg(not(feature = "async"))]
fn fetch_rates(currency: Currency, _prices: &TimeSeries, _pad_days: i64) -> Result<TimeSeries> {
    bail!(
        "No rate file given for {}; pass --rates or build with the `async` feature to download rates",
        currency
    )
}

fn batch(config: BatchConfig, fetch: bool, json: bool) -> Result<()> {
    let started = Instant::now();

    let source: Box<dyn RateSource> = if fetch {
        Box::new(prefetch(&config)?)
    } else {
        Box::new(CsvRateSource::new(&config.rates_dir))
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Converting {} series...", config.jobs.len()));

    let reports = run_batch(&config, source.as_ref());
    pb.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
        println!();
        println!(
            "{} {}/{} series converted in {:.2?}",
            "Done:".green().bold(),
            reports.iter().filter(|r| r.is_success()).count(),
            reports.len(),
            started.elapsed()
        );
    }

    if reports.iter().any(|r| !r.is_success()) {
        bail!("Some series could not be converted");
    }

    Ok(())
}

#[cfg(feature = "async")]
fn prefetch(config: &BatchConfig) -> Result<InMemoryRateSource> {
    use liquidity_usd::batch::rate_window;
    use liquidity_usd::cache::SeriesCache;
    use liquidity_usd::data::sources::{prefetch_rates, YahooFxSource};

    let Some((start, end)) = rate_window(config) else {
        return Ok(InMemoryRateSource::new());
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let yahoo = YahooFxSource::new()?;
    let mut cache = SeriesCache::new();
    Ok(runtime.block_on(prefetch_rates(
        &yahoo,
        &config.currencies(),
        start,
        end,
        &mut cache,
    ))?)
}

#[cfg(not(feature = "async"))]
fn prefetch(_config: &BatchConfig) -> Result<InMemoryRateSource> {
    bail!("Downloading rates requires the `async` feature")
}

fn print_report(report: &JobReport) {
    match (&report.error, &report.output) {
        (None, Some(output)) => {
            println!(
                "{} {} ({}) -> {}",
                "✓".green().bold(),
                report.input.display(),
                report.currency,
                output.display().to_string().bright_green()
            );
            println!(
                "  {} {} ({} exact, {} backward-filled, {} forward-filled)",
                "Observations:".bold(),
                report.observations,
                report.stats.exact,
                report.stats.backward_filled,
                report.stats.forward_filled
            );
        }
        (error, _) => {
            println!(
                "{} {} ({}): {}",
                "✗".red().bold(),
                report.input.display(),
                report.currency,
                error.as_deref().unwrap_or("no output written").red()
            );
        }
    }
}

fn show_info() -> Result<()> {
    println!("{}", "Supported currencies".cyan().bold());
    println!("{}", "====================".cyan());
    for currency in Currency::all() {
        let ticker = if currency.is_usd() {
            "(identity)".dimmed().to_string()
        } else {
            currency.yahoo_fx_symbol()
        };
        println!("  {} {:<4} {}", currency.symbol(), currency.code(), ticker);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = vec!["liquidity-usd", "info"];
        let _cli = Cli::try_parse_from(args).unwrap();
    }

    #[test]
    fn test_convert_command() {
        let args = vec![
            "liquidity-usd",
            "convert",
            "JPCBBS.csv",
            "--currency",
            "JPY",
            "--rates",
            "rates/JPYUSD.csv",
            "--fill",
            "forward",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Convert { currency, pad_days, column, .. } => {
                assert_eq!(currency, "JPY");
                assert_eq!(pad_days, 1);
                assert_eq!(column, "close");
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_convert_requires_currency() {
        let args = vec!["liquidity-usd", "convert", "JPCBBS.csv"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_negative_pad_days_rejected() {
        let args = vec!["liquidity-usd", "convert", "JPCBBS.csv", "-C", "JPY", "--pad-days=-1"];
        assert!(Cli::try_parse_from(args).is_err());

        let args = vec!["liquidity-usd", "convert", "JPCBBS.csv", "-C", "JPY", "--pad-days", "3"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(cli.command, Commands::Convert { pad_days: 3, .. }));
    }

    #[test]
    fn test_batch_command() {
        let args = vec!["liquidity-usd", "--json", "batch", "--fetch"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Batch { fetch: true }));
    }

    #[test]
    fn test_explicit_missing_config_fails() {
        assert!(load_config(Some(Path::new("/definitely/not/here.toml"))).is_err());
    }
}
