//! Series data handling: file IO, exchange rates and remote sources

pub mod csv_io;
pub mod fx;
pub mod sources;

pub use csv_io::{read_series, usd_output_path, write_series};
