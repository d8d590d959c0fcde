//! Table IO, organized by format.
//!
//! - `csv` - CSV tables (transactions, stops, income reference)
//! - `parquet` - Parquet output for enriched tables (requires `parquet` feature)

mod csv;

#[cfg(feature = "parquet")]
mod parquet;

pub use csv::*;

#[cfg(feature = "parquet")]
pub use parquet::*;
