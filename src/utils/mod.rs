//! Utility functions and types

pub mod data_loader;
pub mod time;

pub use data_loader::{DataLoader, DataSaver};
pub use time::parse_timestamp;

use crate::error::Result;
use polars::prelude::*;

/// Cells of a column rendered as text, `None` where missing.
///
/// Non-string columns are cast first so callers can treat any schema alike.
pub fn column_as_text(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df.column(name)?.as_materialized_series().cast(&DataType::String)?;
    let ca = series.str()?;
    Ok(ca.into_iter().map(|v| v.map(|s| s.to_string())).collect())
}

/// Column names in dataset order
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}
