//! Auxiliary signals derived from raw evidence fields

use crate::config::{KeywordFlag, ScoringConfig};
use crate::error::Result;
use crate::utils::{column_as_text, parse_timestamp};
use chrono::{Datelike, Timelike};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Column scanned for temporal features
const TIMESTAMP_COLUMN: &str = "timestamp";

/// Builds boolean indicators, keyword flags and optional temporal columns.
///
/// The input frame is never touched; every derived value lands on a copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureDeriver {
    text_column: String,
    keywords: Vec<KeywordFlag>,
    temporal_features: bool,
}

impl FeatureDeriver {
    /// Create a deriver from the scoring configuration
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            text_column: config.text_column.clone(),
            keywords: config.keywords.clone(),
            temporal_features: config.temporal_features,
        }
    }

    /// Return an augmented copy of `df`
    pub fn derive(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();

        let mut n_bool = 0usize;
        for column in df.get_columns() {
            let series = column.as_materialized_series();
            if let Some(values) = boolean_indicator(series)? {
                result.with_column(Series::new(series.name().clone(), values))?;
                n_bool += 1;
            }
        }

        let mut n_flags = 0usize;
        if let Some(text_col) = find_column(df, &self.text_column) {
            let texts = column_as_text(df, &text_col)?;
            for flag in &self.keywords {
                let values: Vec<i32> = texts
                    .iter()
                    .map(|cell| i32::from(cell.as_deref().is_some_and(|s| flag.matches(s))))
                    .collect();
                result.with_column(Series::new(flag.column_name().into(), values))?;
                n_flags += 1;
            }
        }

        let n_temporal = if self.temporal_features {
            add_temporal_features(df, &mut result)?
        } else {
            0
        };

        debug!(
            booleans = n_bool,
            keyword_flags = n_flags,
            temporal = n_temporal,
            width = result.width(),
            "Derived features"
        );
        Ok(result)
    }
}

/// First column whose name equals `target` ignoring ASCII case
pub(crate) fn find_column(df: &DataFrame, target: &str) -> Option<String> {
    df.get_column_names()
        .iter()
        .find(|name| name.eq_ignore_ascii_case(target))
        .map(|name| name.to_string())
}

/// 0/1 values for boolean columns and for text columns that only hold
/// `true`/`false` spellings. `None` when the column is neither.
fn boolean_indicator(series: &Series) -> Result<Option<Vec<Option<i32>>>> {
    match series.dtype() {
        DataType::Boolean => {
            let ca = series.bool()?;
            Ok(Some(ca.into_iter().map(|v| v.map(i32::from)).collect()))
        }
        DataType::String => {
            let ca = series.str()?;
            let mut seen_any = false;
            for value in ca.into_iter().flatten() {
                if parse_bool(value).is_none() {
                    return Ok(None);
                }
                seen_any = true;
            }
            if !seen_any {
                return Ok(None);
            }
            Ok(Some(
                ca.into_iter()
                    .map(|v| v.and_then(parse_bool).map(i32::from))
                    .collect(),
            ))
        }
        _ => Ok(None),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    let v = value.trim();
    if v.eq_ignore_ascii_case("true") {
        Some(true)
    } else if v.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Adds `hour_of_day`, `day_of_week` (Monday = 0) and `is_weekend`.
/// Existing columns with those names win.
fn add_temporal_features(df: &DataFrame, result: &mut DataFrame) -> Result<usize> {
    let Some(ts_col) = find_column(df, TIMESTAMP_COLUMN) else {
        return Ok(0);
    };

    let parsed: Vec<_> = column_as_text(df, &ts_col)?
        .into_iter()
        .map(|cell| cell.as_deref().and_then(parse_timestamp))
        .collect();

    let hour: Vec<Option<i32>> = parsed.iter().map(|t| t.map(|t| t.hour() as i32)).collect();
    let weekday: Vec<Option<i32>> = parsed
        .iter()
        .map(|t| t.map(|t| t.weekday().num_days_from_monday() as i32))
        .collect();
    let weekend: Vec<Option<i32>> = weekday.iter().map(|d| d.map(|d| i32::from(d >= 5))).collect();

    let mut added = 0;
    for (name, values) in [("hour_of_day", hour), ("day_of_week", weekday), ("is_weekend", weekend)] {
        if find_column(df, name).is_some() {
            continue;
        }
        result.with_column(Series::new(name.into(), values))?;
        added += 1;
    }
    Ok(added)
}
