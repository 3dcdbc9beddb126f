//! Indicator expansion of categorical columns

use crate::error::{EvidentiaError, Result};
use crate::utils::column_as_text;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Fitted categories of one source column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMapping {
    /// Source column
    pub column: String,
    /// Dropped reference value (smallest in natural order)
    pub reference: String,
    /// Values that receive an indicator column, in order
    pub categories: Vec<String>,
}

impl CategoryMapping {
    /// Names of the indicator columns this mapping produces
    pub fn indicator_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| format!("{}_{}", self.column, c))
            .collect()
    }
}

/// One-hot encoder that drops a reference value per column.
///
/// Candidate columns absent from the frame are skipped; the number of
/// indicator columns therefore depends on the data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    candidates: Vec<String>,
    mappings: Vec<CategoryMapping>,
    is_fitted: bool,
}

impl CategoricalEncoder {
    /// Create a new encoder over the given candidate columns
    pub fn new<S: AsRef<str>>(candidates: &[S]) -> Self {
        Self {
            candidates: candidates.iter().map(|s| s.as_ref().to_string()).collect(),
            mappings: Vec::new(),
            is_fitted: false,
        }
    }

    /// Fitted mappings, in candidate order
    pub fn mappings(&self) -> &[CategoryMapping] {
        &self.mappings
    }

    /// Learn the distinct values of every present candidate column
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.mappings.clear();
        let present: HashSet<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();

        for column in &self.candidates {
            if !present.contains(column) {
                continue;
            }
            let mut values = distinct_values(&column_as_text(df, column)?);
            if values.is_empty() {
                // nothing to expand, the column is still dropped on transform
                self.mappings.push(CategoryMapping {
                    column: column.clone(),
                    reference: String::new(),
                    categories: Vec::new(),
                });
                continue;
            }
            sort_natural(&mut values);
            let reference = values.remove(0);
            self.mappings.push(CategoryMapping {
                column: column.clone(),
                reference,
                categories: values,
            });
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace each fitted column with its indicator columns
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(EvidentiaError::ModelNotFitted);
        }

        let mut result = df.clone();
        for mapping in &self.mappings {
            let cells = column_as_text(df, &mapping.column)
                .map_err(|_| EvidentiaError::FeatureNotFound(mapping.column.clone()))?;

            for (category, name) in mapping.categories.iter().zip(mapping.indicator_names()) {
                let values: Vec<i32> = cells
                    .iter()
                    .map(|v| i32::from(v.as_deref() == Some(category.as_str())))
                    .collect();
                result.with_column(Series::new(name.into(), values))?;
            }

            result = result.drop(&mapping.column)?;
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }
}

/// Distinct non-missing values in first-seen order
fn distinct_values(cells: &[Option<String>]) -> Vec<String> {
    let mut seen = HashSet::new();
    cells
        .iter()
        .flatten()
        .filter(|v| seen.insert(v.as_str()))
        .cloned()
        .collect()
}

/// Numeric order when every value is a number, lexical otherwise
fn sort_natural(values: &mut [String]) {
    let numeric: Option<Vec<f64>> = values.iter().map(|v| v.trim().parse::<f64>().ok()).collect();
    match numeric {
        Some(_) => values.sort_by(|a, b| {
            let (x, y) = (a.trim().parse::<f64>(), b.trim().parse::<f64>());
            match (x, y) {
                (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                _ => a.cmp(b),
            }
        }),
        None => values.sort(),
    }
}
