//! Standardization of the numeric feature space

use crate::error::{EvidentiaError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Parameters for one fitted column
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    center: f64, // mean
    scale: f64,  // population std, 1.0 when the column is constant
}

/// Dense matrix of scaled features, one row per record
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    /// Column names in matrix order
    pub feature_names: Vec<String>,
    /// Row-major values
    pub values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }
}

/// Z-score scaler over every numeric column of a frame.
///
/// Missing and non-finite cells are imputed with the column mean, so they
/// scale to zero. Constant columns scale to an all-zero column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Vec<(String, ScalerParams)>,
    is_fitted: bool,
}

impl StandardScaler {
    /// Create a new scaler
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the numeric columns seen during fit
    pub fn feature_names(&self) -> Vec<String> {
        self.params.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Fit on all numeric columns of `df`.
    ///
    /// Fails with [`EvidentiaError::EmptyFeatureSpace`] when there are none.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let numeric: Vec<&Column> = df
            .get_columns()
            .iter()
            .filter(|c| c.dtype().is_primitive_numeric())
            .collect();

        if numeric.is_empty() {
            return Err(EvidentiaError::EmptyFeatureSpace);
        }

        self.params = numeric
            .into_iter()
            .map(|column| {
                let values = finite_values(column.as_materialized_series())?;
                Ok((column.name().to_string(), compute_params(&values)))
            })
            .collect::<Result<Vec<_>>>()?;

        self.is_fitted = true;
        Ok(self)
    }

    /// Scale the fitted columns of `df` into a dense matrix
    pub fn transform(&self, df: &DataFrame) -> Result<FeatureMatrix> {
        if !self.is_fitted {
            return Err(EvidentiaError::ModelNotFitted);
        }

        let mut values = Array2::<f64>::zeros((df.height(), self.params.len()));
        for (j, (name, params)) in self.params.iter().enumerate() {
            let series = df
                .column(name)
                .map_err(|_| EvidentiaError::FeatureNotFound(name.clone()))?
                .as_materialized_series()
                .cast(&DataType::Float64)?;
            let ca = series.f64()?;

            for (i, cell) in ca.into_iter().enumerate() {
                let x = cell.filter(|v| v.is_finite()).unwrap_or(params.center);
                values[[i, j]] = (x - params.center) / params.scale;
            }
        }

        Ok(FeatureMatrix {
            feature_names: self.feature_names(),
            values,
        })
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<FeatureMatrix> {
        self.fit(df)?;
        self.transform(df)
    }
}

fn finite_values(series: &Series) -> Result<Vec<f64>> {
    let casted = series.cast(&DataType::Float64)?;
    let ca = casted.f64()?;
    Ok(ca.into_iter().flatten().filter(|v| v.is_finite()).collect())
}

fn compute_params(values: &[f64]) -> ScalerParams {
    if values.is_empty() {
        return ScalerParams { center: 0.0, scale: 1.0 };
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();
    ScalerParams {
        center: mean,
        scale: if std > 0.0 && std.is_finite() { std } else { 1.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_scaler() {
        let df = df!(
            "a" => &[1.0, 2.0, 3.0, 4.0, 5.0],
            "label" => &["x", "y", "z", "x", "y"]
        )
        .unwrap();

        let mut scaler = StandardScaler::new();
        let matrix = scaler.fit_transform(&df).unwrap();

        assert_eq!(matrix.feature_names, vec!["a".to_string()]);
        let col = matrix.values.column(0);
        assert!(col.sum().abs() < 1e-10);
        // population std: sqrt(2)
        assert!((matrix.values[[4, 0]] - 2.0 / 2f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_constant_column_is_zero() {
        let df = df!("c" => &[5i64, 5, 5, 5]).unwrap();
        let matrix = StandardScaler::new().fit_transform(&df).unwrap();
        assert!(matrix.values.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_missing_imputed_to_zero() {
        let df = df!("a" => &[Some(1.0), None, Some(3.0)]).unwrap();
        let matrix = StandardScaler::new().fit_transform(&df).unwrap();
        assert_eq!(matrix.values[[1, 0]], 0.0);
    }

    #[test]
    fn test_no_numeric_columns() {
        let df = df!("s" => &["a", "b"]).unwrap();
        let err = StandardScaler::new().fit(&df).unwrap_err();
        assert!(matches!(err, EvidentiaError::EmptyFeatureSpace));
    }
}
