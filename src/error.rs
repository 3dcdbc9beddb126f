//! Error types for the evidentia pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for evidentia operations
pub type Result<T> = std::result::Result<T, EvidentiaError>;

/// Main error type for the scoring and reporting pipeline.
///
/// Only the fatal conditions live here. Per-cell coercion failures and
/// unresolved optional roles are absorbed by the aggregator and surface as
/// [`Degradation`](crate::report::Degradation) notes instead.
#[derive(Error, Debug)]
pub enum EvidentiaError {
    #[error("Required input not found: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("No numeric features available after derivation and encoding")]
    EmptyFeatureSpace,

    #[error("Row count mismatch: {expected} source rows, {actual} labels")]
    RowCountMismatch { expected: usize, actual: usize },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },
}

impl From<polars::error::PolarsError> for EvidentiaError {
    fn from(err: polars::error::PolarsError) -> Self {
        EvidentiaError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for EvidentiaError {
    fn from(err: serde_json::Error) -> Self {
        EvidentiaError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for EvidentiaError {
    fn from(err: ndarray::ShapeError) -> Self {
        EvidentiaError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
