//! Unsupervised anomaly detection over the scaled feature matrix

mod isolation_forest;

pub use isolation_forest::{IsolationForest, IsolationTree};

use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Common interface of outlier detectors.
///
/// `predict` uses the sign convention: `-1` for outliers, `1` for inliers.
pub trait AnomalyDetector {
    /// Fit on the rows of `x`
    fn fit(&mut self, x: &Array2<f64>) -> Result<()>;

    /// Anomaly score per row, higher is more anomalous
    fn score_samples(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Sign label per row
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i32>>;

    /// Rows scoring strictly above this are outliers
    fn threshold(&self) -> f64;

    /// Fit on `x` and label the same rows
    fn fit_predict(&mut self, x: &Array2<f64>) -> Result<Array1<i32>> {
        self.fit(x)?;
        self.predict(x)
    }
}

/// Per-record verdict of the scorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyLabel {
    Anomaly,
    Normal,
}

impl AnomalyLabel {
    /// Map a detector sign (`-1` outlier) to a label
    pub fn from_sign(sign: i32) -> Self {
        if sign < 0 {
            AnomalyLabel::Anomaly
        } else {
            AnomalyLabel::Normal
        }
    }

    pub fn sign(self) -> i32 {
        match self {
            AnomalyLabel::Anomaly => -1,
            AnomalyLabel::Normal => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnomalyLabel::Anomaly => "anomaly",
            AnomalyLabel::Normal => "normal",
        }
    }

    /// Parse either encoding back into a label
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "anomaly" | "-1" => Some(AnomalyLabel::Anomaly),
            "normal" | "1" => Some(AnomalyLabel::Normal),
            _ => None,
        }
    }

    pub fn is_anomaly(self) -> bool {
        self == AnomalyLabel::Anomaly
    }
}

impl fmt::Display for AnomalyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
