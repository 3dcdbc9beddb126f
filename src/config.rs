//! Pipeline configuration
//!
//! Everything a run depends on besides its input files lives in
//! [`PipelineConfig`]: file locations, the detector knobs, the keyword flag
//! set and the report layout. Defaults reproduce the behaviour of the
//! original investigation scripts.

use crate::error::{EvidentiaError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A keyword-presence flag derived from the free-text column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordFlag {
    /// Suffix of the derived column (`flag_<name>`)
    pub name: String,
    /// Substring searched for in the text
    pub pattern: String,
    /// Whether the match respects case
    #[serde(default)]
    pub case_sensitive: bool,
}

impl KeywordFlag {
    /// Case-insensitive flag
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            case_sensitive: false,
        }
    }

    /// Case-sensitive flag
    pub fn exact(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            case_sensitive: true,
            ..Self::new(name, pattern)
        }
    }

    /// Name of the derived 0/1 column
    pub fn column_name(&self) -> String {
        format!("flag_{}", self.name)
    }

    /// Substring test against one cell
    pub fn matches(&self, text: &str) -> bool {
        if self.case_sensitive {
            text.contains(&self.pattern)
        } else {
            text.to_lowercase().contains(&self.pattern.to_lowercase())
        }
    }
}

/// How anomaly labels are written into the scored dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelEncoding {
    /// `anomaly` / `normal`
    Text,
    /// `-1` / `1`
    Sign,
}

/// Configuration of the feature engineering and scoring stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Number of isolation trees in the ensemble
    pub n_estimators: usize,

    /// Rows drawn per tree (capped by the row count)
    pub max_samples: usize,

    /// Expected proportion of anomalous rows, in (0, 0.5]
    pub contamination: f64,

    /// Seed for the tree-building RNG
    pub seed: u64,

    /// Free-text column scanned for keyword flags (matched case-insensitively)
    pub text_column: String,

    /// Keyword flags derived from the text column
    pub keywords: Vec<KeywordFlag>,

    /// Candidate categorical columns for indicator expansion
    pub categorical_columns: Vec<String>,

    /// Derive hour/day-of-week/weekend columns from a `timestamp` column
    pub temporal_features: bool,

    /// Name of the label column attached to the scored dataset
    pub label_column: String,

    /// Encoding of the label column
    pub label_encoding: LabelEncoding,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_samples: 256,
            contamination: 0.45,
            seed: 42,
            text_column: "description".to_string(),
            keywords: vec![
                KeywordFlag::new("suspicious", "suspicious"),
                KeywordFlag::new("unknown", "UNKNOWN"),
                KeywordFlag::exact("port_8080", "8080"),
                KeywordFlag::new("private_file", "private_file"),
            ],
            categorical_columns: vec!["event_type".to_string(), "user_id".to_string()],
            temporal_features: false,
            label_column: "is_anomaly".to_string(),
            label_encoding: LabelEncoding::Text,
        }
    }
}

impl ScoringConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the contamination
    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.contamination = contamination;
        self
    }

    /// Builder method to set the ensemble size
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    /// Builder method to set the RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method to replace the keyword set
    pub fn with_keywords(mut self, keywords: Vec<KeywordFlag>) -> Self {
        self.keywords = keywords;
        self
    }

    /// Builder method to replace the categorical candidates
    pub fn with_categorical_columns<S: Into<String>>(mut self, columns: Vec<S>) -> Self {
        self.categorical_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to toggle temporal features
    pub fn with_temporal_features(mut self, enabled: bool) -> Self {
        self.temporal_features = enabled;
        self
    }

    /// Builder method to set the label encoding
    pub fn with_label_encoding(mut self, encoding: LabelEncoding) -> Self {
        self.label_encoding = encoding;
        self
    }

    /// Check the detector parameters
    pub fn validate(&self) -> Result<()> {
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(EvidentiaError::InvalidParameter {
                name: "contamination".to_string(),
                value: self.contamination.to_string(),
                reason: "must be in (0, 0.5]".to_string(),
            });
        }
        if self.n_estimators == 0 {
            return Err(EvidentiaError::InvalidParameter {
                name: "n_estimators".to_string(),
                value: "0".to_string(),
                reason: "ensemble needs at least one tree".to_string(),
            });
        }
        if self.max_samples == 0 {
            return Err(EvidentiaError::InvalidParameter {
                name: "max_samples".to_string(),
                value: "0".to_string(),
                reason: "each tree needs at least one sample".to_string(),
            });
        }
        if self.label_column.is_empty() {
            return Err(EvidentiaError::ConfigError("label column name is empty".to_string()));
        }
        Ok(())
    }
}

/// Configuration of the report synthesis stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Document title
    pub title: String,

    /// Events listed (and charted) under Key Findings
    pub event_top_n: usize,

    /// Entities kept in the entity ranking
    pub entity_top_n: usize,

    /// Label column to look for in the scored dataset
    pub label_column: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "Forensic Investigation Report".to_string(),
            event_top_n: 12,
            entity_top_n: 20,
            label_column: "is_anomaly".to_string(),
        }
    }
}

/// Top-level configuration passed into the pipeline entry points
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Evidence records to score
    pub evidence_path: PathBuf,

    /// Extracted entity table
    pub entities_path: PathBuf,

    /// Scored dataset output
    pub scored_path: PathBuf,

    /// Markdown report output
    pub report_path: PathBuf,

    /// Directory receiving chart artifacts
    pub artifact_dir: PathBuf,

    pub scoring: ScoringConfig,

    pub report: ReportConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            evidence_path: PathBuf::from("feature_engineered_evidence.csv"),
            entities_path: PathBuf::from("extracted_entities.csv"),
            scored_path: PathBuf::from("anomalies_detected_evidence.csv"),
            report_path: PathBuf::from("forensic_report.md"),
            artifact_dir: PathBuf::from("."),
            scoring: ScoringConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file; absent fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(EvidentiaError::MissingInput { path: path.to_path_buf() });
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Builder method to replace the scoring section
    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    /// Builder method to set the output directory for every artifact
    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.scored_path = dir.join("anomalies_detected_evidence.csv");
        self.report_path = dir.join("forensic_report.md");
        self.artifact_dir = dir.to_path_buf();
        self
    }

    /// Validate both stages; the report reads the label column scoring writes
    pub fn validate(&self) -> Result<()> {
        self.scoring.validate()?;
        if self.report.label_column != self.scoring.label_column {
            return Err(EvidentiaError::ConfigError(format!(
                "report label column '{}' differs from scoring label column '{}'",
                self.report.label_column, self.scoring.label_column
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.scoring.n_estimators, 200);
        assert_eq!(config.scoring.contamination, 0.45);
        assert_eq!(config.scoring.seed, 42);
        assert_eq!(config.report.entity_top_n, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_contamination_out_of_range() {
        for c in [0.0, -0.1, 0.6, f64::NAN] {
            let config = ScoringConfig::new().with_contamination(c);
            assert!(matches!(
                config.validate(),
                Err(EvidentiaError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn test_keyword_matching() {
        let flag = KeywordFlag::new("unknown", "UNKNOWN");
        assert!(flag.matches("user unknown logged in"));
        let port = KeywordFlag::exact("port_8080", "8080");
        assert!(port.matches("conn to 10.0.0.1:8080"));
        assert!(!port.matches("conn to 10.0.0.1:80"));
        assert_eq!(port.column_name(), "flag_port_8080");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"scoring": {"contamination": 0.2}}"#).unwrap();
        assert_eq!(config.scoring.contamination, 0.2);
        assert_eq!(config.scoring.n_estimators, 200);
        assert_eq!(config.report.event_top_n, 12);
    }

    #[test]
    fn test_label_encoding_serialize() {
        let json = serde_json::to_string(&LabelEncoding::Sign).unwrap();
        assert_eq!(json, "\"sign\"");
    }
}
