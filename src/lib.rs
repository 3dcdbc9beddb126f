//! Evidentia - anomaly scoring and report synthesis for forensic evidence
//!
//! The crate takes a table of evidence records, derives numeric features,
//! scores every record with an isolation forest and writes the records back
//! with an anomaly label. A second stage aggregates the scored records and an
//! extracted-entity table into a structured Markdown investigation report.
//!
//! # Modules
//!
//! ## Scoring
//! - [`feature_engineering`] - Keyword flags, boolean coercion, temporal features
//! - [`preprocessing`] - Categorical indicator expansion and standard scaling
//! - [`anomaly`] - Isolation forest detector
//!
//! ## Reporting
//! - [`report`] - Role resolution, aggregation, chart artifacts, document assembly
//!
//! ## Orchestration
//! - [`pipeline`] - Stage wiring and file-level entry points
//! - [`config`] - Pipeline configuration
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use evidentia::prelude::*;
//!
//! let config = PipelineConfig::default().with_output_dir("case_42");
//! let renderer = ChartSpecRenderer::new(&config.artifact_dir);
//! let (outcome, report) = evidentia::pipeline::run(&config, &renderer)?;
//! println!("{} anomalies, {} sections", outcome.anomaly_count(), report.sections().len());
//! # Ok::<(), evidentia::EvidentiaError>(())
//! ```

pub mod error;
pub mod config;
pub mod utils;

pub mod feature_engineering;
pub mod preprocessing;
pub mod anomaly;

pub mod report;
pub mod pipeline;

pub mod cli;

pub use error::{EvidentiaError, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::anomaly::{AnomalyDetector, AnomalyLabel, IsolationForest};
    pub use crate::config::{KeywordFlag, LabelEncoding, PipelineConfig, ReportConfig, ScoringConfig};
    pub use crate::error::{EvidentiaError, Result};
    pub use crate::feature_engineering::FeatureDeriver;
    pub use crate::pipeline::{build_report, ScoringOutcome, ScoringPipeline};
    pub use crate::preprocessing::{CategoricalEncoder, FeatureMatrix, StandardScaler};
    pub use crate::report::{
        AggregateSummary, Aggregator, ChartRenderer, ChartSpecRenderer, ReportAssembler,
        ReportDocument, SchemaRole,
    };
    pub use crate::utils::{DataLoader, DataSaver};
}
