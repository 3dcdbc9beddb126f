//! Stage orchestration
//!
//! Scoring: derive → encode → scale → isolation forest → merge onto the
//! untouched records. Reporting: resolve roles → aggregate → render charts →
//! assemble. Each stage takes an immutable table and returns a new one.

mod merge;

pub use merge::attach_labels;

use crate::anomaly::{AnomalyDetector, AnomalyLabel, IsolationForest};
use crate::config::{PipelineConfig, ReportConfig, ScoringConfig};
use crate::error::Result;
use crate::feature_engineering::FeatureDeriver;
use crate::preprocessing::{CategoricalEncoder, StandardScaler};
use crate::report::{
    Aggregator, ChartRenderer, ReportArtifacts, ReportAssembler, ReportDocument, SchemaPreview,
};
use crate::utils::{DataLoader, DataSaver};
use polars::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Result of one scoring run
#[derive(Debug, Clone)]
pub struct ScoringOutcome {
    /// Original records plus the label column
    pub scored: DataFrame,
    /// One label per input row, in row order
    pub labels: Vec<AnomalyLabel>,
    /// Anomaly score per row, higher is more anomalous
    pub scores: Vec<f64>,
    /// Columns of the scaled feature matrix
    pub feature_names: Vec<String>,
}

impl ScoringOutcome {
    pub fn anomaly_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_anomaly()).count()
    }
}

/// Feature engineering and anomaly scoring over an evidence table
#[derive(Debug, Clone)]
pub struct ScoringPipeline {
    config: ScoringConfig,
}

impl ScoringPipeline {
    /// Validates the configuration up front
    pub fn new(config: ScoringConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score every record of `records`
    pub fn score(&self, records: &DataFrame) -> Result<ScoringOutcome> {
        let start = Instant::now();

        let derived = FeatureDeriver::new(&self.config).derive(records)?;

        let mut encoder = CategoricalEncoder::new(&self.config.categorical_columns);
        let mut encoded = encoder.fit_transform(&derived)?;
        // a label column from an earlier run must not feed the detector
        if encoded.column(&self.config.label_column).is_ok() {
            encoded = encoded.drop(&self.config.label_column)?;
        }
        debug!(
            encoded_columns = encoder.mappings().len(),
            width = encoded.width(),
            "Encoded categorical columns"
        );

        let matrix = StandardScaler::new().fit_transform(&encoded)?;

        let mut forest = IsolationForest::new()
            .with_n_estimators(self.config.n_estimators)
            .with_max_samples(self.config.max_samples)
            .with_contamination(self.config.contamination)
            .with_seed(self.config.seed);
        let signs = forest.fit_predict(&matrix.values)?;
        let scores = forest.score_samples(&matrix.values)?.to_vec();

        let labels: Vec<AnomalyLabel> = signs.iter().map(|&s| AnomalyLabel::from_sign(s)).collect();
        let scored = attach_labels(
            records,
            &labels,
            &self.config.label_column,
            self.config.label_encoding,
        )?;

        let outcome = ScoringOutcome {
            scored,
            labels,
            scores,
            feature_names: matrix.feature_names,
        };
        info!(
            rows = records.height(),
            features = outcome.feature_names.len(),
            anomalies = outcome.anomaly_count(),
            contamination = self.config.contamination,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Scored evidence records"
        );
        Ok(outcome)
    }
}

/// Aggregate the scored dataset and entity table into a report document.
///
/// `sources` names the two tables in the schema preview.
pub fn build_report(
    config: &ReportConfig,
    scored: &DataFrame,
    entities: &DataFrame,
    sources: (&str, &str),
    renderer: &dyn ChartRenderer,
) -> Result<ReportDocument> {
    let summary = Aggregator::new(config).aggregate(scored, entities)?;
    info!(
        event = ?summary.roles.event,
        severity = ?summary.roles.severity,
        timestamp = ?summary.roles.timestamp,
        entity = ?summary.roles.entity,
        "Resolved report roles"
    );

    let top_events: Vec<_> = summary
        .event_distribution
        .iter()
        .take(config.event_top_n)
        .cloned()
        .collect();
    let event_col = summary.roles.event.as_deref().unwrap_or("event");

    let artifacts = ReportArtifacts {
        event_chart: Some(renderer.render_event_distribution(event_col, &top_events)?),
        timeline_chart: match &summary.timeline {
            Some(buckets) => Some(renderer.render_timeline(buckets)?),
            None => None,
        },
    };

    let previews = [
        SchemaPreview::from_frame(sources.0, scored),
        SchemaPreview::from_frame(sources.1, entities),
    ];

    Ok(ReportAssembler::new(config.clone()).assemble(&summary, &previews, &artifacts))
}

/// Load evidence, score it and persist the scored dataset
pub fn run_scoring(config: &PipelineConfig) -> Result<ScoringOutcome> {
    config.validate()?;
    let records = DataLoader::new().load_csv(&config.evidence_path)?;
    info!(path = %config.evidence_path.display(), rows = records.height(), "Loaded evidence");

    let outcome = ScoringPipeline::new(config.scoring.clone())?.score(&records)?;
    DataSaver::save_csv(&outcome.scored, &config.scored_path)?;
    info!(path = %config.scored_path.display(), "Saved scored dataset");
    Ok(outcome)
}

/// Load the scored dataset and entity table, build the report and write it
pub fn run_report(config: &PipelineConfig, renderer: &dyn ChartRenderer) -> Result<ReportDocument> {
    config.validate()?;
    let loader = DataLoader::new();
    let scored = loader.load_csv(&config.scored_path)?;
    let entities = loader.load_csv(&config.entities_path)?;

    let report = build_report(
        &config.report,
        &scored,
        &entities,
        (&display_name(&config.scored_path), &display_name(&config.entities_path)),
        renderer,
    )?;

    report.write_to(&config.report_path)?;
    info!(
        path = %config.report_path.display(),
        sections = report.sections().len(),
        artifacts = report.artifacts().len(),
        "Wrote report"
    );
    Ok(report)
}

/// Scoring followed by reporting.
///
/// Both inputs are checked before anything is written, so a missing entity
/// table leaves no partial output behind.
pub fn run(config: &PipelineConfig, renderer: &dyn ChartRenderer) -> Result<(ScoringOutcome, ReportDocument)> {
    config.validate()?;
    for path in [&config.evidence_path, &config.entities_path] {
        if !path.is_file() {
            return Err(crate::error::EvidentiaError::MissingInput { path: path.clone() });
        }
    }
    let outcome = run_scoring(config)?;
    let report = run_report(config, renderer)?;
    Ok((outcome, report))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvidentiaError;

    #[test]
    fn test_invalid_config_rejected() {
        let config = ScoringConfig::default().with_contamination(0.9);
        assert!(matches!(
            ScoringPipeline::new(config),
            Err(EvidentiaError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_previous_label_column_ignored() {
        let records = df!(
            "bytes" => &[1.0, 2.0, 3.0, 4.0],
            "is_anomaly" => &[-1i32, 1, 1, 1]
        )
        .unwrap();
        let outcome = ScoringPipeline::new(ScoringConfig::default().with_n_estimators(10))
            .unwrap()
            .score(&records)
            .unwrap();
        assert_eq!(outcome.feature_names, vec!["bytes".to_string()]);
        assert_eq!(outcome.scored.width(), 2);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("/tmp/x/evidence.csv")), "evidence.csv");
    }
}
