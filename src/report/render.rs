//! Boundary to the external chart renderer
//!
//! The report only embeds references. Whatever draws the pixels lives behind
//! [`ChartRenderer`]; the bundled [`ChartSpecRenderer`] writes the chart data
//! as JSON for such a collaborator to pick up.

use crate::error::Result;
use crate::report::aggregate::{TimelineBucket, ValueCount};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reference to a produced visualization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Link text
    pub name: String,
    /// Link target as written into the report
    pub link: String,
    /// Location on disk, if the renderer wrote one
    pub path: Option<PathBuf>,
}

/// Produces visualization artifacts from aggregate data
pub trait ChartRenderer {
    /// Bar chart of the most frequent events
    fn render_event_distribution(&self, column: &str, counts: &[ValueCount]) -> Result<ArtifactRef>;

    /// Line chart of daily counts
    fn render_timeline(&self, buckets: &[TimelineBucket]) -> Result<ArtifactRef>;
}

/// One plotted point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// Serialized chart description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    /// `bar` or `line`
    pub kind: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<ChartPoint>,
}

/// Writes [`ChartSpec`] JSON files into an artifact directory
#[derive(Debug, Clone)]
pub struct ChartSpecRenderer {
    out_dir: PathBuf,
}

impl ChartSpecRenderer {
    pub const EVENT_CHART: &'static str = "event_distribution.json";
    pub const TIMELINE_CHART: &'static str = "anomaly_timeline.json";

    pub fn new(out_dir: impl AsRef<Path>) -> Self {
        Self {
            out_dir: out_dir.as_ref().to_path_buf(),
        }
    }

    fn write(&self, file_name: &str, name: &str, spec: &ChartSpec) -> Result<ArtifactRef> {
        std::fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(file_name);
        std::fs::write(&path, serde_json::to_string_pretty(spec)?)?;
        debug!(path = %path.display(), points = spec.points.len(), "Wrote chart spec");

        Ok(ArtifactRef {
            name: name.to_string(),
            link: file_name.to_string(),
            path: Some(path),
        })
    }
}

impl ChartRenderer for ChartSpecRenderer {
    fn render_event_distribution(&self, column: &str, counts: &[ValueCount]) -> Result<ArtifactRef> {
        let spec = ChartSpec {
            title: "Top Event Types (by Count)".to_string(),
            kind: "bar".to_string(),
            x_label: column.to_string(),
            y_label: "Count".to_string(),
            points: counts
                .iter()
                .map(|c| ChartPoint {
                    label: c.value.clone(),
                    value: c.count as f64,
                })
                .collect(),
        };
        self.write(Self::EVENT_CHART, "Event distribution", &spec)
    }

    fn render_timeline(&self, buckets: &[TimelineBucket]) -> Result<ArtifactRef> {
        let spec = ChartSpec {
            title: "Anomalous Events Over Time (Daily)".to_string(),
            kind: "line".to_string(),
            x_label: "Date".to_string(),
            y_label: "Count".to_string(),
            points: buckets
                .iter()
                .map(|b| ChartPoint {
                    label: b.date.format("%Y-%m-%d").to_string(),
                    value: b.count as f64,
                })
                .collect(),
        };
        self.write(Self::TIMELINE_CHART, "Anomaly timeline", &spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_chart_written() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ChartSpecRenderer::new(dir.path());
        let counts = vec![ValueCount { value: "login".to_string(), count: 3 }];

        let artifact = renderer.render_event_distribution("event_type", &counts).unwrap();
        assert_eq!(artifact.link, ChartSpecRenderer::EVENT_CHART);

        let raw = std::fs::read_to_string(artifact.path.unwrap()).unwrap();
        let spec: ChartSpec = serde_json::from_str(&raw).unwrap();
        assert_eq!(spec.kind, "bar");
        assert_eq!(spec.points[0].value, 3.0);
    }
}
