//! Sectioned investigative report

use crate::config::ReportConfig;
use crate::error::Result;
use crate::report::aggregate::{AggregateSummary, DescriptiveStats};
use crate::report::render::ArtifactRef;
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

/// Column entry of a schema preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnPreview {
    pub name: String,
    /// Inferred type label
    pub dtype: String,
    pub non_missing: usize,
}

/// Per-table column listing for the Data Sources section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaPreview {
    /// Display name of the table, usually its file name
    pub source: String,
    pub rows: usize,
    pub columns: Vec<ColumnPreview>,
}

impl SchemaPreview {
    pub fn from_frame(source: impl Into<String>, df: &DataFrame) -> Self {
        let columns = df
            .get_columns()
            .iter()
            .map(|c| ColumnPreview {
                name: c.name().to_string(),
                dtype: c.dtype().to_string(),
                non_missing: c.len() - c.null_count(),
            })
            .collect();
        Self {
            source: source.into(),
            rows: df.height(),
            columns,
        }
    }
}

/// One titled block of the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    /// Markdown heading level (2 for top-level sections)
    pub level: u8,
    pub body: String,
    pub artifact: Option<ArtifactRef>,
}

impl Section {
    fn new(title: impl Into<String>, level: u8, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            level,
            body: body.into(),
            artifact: None,
        }
    }

    fn with_artifact(mut self, artifact: Option<ArtifactRef>) -> Self {
        self.artifact = artifact;
        self
    }
}

/// Chart references handed to the assembler
#[derive(Debug, Clone, Default)]
pub struct ReportArtifacts {
    pub event_chart: Option<ArtifactRef>,
    pub timeline_chart: Option<ArtifactRef>,
}

/// Assembled report. Immutable; render with [`ReportDocument::to_markdown`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDocument {
    title: String,
    generated_at: DateTime<Utc>,
    sections: Vec<Section>,
}

impl ReportDocument {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// First section whose title starts with `prefix`
    pub fn section(&self, prefix: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title.starts_with(prefix))
    }

    /// Every artifact referenced by the document, in section order
    pub fn artifacts(&self) -> Vec<&ArtifactRef> {
        self.sections.iter().filter_map(|s| s.artifact.as_ref()).collect()
    }

    /// Render as Markdown
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("# {}\n\n", self.title));
        md.push_str(&format!(
            "**Generated:** {}\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        md.push_str("---\n\n");

        for section in &self.sections {
            let hashes = "#".repeat(section.level as usize);
            md.push_str(&format!("{} {}\n\n", hashes, section.title));
            if !section.body.is_empty() {
                md.push_str(section.body.trim_end());
                md.push_str("\n\n");
            }
            if let Some(artifact) = &section.artifact {
                md.push_str(&format!("[{}]({})\n\n", artifact.name, artifact.link));
            }
        }

        md
    }

    /// Write the whole document in one go
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_markdown())?;
        Ok(())
    }
}

/// Orders aggregate output into the fixed section sequence
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    config: ReportConfig,
}

impl ReportAssembler {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    /// Executive Summary, Data Sources, Methodology, Key Findings,
    /// Recommendations, Appendix. Optional findings are left out when
    /// their aggregate is unavailable.
    pub fn assemble(
        &self,
        summary: &AggregateSummary,
        previews: &[SchemaPreview],
        artifacts: &ReportArtifacts,
    ) -> ReportDocument {
        let mut sections = vec![
            Section::new("Executive Summary", 2, executive_summary(summary)),
            Section::new("Data Sources and Schema", 2, data_sources(previews)),
        ];
        for preview in previews {
            sections.push(Section::new(
                format!("{} (Schema Preview)", preview.source),
                3,
                schema_listing(preview),
            ));
        }

        sections.push(Section::new("Methodology", 2, methodology(summary)));
        sections.push(Section::new("Key Findings", 2, ""));

        let mut n = 0;
        let mut next = || {
            n += 1;
            n
        };

        let event_col = summary.roles.event.as_deref().unwrap_or("n/a");
        sections.push(
            Section::new(
                format!("{}) Event Distribution (by `{}`)", next(), event_col),
                3,
                self.event_listing(summary),
            )
            .with_artifact(artifacts.event_chart.clone()),
        );

        if let (Some(stats), Some(col)) = (&summary.severity, summary.roles.severity.as_deref()) {
            sections.push(Section::new(
                format!("{}) Anomaly Severity Summary (`{}`)", next(), col),
                3,
                severity_block(stats),
            ));
        }

        if let Some(timeline) = &summary.timeline {
            let mut body = String::from(
                "Daily aggregation highlights spikes that may indicate concentrated attack windows.\n\n",
            );
            let mut peaks: Vec<_> = timeline.iter().filter(|b| b.count > 0).collect();
            peaks.sort_by(|a, b| b.count.cmp(&a.count).then(a.date.cmp(&b.date)));
            for bucket in peaks.into_iter().take(5) {
                let _ = writeln!(
                    body,
                    "- **{}**: {} events ({} flagged anomalous)",
                    bucket.date.format("%Y-%m-%d"),
                    bucket.count,
                    bucket.anomalies
                );
            }
            sections.push(
                Section::new(format!("{}) Timeline of Anomalous Events", next()), 3, body)
                    .with_artifact(artifacts.timeline_chart.clone()),
            );
        }

        let mut entities = String::new();
        for vc in &summary.entity_ranking {
            let _ = writeln!(entities, "- **{}**: {} mentions", vc.value, vc.count);
        }
        if entities.is_empty() {
            entities.push_str("No entities were extracted.\n");
        }
        sections.push(Section::new(
            format!("{}) Extracted Entities of Interest", next()),
            3,
            entities,
        ));

        sections.push(Section::new("Recommendations", 2, RECOMMENDATIONS));
        sections.push(Section::new("Appendix", 2, APPENDIX));

        ReportDocument {
            title: self.config.title.clone(),
            generated_at: Utc::now(),
            sections,
        }
    }

    fn event_listing(&self, summary: &AggregateSummary) -> String {
        let mut body = String::new();
        for vc in summary.event_distribution.iter().take(self.config.event_top_n) {
            let _ = writeln!(body, "- **{}**: {} occurrences", vc.value, vc.count);
        }
        let shown = summary.event_distribution.len().min(self.config.event_top_n);
        if summary.event_distribution.len() > shown {
            let _ = writeln!(
                body,
                "\n{} further distinct values not listed.",
                summary.event_distribution.len() - shown
            );
        }
        if body.is_empty() {
            body.push_str("No events recorded.\n");
        }
        body
    }
}

const RECOMMENDATIONS: &str = "\
1. Investigate top event types and related entities.
2. Correlate anomalies with external logs and asset owners.
3. If severity is high, consider immediate containment (credential reset, isolation).
4. Preserve evidence and document chain-of-custody.";

const APPENDIX: &str = "\
This report was generated automatically; the tables and chart data are reproducible from the \
same inputs, seed and contamination. Column roles were matched by name on a best-effort basis. \
For formal use, confirm that each finding above was computed from the intended column.";

fn executive_summary(summary: &AggregateSummary) -> String {
    let mut body = String::from(
        "This report summarizes findings from the forensic investigation. The analyses combined \
         anomaly detection outputs and entity extraction results to identify suspicious activity. \
         Visualizations support the findings and make evidence easy to interpret.",
    );
    if let Some(overview) = &summary.overview {
        let _ = write!(
            body,
            "\n\nOf {} evidence records, {} were flagged as anomalous ({:.1}%).",
            overview.total,
            overview.anomalies,
            overview.rate() * 100.0
        );
    }
    body
}

fn data_sources(previews: &[SchemaPreview]) -> String {
    previews
        .iter()
        .map(|p| format!("- {} ({} rows)", p.source, p.rows))
        .collect::<Vec<_>>()
        .join("\n")
}

fn schema_listing(preview: &SchemaPreview) -> String {
    preview
        .columns
        .iter()
        .map(|c| format!("- **{}**: {}, non-null: {}", c.name, c.dtype, c.non_missing))
        .collect::<Vec<_>>()
        .join("\n")
}

fn methodology(summary: &AggregateSummary) -> String {
    let mut body = String::from(
        "The investigation followed a workflow: acquisition, preprocessing, feature engineering, \
         anomaly detection, and entity extraction. Final synthesis aggregated anomaly outputs and \
         entities, computed event distributions, and visualized trends.",
    );
    if !summary.degradations.is_empty() {
        body.push_str("\n\nCoverage notes:\n\n");
        for d in &summary.degradations {
            let _ = writeln!(body, "- {}", d);
        }
    }
    body
}

fn severity_block(stats: &DescriptiveStats) -> String {
    let std = stats
        .std
        .map(|s| format!("{:.6}", s))
        .unwrap_or_else(|| "n/a".to_string());
    format!(
        "```\ncount  {:>12}\nmean   {:>12.6}\nstd    {:>12}\nmin    {:>12.6}\n25%    {:>12.6}\n50%    {:>12.6}\n75%    {:>12.6}\nmax    {:>12.6}\n```",
        stats.count, stats.mean, std, stats.min, stats.q1, stats.median, stats.q3, stats.max
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::aggregate::{TimelineBucket, ValueCount};
    use crate::report::schema::ResolvedRoles;
    use chrono::NaiveDate;

    fn summary() -> AggregateSummary {
        AggregateSummary {
            roles: ResolvedRoles {
                event: Some("event_type".to_string()),
                severity: None,
                timestamp: None,
                entity: Some("entity".to_string()),
            },
            total_rows: 3,
            event_distribution: vec![
                ValueCount { value: "login".to_string(), count: 2 },
                ValueCount { value: "upload".to_string(), count: 1 },
            ],
            severity: None,
            timeline: None,
            entity_ranking: vec![ValueCount { value: "USER:bob".to_string(), count: 1 }],
            overview: None,
            degradations: Vec::new(),
        }
    }

    #[test]
    fn test_section_order() {
        let doc = ReportAssembler::new(ReportConfig::default()).assemble(
            &summary(),
            &[],
            &ReportArtifacts::default(),
        );
        let titles: Vec<&str> = doc.sections().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles[0], "Executive Summary");
        assert_eq!(titles[1], "Data Sources and Schema");
        assert_eq!(titles[2], "Methodology");
        assert_eq!(titles[3], "Key Findings");
        assert!(titles[4].starts_with("1) Event Distribution"));
        assert!(titles[5].starts_with("2) Extracted Entities"));
        assert_eq!(&titles[6..], &["Recommendations", "Appendix"]);
    }

    #[test]
    fn test_optional_findings_present() {
        let mut s = summary();
        s.roles.severity = Some("severity".to_string());
        s.severity = DescriptiveStats::from_values(&[1.0, 2.0, 4.0]);
        s.timeline = Some(vec![TimelineBucket {
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            count: 3,
            anomalies: 1,
        }]);
        let artifacts = ReportArtifacts {
            event_chart: None,
            timeline_chart: Some(ArtifactRef {
                name: "Anomaly timeline".to_string(),
                link: "anomaly_timeline.json".to_string(),
                path: None,
            }),
        };

        let doc = ReportAssembler::new(ReportConfig::default()).assemble(&s, &[], &artifacts);
        assert!(doc.section("2) Anomaly Severity Summary").is_some());
        let timeline = doc.section("3) Timeline").unwrap();
        assert!(timeline.artifact.is_some());

        let md = doc.to_markdown();
        assert!(md.contains("count             3"));
        assert!(md.contains("[Anomaly timeline](anomaly_timeline.json)"));
    }

    #[test]
    fn test_schema_preview() {
        let df = df!(
            "event_type" => &[Some("a"), None],
            "bytes" => &[1i64, 2]
        )
        .unwrap();
        let preview = SchemaPreview::from_frame("evidence.csv", &df);
        assert_eq!(preview.columns[0].non_missing, 1);
        assert_eq!(preview.columns[1].non_missing, 2);
        assert_eq!(preview.columns[1].dtype, "i64");

        let doc = ReportAssembler::new(ReportConfig::default()).assemble(
            &summary(),
            &[preview],
            &ReportArtifacts::default(),
        );
        let section = doc.section("evidence.csv").unwrap();
        assert!(section.body.contains("**bytes**: i64, non-null: 2"));
    }
}
