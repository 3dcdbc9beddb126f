//! Deterministic aggregate views over the scored evidence and entity table

use crate::anomaly::AnomalyLabel;
use crate::config::ReportConfig;
use crate::error::Result;
use crate::report::schema::{ResolvedRoles, SchemaRole};
use crate::utils::{column_as_text, column_names, parse_timestamp};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Placeholder counted in place of missing cells
pub const MISSING_SENTINEL: &str = "<MISSING>";

/// One ranked value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// count / mean / std / min / quartiles / max of a numeric sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; absent for a single value
    pub std: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl DescriptiveStats {
    /// `None` for an empty sample
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let std = (n > 1).then(|| {
            let ss = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
            (ss / (n - 1) as f64).sqrt()
        });

        Some(Self {
            count: n,
            mean,
            std,
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[n - 1],
        })
    }
}

/// Linear interpolation between closest ranks; `sorted` must be non-empty
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Rows observed on one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineBucket {
    pub date: NaiveDate,
    pub count: usize,
    /// Rows labelled anomalous that day (0 when no label column exists)
    pub anomalies: usize,
}

/// Label totals of the scored dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyOverview {
    pub total: usize,
    pub anomalies: usize,
}

impl AnomalyOverview {
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.anomalies as f64 / self.total as f64
    }
}

/// Reduced coverage absorbed during aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Degradation {
    /// No column matched the role's synonyms
    UnresolvedRole(SchemaRole),
    /// Cells of `column` that could not be coerced and were left out
    CoercionFailures {
        role: SchemaRole,
        column: String,
        excluded: usize,
    },
    /// Coercion left nothing to aggregate
    NoValidValues { role: SchemaRole, column: String },
}

impl std::fmt::Display for Degradation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Degradation::UnresolvedRole(role) => {
                write!(f, "No {} column was found; the related findings are not available.", role)
            }
            Degradation::CoercionFailures { role, column, excluded } => write!(
                f,
                "{} value(s) in `{}` could not be read as {} data and were excluded from that aggregate.",
                excluded,
                column,
                role
            ),
            Degradation::NoValidValues { role, column } => write!(
                f,
                "`{}` holds no usable {} values; the related findings are not available.",
                column, role
            ),
        }
    }
}

/// Everything the report needs, computed fresh per report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub roles: ResolvedRoles,
    pub total_rows: usize,
    /// Every distinct event value, ranked
    pub event_distribution: Vec<ValueCount>,
    pub severity: Option<DescriptiveStats>,
    pub timeline: Option<Vec<TimelineBucket>>,
    /// Top entities, ranked and truncated
    pub entity_ranking: Vec<ValueCount>,
    pub overview: Option<AnomalyOverview>,
    pub degradations: Vec<Degradation>,
}

/// Computes the four aggregates from resolved roles.
///
/// Each aggregate tolerates its role being absent; none of them fails the
/// whole summary on a bad cell.
#[derive(Debug, Clone)]
pub struct Aggregator {
    entity_top_n: usize,
    label_column: String,
}

impl Aggregator {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            entity_top_n: config.entity_top_n,
            label_column: config.label_column.clone(),
        }
    }

    /// Resolve roles once and aggregate both tables
    pub fn aggregate(&self, scored: &DataFrame, entities: &DataFrame) -> Result<AggregateSummary> {
        let roles = ResolvedRoles::resolve(&column_names(scored), &column_names(entities));
        debug!(?roles, "Resolved schema roles");
        self.aggregate_with_roles(scored, entities, roles)
    }

    /// Aggregate with roles resolved by the caller
    pub fn aggregate_with_roles(
        &self,
        scored: &DataFrame,
        entities: &DataFrame,
        roles: ResolvedRoles,
    ) -> Result<AggregateSummary> {
        let mut degradations = Vec::new();

        let event_distribution = match roles.event.as_deref() {
            Some(col) => rank_values(&column_as_text(scored, col)?),
            None => Vec::new(),
        };

        let severity = match roles.severity.as_deref() {
            Some(col) => severity_summary(scored, col, &mut degradations)?,
            None => {
                degradations.push(Degradation::UnresolvedRole(SchemaRole::Severity));
                None
            }
        };

        let labels = self.labels(scored)?;

        let timeline = match roles.timestamp.as_deref() {
            Some(col) => daily_timeline(scored, col, labels.as_deref(), &mut degradations)?,
            None => {
                degradations.push(Degradation::UnresolvedRole(SchemaRole::Timestamp));
                None
            }
        };

        let mut entity_ranking = match roles.entity.as_deref() {
            Some(col) => rank_values(&column_as_text(entities, col)?),
            None => Vec::new(),
        };
        entity_ranking.truncate(self.entity_top_n);

        let overview = labels.as_ref().map(|labels| AnomalyOverview {
            total: scored.height(),
            anomalies: labels.iter().filter(|l| l.is_some_and(AnomalyLabel::is_anomaly)).count(),
        });

        for d in &degradations {
            warn!(degradation = %d, "Aggregate degraded");
        }

        Ok(AggregateSummary {
            roles,
            total_rows: scored.height(),
            event_distribution,
            severity,
            timeline,
            entity_ranking,
            overview,
            degradations,
        })
    }

    /// Parsed labels when the scored frame carries the label column
    fn labels(&self, scored: &DataFrame) -> Result<Option<Vec<Option<AnomalyLabel>>>> {
        if scored.column(&self.label_column).is_err() {
            return Ok(None);
        }
        let cells = column_as_text(scored, &self.label_column)?;
        Ok(Some(
            cells
                .iter()
                .map(|c| c.as_deref().and_then(AnomalyLabel::parse))
                .collect(),
        ))
    }
}

/// Count per distinct value, missing cells under [`MISSING_SENTINEL`].
/// Ranked by descending count, ties in first-seen order.
pub fn rank_values(cells: &[Option<String>]) -> Vec<ValueCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<ValueCount> = Vec::new();

    for cell in cells {
        let value = cell.as_deref().unwrap_or(MISSING_SENTINEL);
        match index.get(value) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(value, counts.len());
                counts.push(ValueCount {
                    value: value.to_string(),
                    count: 1,
                });
            }
        }
    }

    // stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

fn severity_summary(
    scored: &DataFrame,
    column: &str,
    degradations: &mut Vec<Degradation>,
) -> Result<Option<DescriptiveStats>> {
    let cells = column_as_text(scored, column)?;
    let mut values = Vec::with_capacity(cells.len());
    let mut excluded = 0usize;

    for cell in cells.iter().flatten() {
        match cell.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => values.push(v),
            _ => excluded += 1,
        }
    }

    if excluded > 0 {
        degradations.push(Degradation::CoercionFailures {
            role: SchemaRole::Severity,
            column: column.to_string(),
            excluded,
        });
    }

    let stats = DescriptiveStats::from_values(&values);
    if stats.is_none() {
        degradations.push(Degradation::NoValidValues {
            role: SchemaRole::Severity,
            column: column.to_string(),
        });
    }
    Ok(stats)
}

/// Rows per calendar day from the first to the last observed day.
/// Days without rows inside that span appear with a zero count.
fn daily_timeline(
    scored: &DataFrame,
    column: &str,
    labels: Option<&[Option<AnomalyLabel>]>,
    degradations: &mut Vec<Degradation>,
) -> Result<Option<Vec<TimelineBucket>>> {
    let cells = column_as_text(scored, column)?;
    let mut days: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    let mut excluded = 0usize;

    for (i, cell) in cells.iter().enumerate() {
        let Some(raw) = cell.as_deref() else { continue };
        let Some(ts) = parse_timestamp(raw) else {
            excluded += 1;
            continue;
        };
        let is_anomaly = labels
            .and_then(|l| l.get(i).copied().flatten())
            .is_some_and(AnomalyLabel::is_anomaly);

        let entry = days.entry(ts.date()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += usize::from(is_anomaly);
    }

    if excluded > 0 {
        degradations.push(Degradation::CoercionFailures {
            role: SchemaRole::Timestamp,
            column: column.to_string(),
            excluded,
        });
    }

    let (Some(&first), Some(&last)) = (days.keys().next(), days.keys().next_back()) else {
        degradations.push(Degradation::NoValidValues {
            role: SchemaRole::Timestamp,
            column: column.to_string(),
        });
        return Ok(None);
    };

    let mut buckets = Vec::new();
    let mut day = Some(first);
    while let Some(date) = day.filter(|d| *d <= last) {
        let (count, anomalies) = days.get(&date).copied().unwrap_or((0, 0));
        buckets.push(TimelineBucket { date, count, anomalies });
        day = date.succ_opt();
    }
    Ok(Some(buckets))
}
