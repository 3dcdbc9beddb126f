//! Semantic role resolution over arbitrary column names
//!
//! Resolution is best-effort: a column qualifies when its lowercased name is
//! one of the role's synonyms, and the earliest qualifying column wins. No
//! scoring of partial matches is attempted, so a column named `action_type`
//! never matches while an unrelated `type` column does.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic category bound to a concrete column per dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaRole {
    Event,
    Severity,
    Timestamp,
    Entity,
}

impl SchemaRole {
    pub const ALL: [SchemaRole; 4] = [
        SchemaRole::Event,
        SchemaRole::Severity,
        SchemaRole::Timestamp,
        SchemaRole::Entity,
    ];

    /// Lowercase column names that fulfil the role
    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            SchemaRole::Event => &["event", "event_type", "type", "action"],
            SchemaRole::Severity => &["severity", "score", "anomaly_score"],
            SchemaRole::Timestamp => &["timestamp", "time", "datetime", "date"],
            SchemaRole::Entity => &["entity", "value", "extracted", "text", "mention"],
        }
    }

    /// Whether an unmatched role binds to the first column instead of
    /// staying unresolved
    pub fn falls_back_to_first(self) -> bool {
        matches!(self, SchemaRole::Event | SchemaRole::Entity)
    }

    /// Pick the column for this role from `columns` (dataset order)
    pub fn resolve<S: AsRef<str>>(self, columns: &[S]) -> Option<String> {
        let names: Vec<&str> = columns.iter().map(|s| s.as_ref()).collect();
        let synonyms = self.synonyms();

        let matched = names
            .iter()
            .find(|name| synonyms.contains(&name.to_lowercase().as_str()));

        match matched {
            Some(name) => Some(name.to_string()),
            None if self.falls_back_to_first() => names.first().map(|name| name.to_string()),
            None => None,
        }
    }
}

impl fmt::Display for SchemaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchemaRole::Event => "event",
            SchemaRole::Severity => "severity",
            SchemaRole::Timestamp => "timestamp",
            SchemaRole::Entity => "entity",
        };
        f.write_str(name)
    }
}

/// Role bindings computed once per run and reused by every aggregate.
///
/// Event, severity and timestamp resolve against the scored evidence;
/// entity resolves against the entity table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRoles {
    pub event: Option<String>,
    pub severity: Option<String>,
    pub timestamp: Option<String>,
    pub entity: Option<String>,
}

impl ResolvedRoles {
    pub fn resolve<S: AsRef<str>, T: AsRef<str>>(evidence_columns: &[S], entity_columns: &[T]) -> Self {
        Self {
            event: SchemaRole::Event.resolve(evidence_columns),
            severity: SchemaRole::Severity.resolve(evidence_columns),
            timestamp: SchemaRole::Timestamp.resolve(evidence_columns),
            entity: SchemaRole::Entity.resolve(entity_columns),
        }
    }

    pub fn get(&self, role: SchemaRole) -> Option<&str> {
        match role {
            SchemaRole::Event => self.event.as_deref(),
            SchemaRole::Severity => self.severity.as_deref(),
            SchemaRole::Timestamp => self.timestamp.as_deref(),
            SchemaRole::Entity => self.entity.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_earliest_match_wins() {
        assert_eq!(
            SchemaRole::Event.resolve(&["type", "event_type"]),
            Some("type".to_string())
        );
        assert_eq!(
            SchemaRole::Event.resolve(&["id", "Event_Type", "type"]),
            Some("Event_Type".to_string())
        );
    }

    #[test]
    fn test_fallback_to_first_column() {
        assert_eq!(
            SchemaRole::Event.resolve(&["row_id", "payload"]),
            Some("row_id".to_string())
        );
        assert_eq!(
            SchemaRole::Entity.resolve(&["row_id", "entity_label"]),
            Some("row_id".to_string())
        );
    }

    #[test]
    fn test_optional_roles_stay_unresolved() {
        let columns = ["event_type", "user_id", "description"];
        assert_eq!(SchemaRole::Severity.resolve(&columns), None);
        assert_eq!(SchemaRole::Timestamp.resolve(&columns), None);
    }

    #[test]
    fn test_no_partial_matches() {
        assert_eq!(
            SchemaRole::Event.resolve(&["action_type", "event_category"]),
            Some("action_type".to_string()) // first-column fallback, not a match
        );
        assert_eq!(SchemaRole::Timestamp.resolve(&["timestamp_utc"]), None);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let evidence = ["Time", "Score", "action"];
        let entities = ["row_id", "entity_text", "Mention"];
        let first = ResolvedRoles::resolve(&evidence, &entities);
        assert_eq!(first, ResolvedRoles::resolve(&evidence, &entities));
        assert_eq!(first.get(SchemaRole::Timestamp), Some("Time"));
        assert_eq!(first.get(SchemaRole::Severity), Some("Score"));
        assert_eq!(first.get(SchemaRole::Event), Some("action"));
        assert_eq!(first.get(SchemaRole::Entity), Some("Mention"));
    }

    #[test]
    fn test_empty_schema() {
        let none: [&str; 0] = [];
        assert_eq!(SchemaRole::Event.resolve(&none), None);
    }
}
