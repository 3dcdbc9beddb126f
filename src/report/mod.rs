//! Schema-agnostic aggregation and report synthesis
//!
//! - [`schema`] binds semantic roles to concrete columns
//! - [`aggregate`] computes event, severity, timeline and entity views
//! - [`render`] is the boundary to the external chart renderer
//! - [`document`] orders everything into the final report

pub mod aggregate;
pub mod document;
pub mod render;
pub mod schema;

pub use aggregate::{
    AggregateSummary, Aggregator, AnomalyOverview, Degradation, DescriptiveStats, TimelineBucket,
    ValueCount, MISSING_SENTINEL,
};
pub use document::{ReportArtifacts, ReportAssembler, ReportDocument, SchemaPreview, Section};
pub use render::{ArtifactRef, ChartRenderer, ChartSpec, ChartSpecRenderer};
pub use schema::{ResolvedRoles, SchemaRole};
