//! Snapshot of the whole tracker state.

use serde::Serialize;

use super::{Application, SchemaRegistry};

/// Everything the view layer needs to render the tracker.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Datastore {
    pub revision_id: i64,
    pub unsaved_changes: bool,
    pub settings: SchemaRegistry,
    pub applications: Vec<Application>,
}

/// Revision information for change detection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub unsaved_changes: bool,
    pub total_applications: usize,
}
