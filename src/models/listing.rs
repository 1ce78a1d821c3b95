//! Derived views over applications: filtered listings and statistics.

use serde::{Deserialize, Serialize};

use super::Application;

/// Ordering applied to a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Deadline,
    School,
    /// Insertion order.
    None,
}

impl SortBy {
    /// Unrecognized names keep insertion order.
    pub fn from_query(s: &str) -> Self {
        match s {
            "deadline" => SortBy::Deadline,
            "school" => SortBy::School,
            _ => SortBy::None,
        }
    }
}

/// Query string accepted by the listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationQuery {
    #[serde(default)]
    pub search: Option<String>,
    /// A status value, or `all`.
    #[serde(default)]
    pub status: Option<String>,
    /// `deadline` (the default), `school`, or anything else for insertion order.
    #[serde(default)]
    pub sort: Option<String>,
}

/// Completion counts shown on an application card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub refs_completed: usize,
    pub refs_total: usize,
    pub refs_required: i64,
    pub materials_ready: usize,
    pub materials_total: usize,
}

/// An application together with its deadline countdown and progress.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationListing {
    #[serde(flatten)]
    pub application: Application,
    pub days_left: Option<i64>,
    pub urgent: bool,
    pub progress: Progress,
}

/// Count of applications in one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
}

/// Totals shown in the tracker header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub by_status: Vec<StatusCount>,
}
