//! Application record model matching the tracker's JSON shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::TriState;

/// Reference letters required when a record does not say otherwise.
pub const DEFAULT_NUM_REFS: i64 = 3;

/// Tri-state progress keyed by writer, material or checklist item.
pub type ProgressMap = BTreeMap<String, TriState>;

/// One tracked job application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: i64,
    pub school: String,
    pub position: String,
    pub title: String,
    pub location: String,
    pub deadline: String,
    pub status: String,
    pub contact: String,
    pub connections: String,
    pub link: String,
    pub comments: String,
    pub num_refs: i64,
    pub refs: ProgressMap,
    pub materials: ProgressMap,
    pub custom_field_values: BTreeMap<String, String>,
    pub custom_checklist_values: BTreeMap<String, ProgressMap>,
}

/// Request body for creating a new application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationRequest {
    pub school: String,
    pub position: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub connections: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub num_refs: Option<i64>,
    #[serde(default)]
    pub refs: Option<ProgressMap>,
    #[serde(default)]
    pub materials: Option<ProgressMap>,
    #[serde(default)]
    pub custom_field_values: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub custom_checklist_values: Option<BTreeMap<String, ProgressMap>>,
}

/// Request body for updating an existing application.
///
/// Fields left out keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApplicationRequest {
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub connections: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub num_refs: Option<i64>,
    #[serde(default)]
    pub refs: Option<ProgressMap>,
    #[serde(default)]
    pub materials: Option<ProgressMap>,
    #[serde(default)]
    pub custom_field_values: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub custom_checklist_values: Option<BTreeMap<String, ProgressMap>>,
}

/// The item a toggle request cycles.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "section", rename_all = "camelCase")]
pub enum ToggleTarget {
    #[serde(rename_all = "camelCase")]
    Reference { key: String },
    #[serde(rename_all = "camelCase")]
    Material { key: String },
    #[serde(rename_all = "camelCase")]
    Checklist { checklist_id: String, key: String },
}
