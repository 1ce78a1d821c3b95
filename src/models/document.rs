//! Exchange documents: the versioned export shape, the loosely shaped
//! import inputs, and the summary reported back after an import.

use std::collections::BTreeMap;

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use super::{Application, CustomChecklist, CustomField, ProgressMap, SchemaRegistry};

/// Marker identifying a standardized export.
pub const EXPORT_TYPE: &str = "postdoc-tracker-export";
/// Format version written by this build.
pub const EXPORT_VERSION: &str = "1.0.0";
pub const EXPORT_DESCRIPTION: &str = "Postdoc Application Tracker Data Export";
pub const EXPORTED_BY: &str = "Postdoc Application Tracker";

// ==================== EXPORT SHAPE ====================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileFormat {
    pub version: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportInfo {
    pub export_date: String,
    pub exported_by: String,
    pub total_applications: usize,
}

/// An application as written to an export, stamped with the export time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedApplication<'a> {
    #[serde(flatten)]
    pub application: &'a Application,
    pub last_modified: &'a str,
}

/// The standardized, self-describing export document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument<'a> {
    pub file_format: FileFormat,
    pub export_info: ExportInfo,
    pub settings: &'a SchemaRegistry,
    pub applications: Vec<ExportedApplication<'a>>,
}

// ==================== IMPORT SHAPES ====================

/// Settings as they arrive in a document; every list may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingSettings {
    #[serde(default)]
    pub reference_writers: Option<Vec<String>>,
    #[serde(default)]
    pub materials: Option<Vec<String>>,
    #[serde(default)]
    pub status_options: Option<Vec<String>>,
    #[serde(default)]
    pub custom_fields: Option<Vec<CustomField>>,
    #[serde(default)]
    pub custom_checklists: Option<Vec<CustomChecklist>>,
}

/// An application as it arrives in a document, before canonicalization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingApplication {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<i64>,
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

/// Ids written by older exports may be integral floats such as `3.0`.
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = Option<i64>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an integer id")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            i64::try_from(v)
                .map(Some)
                .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
                Ok(Some(v as i64))
            } else {
                Err(E::invalid_value(de::Unexpected::Float(v), &self))
            }
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingFileFormat {
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingExportInfo {
    #[serde(default)]
    pub export_date: Option<String>,
}

/// A document carrying the standardized file format marker.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardizedDocument {
    #[serde(default)]
    pub file_format: IncomingFileFormat,
    #[serde(default)]
    pub export_info: Option<IncomingExportInfo>,
    #[serde(default)]
    pub settings: Option<IncomingSettings>,
    #[serde(default)]
    pub applications: Option<Vec<IncomingApplication>>,
}

/// A document from before the standardized format existed.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyDocument {
    #[serde(default)]
    pub config: Option<IncomingSettings>,
    #[serde(default)]
    pub applications: Option<Vec<IncomingApplication>>,
}

// ==================== IMPORT OUTCOME ====================

/// Policy for reconciling an import with the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    Replace,
    Add,
}

impl ImportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportMode::Replace => "replace",
            ImportMode::Add => "add",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "replace" => Some(ImportMode::Replace),
            "add" => Some(ImportMode::Add),
            _ => None,
        }
    }
}

/// Which document shape an import was read as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DetectedFormat {
    Standardized { version: String },
    Legacy,
}

/// Identifies a skipped duplicate to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateDetail {
    pub school: String,
    pub position: String,
}

/// Bounded view of the duplicates skipped by an add-mode import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicatePreview {
    pub found: usize,
    pub shown: Vec<DuplicateDetail>,
    pub remaining: usize,
}

/// What an import did, reported back to the user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub mode: ImportMode,
    pub format: DetectedFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
    pub total_processed: usize,
    pub total_imported: usize,
    pub duplicates_skipped: DuplicatePreview,
    pub resulting_total: usize,
    pub message: String,
}
