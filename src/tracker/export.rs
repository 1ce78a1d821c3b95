//! Serializes the tracker state into the standardized export document.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::errors::AppError;
use crate::models::{
    Application, ExportDocument, ExportInfo, ExportedApplication, FileFormat, SchemaRegistry,
    EXPORTED_BY, EXPORT_DESCRIPTION, EXPORT_TYPE, EXPORT_VERSION,
};

/// Produce the export document for `registry` and `applications`.
///
/// Output depends only on the inputs; `now` stamps both the export date and
/// every record's `lastModified`.
pub fn export_document(
    registry: &SchemaRegistry,
    applications: &[Application],
    now: DateTime<Utc>,
) -> Result<Vec<u8>, AppError> {
    let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);

    let document = ExportDocument {
        file_format: FileFormat {
            version: EXPORT_VERSION.to_string(),
            kind: EXPORT_TYPE.to_string(),
            description: EXPORT_DESCRIPTION.to_string(),
        },
        export_info: ExportInfo {
            export_date: stamp.clone(),
            exported_by: EXPORTED_BY.to_string(),
            total_applications: applications.len(),
        },
        settings: registry,
        applications: applications
            .iter()
            .map(|application| ExportedApplication {
                application,
                last_modified: &stamp,
            })
            .collect(),
    };

    serde_json::to_vec_pretty(&document)
        .map_err(|e| AppError::Export(format!("Failed to serialize export: {}", e)))
}

/// File name offered for an export taken at `now`.
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("postdoc-tracker-{}.json", now.format("%Y-%m-%d"))
}
