//! Import and export endpoints.

use std::path::{Path, PathBuf};

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{error, respond, success, ApiResult};
use crate::errors::{AppError, AppErrorWithRevision};
use crate::models::{ImportMode, ImportSummary};
use crate::tracker::export::export_file_name;
use crate::AppState;

/// Query string accepted by the import endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ImportParams {
    /// `add` or `replace`; may be left out when the tracker is empty.
    #[serde(default)]
    pub mode: Option<String>,
}

/// Where a saved export was written.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedExport {
    pub path: PathBuf,
    pub file_name: String,
    pub bytes: usize,
}

/// POST /api/import - Import an exported document from the request body.
pub async fn import_document(
    State(state): State<AppState>,
    Query(params): Query<ImportParams>,
    body: Bytes,
) -> ApiResult<ImportSummary> {
    let mode = match params.mode.as_deref().map(parse_mode).transpose() {
        Ok(mode) => mode,
        Err(e) => return error(e, 0),
    };

    // A second import must not start while anything else holds the tracker.
    let Ok(mut tracker) = state.tracker.try_lock() else {
        return error(
            AppError::Busy("Another import or edit is in progress. Please try again.".to_string()),
            0,
        );
    };

    let result = tracker.import_document(&body, mode);
    if let Err(e) = &result {
        tracing::warn!("Import failed: {}", e);
    }
    respond(result, tracker.revision_id())
}

fn parse_mode(raw: &str) -> Result<ImportMode, AppError> {
    ImportMode::from_str(raw).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Unknown import mode '{}', expected add or replace",
            raw
        ))
    })
}

/// GET /api/export - Download the current state as an export document.
pub async fn export_document(State(state): State<AppState>) -> Result<Response, AppErrorWithRevision> {
    let mut tracker = state.tracker.lock().await;
    let now = Utc::now();

    let bytes = tracker
        .export_document(now)
        .map_err(|error| AppErrorWithRevision {
            error,
            revision_id: tracker.revision_id(),
        })?;
    tracker.mark_exported();

    let disposition = format!("attachment; filename=\"{}\"", export_file_name(now));
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// POST /api/export/save - Write the export document into the export directory.
pub async fn save_export(State(state): State<AppState>) -> ApiResult<SavedExport> {
    let mut tracker = state.tracker.lock().await;
    let now = Utc::now();

    let bytes = match tracker.export_document(now) {
        Ok(bytes) => bytes,
        Err(e) => return error(e, tracker.revision_id()),
    };

    let file_name = export_file_name(now);
    let path = state.config.export_dir.join(&file_name);
    if let Err(e) = write_export(&state.config.export_dir, &path, &bytes).await {
        tracing::error!("Failed to write export to {:?}: {}", path, e);
        return error(
            AppError::Export(format!("Failed to write {}: {}", path.display(), e)),
            tracker.revision_id(),
        );
    }
    tracker.mark_exported();

    success(
        SavedExport {
            path,
            file_name,
            bytes: bytes.len(),
        },
        tracker.revision_id(),
    )
}

async fn write_export(dir: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(path, bytes).await
}

/// Read an export file from disk and import it in replace mode.
pub async fn import_file(state: &AppState, path: &Path) -> Result<ImportSummary, AppError> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::FileRead(format!("{}: {}", path.display(), e)))?;

    let mut tracker = state.tracker.lock().await;
    tracker.import_document(&raw, Some(ImportMode::Replace))
}
