//! Error handling module for the tracker.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const INVALID_JSON: &str = "INVALID_JSON";
    pub const MALFORMED_DOCUMENT: &str = "MALFORMED_DOCUMENT";
    pub const FILE_READ_ERROR: &str = "FILE_READ_ERROR";
    pub const IMPORT_MODE_REQUIRED: &str = "IMPORT_MODE_REQUIRED";
    pub const IMPORT_BUSY: &str = "IMPORT_BUSY";
    pub const EXPORT_ERROR: &str = "EXPORT_ERROR";
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Authentication required
    Unauthorized(String),
    /// Resource not found
    NotFound(String),
    /// Validation error
    Validation(String),
    /// Bad request
    BadRequest(String),
    /// Import input is not JSON; carries the parser detail
    InvalidJson(String),
    /// Import input is JSON but not a document the tracker understands
    MalformedDocument(String),
    /// The selected import file could not be read
    FileRead(String),
    /// Import into a non-empty tracker without choosing add or replace
    ImportModeRequired { existing: usize },
    /// Another import or edit is in flight
    Busy(String),
    /// Export could not be written
    Export(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            AppError::MalformedDocument(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::FileRead(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ImportModeRequired { .. } => StatusCode::CONFLICT,
            AppError::Busy(_) => StatusCode::CONFLICT,
            AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
            AppError::InvalidJson(_) => codes::INVALID_JSON,
            AppError::MalformedDocument(_) => codes::MALFORMED_DOCUMENT,
            AppError::FileRead(_) => codes::FILE_READ_ERROR,
            AppError::ImportModeRequired { .. } => codes::IMPORT_MODE_REQUIRED,
            AppError::Busy(_) => codes::IMPORT_BUSY,
            AppError::Export(_) => codes::EXPORT_ERROR,
        }
    }

    /// Get the user-facing error message.
    pub fn message(&self) -> String {
        match self {
            AppError::InvalidJson(detail) => format!(
                "Error importing data. Please make sure the file is valid JSON. Error details: {}",
                detail
            ),
            AppError::MalformedDocument(_) => {
                "Error importing data. The file is not a recognized tracker export.".to_string()
            }
            AppError::FileRead(_) => "Error reading file. Please try again.".to_string(),
            AppError::ImportModeRequired { existing } => format!(
                "You currently have {} application(s) in your tracker. Choose mode=add to merge \
                 the imported data or mode=replace to replace all current data.",
                existing
            ),
            AppError::Export(_) => "Export failed. Please try again.".to_string(),
            AppError::Unauthorized(msg)
            | AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::BadRequest(msg)
            | AppError::Busy(msg) => msg.clone(),
        }
    }

    /// Structured detail attached to the response envelope, if any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::ImportModeRequired { existing } => {
                Some(serde_json::json!({ "existingApplications": existing }))
            }
            AppError::MalformedDocument(detail)
            | AppError::FileRead(detail)
            | AppError::Export(detail) => Some(serde_json::json!({ "cause": detail })),
            _ => None,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
    pub revision_id: i64,
}

impl ErrorResponse {
    pub fn new(error: &AppError, revision_id: i64) -> Self {
        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
                details: error.details(),
            },
            revision_id,
        }
    }
}

/// Wrapper type for errors that carry revision_id context.
pub struct AppErrorWithRevision {
    pub error: AppError,
    pub revision_id: i64,
}

impl IntoResponse for AppErrorWithRevision {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let body = ErrorResponse::new(&self.error, self.revision_id);
        (status, Json(body)).into_response()
    }
}
