//! Datastore API endpoints.

use axum::extract::State;

use super::{success, ApiResult};
use crate::models::{Datastore, RevisionInfo};
use crate::AppState;

/// GET /api/datastore - Get the full tracker state.
pub async fn get_datastore(State(state): State<AppState>) -> ApiResult<Datastore> {
    let tracker = state.tracker.lock().await;
    success(tracker.datastore(), tracker.revision_id())
}

/// GET /api/datastore/revision - Get the current revision info.
pub async fn get_revision(State(state): State<AppState>) -> ApiResult<RevisionInfo> {
    let tracker = state.tracker.lock().await;
    success(tracker.revision_info(), tracker.revision_id())
}
