//! Application API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Local;

use super::{respond, success, ApiResult};
use crate::models::{
    Application, ApplicationListing, ApplicationQuery, CreateApplicationRequest, Stats,
    ToggleTarget, TriState, UpdateApplicationRequest,
};
use crate::AppState;

/// GET /api/applications - List applications matching the query.
pub async fn list_applications(
    State(state): State<AppState>,
    Query(query): Query<ApplicationQuery>,
) -> ApiResult<Vec<ApplicationListing>> {
    let tracker = state.tracker.lock().await;
    let today = Local::now().date_naive();
    success(
        tracker.list_applications(&query, today),
        tracker.revision_id(),
    )
}

/// GET /api/applications/:id - Get a single application.
pub async fn get_application(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Application> {
    let tracker = state.tracker.lock().await;
    let result = tracker.get_application(id).cloned();
    respond(result, tracker.revision_id())
}

/// POST /api/applications - Create a new application.
pub async fn create_application(
    State(state): State<AppState>,
    Json(request): Json<CreateApplicationRequest>,
) -> ApiResult<Application> {
    let mut tracker = state.tracker.lock().await;
    let result = tracker.create_application(request);
    respond(result, tracker.revision_id())
}

/// PUT /api/applications/:id - Update an application.
pub async fn update_application(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateApplicationRequest>,
) -> ApiResult<Application> {
    let mut tracker = state.tracker.lock().await;
    let result = tracker.update_application(id, request);
    respond(result, tracker.revision_id())
}

/// POST /api/applications/:id/toggle - Cycle one progress item.
pub async fn toggle_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(target): Json<ToggleTarget>,
) -> ApiResult<TriState> {
    let mut tracker = state.tracker.lock().await;
    let result = tracker.toggle_item(id, target);
    respond(result, tracker.revision_id())
}

/// DELETE /api/applications/:id - Delete an application.
pub async fn delete_application(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Application> {
    let mut tracker = state.tracker.lock().await;
    let result = tracker.delete_application(id);
    respond(result, tracker.revision_id())
}

/// GET /api/stats - Totals per status.
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Stats> {
    let tracker = state.tracker.lock().await;
    success(tracker.stats(), tracker.revision_id())
}
