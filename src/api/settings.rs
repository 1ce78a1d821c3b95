//! Settings API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{error, respond, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CustomChecklist, CustomField, RegistryList, SchemaRegistry};
use crate::tracker::settings::{
    CreateChecklistRequest, CreateCustomFieldRequest, RegistryEntryRequest,
};
use crate::AppState;

fn registry_list(name: &str) -> Result<RegistryList, AppError> {
    RegistryList::from_str(name)
        .ok_or_else(|| AppError::NotFound(format!("Unknown settings list {}", name)))
}

/// GET /api/settings - Get the schema registry.
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<SchemaRegistry> {
    let tracker = state.tracker.lock().await;
    success(tracker.registry().clone(), tracker.revision_id())
}

/// POST /api/settings/:list - Append an entry to a plain list.
pub async fn add_registry_entry(
    State(state): State<AppState>,
    Path(list): Path<String>,
    Json(request): Json<RegistryEntryRequest>,
) -> ApiResult<String> {
    let mut tracker = state.tracker.lock().await;
    let list = match registry_list(&list) {
        Ok(list) => list,
        Err(e) => return error(e, tracker.revision_id()),
    };
    let result = tracker.add_registry_entry(list, &request.value);
    respond(result, tracker.revision_id())
}

/// PUT /api/settings/:list/:index - Rename an entry.
pub async fn rename_registry_entry(
    State(state): State<AppState>,
    Path((list, index)): Path<(String, usize)>,
    Json(request): Json<RegistryEntryRequest>,
) -> ApiResult<String> {
    let mut tracker = state.tracker.lock().await;
    let list = match registry_list(&list) {
        Ok(list) => list,
        Err(e) => return error(e, tracker.revision_id()),
    };
    let result = tracker.rename_registry_entry(list, index, &request.value);
    respond(result, tracker.revision_id())
}

/// DELETE /api/settings/:list/:index - Remove an entry.
pub async fn remove_registry_entry(
    State(state): State<AppState>,
    Path((list, index)): Path<(String, usize)>,
) -> ApiResult<String> {
    let mut tracker = state.tracker.lock().await;
    let list = match registry_list(&list) {
        Ok(list) => list,
        Err(e) => return error(e, tracker.revision_id()),
    };
    let result = tracker.remove_registry_entry(list, index);
    respond(result, tracker.revision_id())
}

/// POST /api/settings/custom-fields - Add a custom field.
pub async fn add_custom_field(
    State(state): State<AppState>,
    Json(request): Json<CreateCustomFieldRequest>,
) -> ApiResult<CustomField> {
    let mut tracker = state.tracker.lock().await;
    let result = tracker.add_custom_field(&request);
    respond(result, tracker.revision_id())
}

/// DELETE /api/settings/custom-fields/:id - Remove a custom field.
pub async fn remove_custom_field(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let mut tracker = state.tracker.lock().await;
    let result = tracker.remove_custom_field(&id);
    respond(result, tracker.revision_id())
}

/// POST /api/settings/custom-checklists - Add a custom checklist.
pub async fn add_custom_checklist(
    State(state): State<AppState>,
    Json(request): Json<CreateChecklistRequest>,
) -> ApiResult<CustomChecklist> {
    let mut tracker = state.tracker.lock().await;
    let result = tracker.add_custom_checklist(&request);
    respond(result, tracker.revision_id())
}

/// DELETE /api/settings/custom-checklists/:id - Remove a custom checklist.
pub async fn remove_custom_checklist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let mut tracker = state.tracker.lock().await;
    let result = tracker.remove_custom_checklist(&id);
    respond(result, tracker.revision_id())
}
