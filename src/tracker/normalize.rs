//! Backfills every application with entries for the registry's current keys.

use crate::models::{Application, ProgressMap, SchemaRegistry, TriState};

/// Return `applications` with a progress entry for every writer, material
/// and checklist item the registry declares.
///
/// Existing values are kept as they are, including values for keys the
/// registry no longer declares. Missing keys start out `Incomplete`.
pub fn normalize_applications(
    registry: &SchemaRegistry,
    applications: Vec<Application>,
) -> Vec<Application> {
    applications
        .into_iter()
        .map(|app| normalize_application(registry, app))
        .collect()
}

pub fn normalize_application(registry: &SchemaRegistry, mut app: Application) -> Application {
    backfill(&mut app.refs, &registry.reference_writers);
    backfill(&mut app.materials, &registry.materials);
    for checklist in &registry.custom_checklists {
        let values = app
            .custom_checklist_values
            .entry(checklist.id.clone())
            .or_default();
        backfill(values, &checklist.items);
    }
    app
}

fn backfill(values: &mut ProgressMap, keys: &[String]) {
    for key in keys {
        values.entry(key.clone()).or_insert(TriState::Incomplete);
    }
}
