//! The tracker: owns the schema registry and the application list.
//!
//! All mutation goes through [`Tracker`]; there is no other copy of the
//! state. Every successful mutation bumps the revision counter so the view
//! layer can detect change.

pub mod dedup;
pub mod export;
pub mod import;
pub mod merge;
pub mod normalize;
pub mod query;
pub mod settings;

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::errors::AppError;
use crate::models::{
    Application, ApplicationListing, ApplicationQuery, CreateApplicationRequest, CustomChecklist,
    CustomField, Datastore, ImportMode, ImportSummary, ProgressMap, RegistryList, RevisionInfo,
    SchemaRegistry, Stats, ToggleTarget, TriState, UpdateApplicationRequest, DEFAULT_NUM_REFS,
};
use settings::{CreateChecklistRequest, CreateCustomFieldRequest};

/// In-memory tracker state.
#[derive(Debug, Clone)]
pub struct Tracker {
    registry: SchemaRegistry,
    applications: Vec<Application>,
    /// Highest identifier handed out this session.
    high_water_id: i64,
    revision_id: i64,
    unsaved_changes: bool,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new(SchemaRegistry::default())
    }
}

impl Tracker {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self {
            registry,
            applications: Vec::new(),
            high_water_id: 0,
            revision_id: 0,
            unsaved_changes: false,
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    pub fn revision_id(&self) -> i64 {
        self.revision_id
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved_changes
    }

    pub fn datastore(&self) -> Datastore {
        Datastore {
            revision_id: self.revision_id,
            unsaved_changes: self.unsaved_changes,
            settings: self.registry.clone(),
            applications: self.applications.clone(),
        }
    }

    pub fn revision_info(&self) -> RevisionInfo {
        RevisionInfo {
            revision_id: self.revision_id,
            unsaved_changes: self.unsaved_changes,
            total_applications: self.applications.len(),
        }
    }

    fn touch(&mut self) {
        self.revision_id += 1;
        self.unsaved_changes = true;
    }

    fn renormalize(&mut self) {
        let applications = std::mem::take(&mut self.applications);
        self.applications = normalize::normalize_applications(&self.registry, applications);
    }

    fn next_id(&mut self) -> Result<i64, AppError> {
        let max_held = self.applications.iter().map(|a| a.id).max().unwrap_or(0);
        let next = self
            .high_water_id
            .max(max_held)
            .checked_add(1)
            .ok_or_else(|| AppError::Validation("No application ids left to assign".to_string()))?;
        self.high_water_id = next;
        Ok(next)
    }

    // ==================== APPLICATION OPERATIONS ====================

    pub fn list_applications(
        &self,
        query: &ApplicationQuery,
        today: NaiveDate,
    ) -> Vec<ApplicationListing> {
        query::list_applications(&self.registry, &self.applications, query, today)
    }

    pub fn stats(&self) -> Stats {
        query::stats(&self.registry, &self.applications)
    }

    pub fn get_application(&self, id: i64) -> Result<&Application, AppError> {
        self.applications
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| application_not_found(id))
    }

    fn resolve_status(&self, requested: Option<String>) -> Result<String, AppError> {
        match requested.filter(|s| !s.trim().is_empty()) {
            None => Ok(self.registry.default_status().to_string()),
            Some(status) if self.registry.has_status(&status) => Ok(status),
            Some(status) => Err(AppError::Validation(format!(
                "Unknown status '{}'",
                status
            ))),
        }
    }

    /// Create an application seeded with an entry for every registry key.
    pub fn create_application(
        &mut self,
        request: CreateApplicationRequest,
    ) -> Result<Application, AppError> {
        if request.school.trim().is_empty() {
            return Err(AppError::Validation("School is required".to_string()));
        }
        if request.position.trim().is_empty() {
            return Err(AppError::Validation("Position is required".to_string()));
        }
        let status = self.resolve_status(request.status)?;
        let num_refs = request.num_refs.unwrap_or(DEFAULT_NUM_REFS);
        validate_num_refs(num_refs)?;

        let mut custom_field_values: BTreeMap<String, String> = self
            .registry
            .custom_fields
            .iter()
            .map(|f| (f.id.clone(), String::new()))
            .collect();
        custom_field_values.extend(request.custom_field_values.unwrap_or_default());

        let id = self.next_id()?;
        let app = Application {
            id,
            school: request.school,
            position: request.position,
            title: request.title.unwrap_or_default(),
            location: request.location.unwrap_or_default(),
            deadline: request.deadline.unwrap_or_default(),
            status,
            contact: request.contact.unwrap_or_default(),
            connections: request.connections.unwrap_or_default(),
            link: request.link.unwrap_or_default(),
            comments: request.comments.unwrap_or_default(),
            num_refs,
            refs: request.refs.unwrap_or_default(),
            materials: request.materials.unwrap_or_default(),
            custom_field_values,
            custom_checklist_values: request.custom_checklist_values.unwrap_or_default(),
        };
        let app = normalize::normalize_application(&self.registry, app);

        tracing::info!(id = app.id, school = %app.school, "Created application");
        self.applications.push(app.clone());
        self.touch();
        Ok(app)
    }

    /// Overwrite the fields present in `request`; the id never changes.
    pub fn update_application(
        &mut self,
        id: i64,
        request: UpdateApplicationRequest,
    ) -> Result<Application, AppError> {
        let status = match request.status {
            Some(status) => Some(self.resolve_status(Some(status))?),
            None => None,
        };
        if matches!(&request.school, Some(s) if s.trim().is_empty()) {
            return Err(AppError::Validation("School is required".to_string()));
        }
        if matches!(&request.position, Some(p) if p.trim().is_empty()) {
            return Err(AppError::Validation("Position is required".to_string()));
        }
        if let Some(num_refs) = request.num_refs {
            validate_num_refs(num_refs)?;
        }

        let index = self.position_of(id)?;
        let mut app = self.applications[index].clone();

        fn set<T>(target: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *target = value;
            }
        }
        set(&mut app.school, request.school);
        set(&mut app.position, request.position);
        set(&mut app.title, request.title);
        set(&mut app.location, request.location);
        set(&mut app.deadline, request.deadline);
        set(&mut app.status, status);
        set(&mut app.contact, request.contact);
        set(&mut app.connections, request.connections);
        set(&mut app.link, request.link);
        set(&mut app.comments, request.comments);
        set(&mut app.num_refs, request.num_refs);
        set(&mut app.refs, request.refs);
        set(&mut app.materials, request.materials);
        set(&mut app.custom_field_values, request.custom_field_values);
        set(&mut app.custom_checklist_values, request.custom_checklist_values);

        let app = normalize::normalize_application(&self.registry, app);
        self.applications[index] = app.clone();
        self.touch();
        Ok(app)
    }

    /// Cycle one progress item through incomplete, complete and optional.
    pub fn toggle_item(&mut self, id: i64, target: ToggleTarget) -> Result<TriState, AppError> {
        let index = self.position_of(id)?;
        let app = &mut self.applications[index];

        let (values, key): (&mut ProgressMap, String) = match target {
            ToggleTarget::Reference { key } => (&mut app.refs, key),
            ToggleTarget::Material { key } => (&mut app.materials, key),
            ToggleTarget::Checklist { checklist_id, key } => {
                if self.registry.checklist(&checklist_id).is_none() {
                    return Err(AppError::NotFound(format!(
                        "Checklist {} not found",
                        checklist_id
                    )));
                }
                (
                    app.custom_checklist_values.entry(checklist_id).or_default(),
                    key,
                )
            }
        };

        let Some(value) = values.get_mut(&key) else {
            return Err(AppError::NotFound(format!("Item {} not tracked", key)));
        };
        *value = value.cycle();
        let next = *value;

        self.touch();
        Ok(next)
    }

    pub fn delete_application(&mut self, id: i64) -> Result<Application, AppError> {
        let index = self.position_of(id)?;
        let removed = self.applications.remove(index);
        tracing::info!(id, school = %removed.school, "Deleted application");
        self.touch();
        Ok(removed)
    }

    fn position_of(&self, id: i64) -> Result<usize, AppError> {
        self.applications
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| application_not_found(id))
    }

    // ==================== SETTINGS OPERATIONS ====================

    /// Apply a registry edit, then backfill applications for the new shape.
    fn edit_registry<T>(
        &mut self,
        edit: impl FnOnce(&mut SchemaRegistry) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut registry = self.registry.clone();
        let result = edit(&mut registry)?;
        self.registry = registry;
        self.renormalize();
        self.touch();
        Ok(result)
    }

    pub fn add_registry_entry(&mut self, list: RegistryList, value: &str) -> Result<String, AppError> {
        self.edit_registry(|r| settings::add_entry(r, list, value))
    }

    pub fn rename_registry_entry(
        &mut self,
        list: RegistryList,
        index: usize,
        value: &str,
    ) -> Result<String, AppError> {
        self.edit_registry(|r| settings::rename_entry(r, list, index, value))
    }

    pub fn remove_registry_entry(
        &mut self,
        list: RegistryList,
        index: usize,
    ) -> Result<String, AppError> {
        self.edit_registry(|r| settings::remove_entry(r, list, index))
    }

    pub fn add_custom_field(
        &mut self,
        request: &CreateCustomFieldRequest,
    ) -> Result<CustomField, AppError> {
        self.edit_registry(|r| settings::add_custom_field(r, request))
    }

    pub fn remove_custom_field(&mut self, id: &str) -> Result<(), AppError> {
        self.edit_registry(|r| settings::remove_custom_field(r, id))
    }

    pub fn add_custom_checklist(
        &mut self,
        request: &CreateChecklistRequest,
    ) -> Result<CustomChecklist, AppError> {
        self.edit_registry(|r| settings::add_custom_checklist(r, request))
    }

    pub fn remove_custom_checklist(&mut self, id: &str) -> Result<(), AppError> {
        self.edit_registry(|r| settings::remove_custom_checklist(r, id))
    }

    // ==================== IMPORT / EXPORT ====================

    /// Import a document. Without an explicit mode an empty tracker is
    /// replaced and a non-empty one refuses until the caller chooses.
    ///
    /// Nothing changes unless the whole import succeeds.
    pub fn import_document(
        &mut self,
        raw: &[u8],
        mode: Option<ImportMode>,
    ) -> Result<ImportSummary, AppError> {
        let mode = match mode {
            Some(mode) => mode,
            None if self.applications.is_empty() => ImportMode::Replace,
            None => {
                return Err(AppError::ImportModeRequired {
                    existing: self.applications.len(),
                })
            }
        };

        let reconciled = import::reconcile(&self.registry, &self.applications, raw, mode)?;

        self.registry = reconciled.registry;
        self.applications = reconciled.applications;
        let max_held = self.applications.iter().map(|a| a.id).max().unwrap_or(0);
        self.high_water_id = self.high_water_id.max(max_held);
        self.revision_id += 1;
        self.unsaved_changes = false;

        let summary = reconciled.summary;
        tracing::info!(
            mode = summary.mode.as_str(),
            processed = summary.total_processed,
            imported = summary.total_imported,
            duplicates = summary.duplicates_skipped.found,
            total = summary.resulting_total,
            "Import committed"
        );
        Ok(summary)
    }

    /// Serialize the current state.
    pub fn export_document(&self, now: DateTime<Utc>) -> Result<Vec<u8>, AppError> {
        export::export_document(&self.registry, &self.applications, now)
    }

    /// Record that the current state has been handed off as an export.
    pub fn mark_exported(&mut self) {
        self.unsaved_changes = false;
        tracing::info!(
            applications = self.applications.len(),
            version = crate::models::EXPORT_VERSION,
            "Export successful"
        );
    }
}

/// Imports read a missing or zero count as the default, so zero never round-trips.
fn validate_num_refs(num_refs: i64) -> Result<(), AppError> {
    if num_refs < 1 {
        return Err(AppError::Validation(
            "At least one reference is required".to_string(),
        ));
    }
    Ok(())
}

fn application_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Application {} not found", id))
}
