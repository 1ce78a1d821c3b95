//! Import pipeline: reconciles an exchanged document with the current state.
//!
//! Reconciliation never touches the caller's state. It works on copies and
//! hands back the complete new registry and application list, which the
//! tracker swaps in only when every step succeeded.

use serde_json::Value;

use super::dedup::filter_duplicates;
use super::merge::merge_settings;
use super::normalize::normalize_applications;
use crate::errors::AppError;
use crate::models::{
    Application, CustomChecklist, CustomField, DetectedFormat, DuplicateDetail, DuplicatePreview,
    ImportMode, ImportSummary, IncomingApplication, IncomingSettings, LegacyDocument,
    SchemaRegistry, StandardizedDocument, DEFAULT_NUM_REFS, DEFAULT_STATUS_OPTIONS, EXPORT_TYPE,
    FALLBACK_STATUS,
};

/// Number of skipped duplicates listed by name in a summary.
const DUPLICATE_PREVIEW_LIMIT: usize = 3;

/// The state an import produces, ready to be committed.
#[derive(Debug)]
pub struct Reconciled {
    pub registry: SchemaRegistry,
    pub applications: Vec<Application>,
    pub summary: ImportSummary,
}

/// A parsed document, independent of which format it came in.
struct ParsedDocument {
    format: DetectedFormat,
    exported_at: Option<String>,
    settings: Option<IncomingSettings>,
    applications: Option<Vec<IncomingApplication>>,
}

/// Run the whole import against copies of `registry` and `applications`.
pub fn reconcile(
    registry: &SchemaRegistry,
    applications: &[Application],
    raw: &[u8],
    mode: ImportMode,
) -> Result<Reconciled, AppError> {
    let document = parse_document(raw)?;
    tracing::debug!(format = ?document.format, mode = mode.as_str(), "Reconciling import");

    let mut next_registry = registry.clone();
    if let Some(settings) = document.settings {
        match mode {
            ImportMode::Replace => next_registry = replace_settings(settings),
            ImportMode::Add => merge_settings(&mut next_registry, &settings),
        }
    }

    let incoming = document.applications;
    let total_processed = incoming.as_ref().map_or(0, Vec::len);
    let mut total_imported = 0;
    let mut duplicates_found = 0;
    let mut duplicates = Vec::new();

    let next_applications = match (incoming, mode) {
        (None, _) => applications.to_vec(),
        (Some(incoming), ImportMode::Replace) => {
            let imported = assign_carried_ids(incoming.into_iter().map(canonicalize).collect())?;
            total_imported = imported.len();
            imported
        }
        (Some(incoming), ImportMode::Add) => {
            let candidates = incoming
                .into_iter()
                .map(|raw| canonicalize(raw).1)
                .collect();
            let filtered = filter_duplicates(candidates, applications);
            duplicates_found = filtered.found;
            duplicates = filtered.details;

            let max_existing = applications.iter().map(|a| a.id).max().unwrap_or(0);
            let mut merged = applications.to_vec();
            let mut next = max_existing;
            for mut app in filtered.unique {
                next = next_id_after(next)?;
                app.id = next;
                merged.push(app);
            }
            total_imported = merged.len() - applications.len();
            merged
        }
    };

    let next_applications = normalize_applications(&next_registry, next_applications);

    let duplicates_skipped = preview_duplicates(duplicates_found, duplicates);
    let mut summary = ImportSummary {
        mode,
        format: document.format,
        exported_at: document.exported_at,
        total_processed,
        total_imported,
        duplicates_skipped,
        resulting_total: next_applications.len(),
        message: String::new(),
    };
    summary.message = summary_message(&summary);

    Ok(Reconciled {
        registry: next_registry,
        applications: next_applications,
        summary,
    })
}

fn parse_document(raw: &[u8]) -> Result<ParsedDocument, AppError> {
    let value: Value =
        serde_json::from_slice(raw).map_err(|e| AppError::InvalidJson(e.to_string()))?;

    if !value.is_object() {
        return Err(AppError::MalformedDocument(
            "top-level JSON value must be an object".to_string(),
        ));
    }

    let standardized =
        value.pointer("/fileFormat/type").and_then(Value::as_str) == Some(EXPORT_TYPE);

    if standardized {
        let doc: StandardizedDocument =
            serde_json::from_value(value).map_err(|e| AppError::MalformedDocument(e.to_string()))?;
        let version = doc
            .file_format
            .version
            .unwrap_or_else(|| "unknown".to_string());
        Ok(ParsedDocument {
            format: DetectedFormat::Standardized { version },
            exported_at: doc.export_info.and_then(|info| info.export_date),
            settings: doc.settings,
            applications: doc.applications,
        })
    } else {
        let doc: LegacyDocument =
            serde_json::from_value(value).map_err(|e| AppError::MalformedDocument(e.to_string()))?;
        Ok(ParsedDocument {
            format: DetectedFormat::Legacy,
            exported_at: None,
            settings: doc.config,
            applications: doc.applications,
        })
    }
}

/// Build a registry from imported settings, restoring defaults for what is missing.
fn replace_settings(incoming: IncomingSettings) -> SchemaRegistry {
    let status_options = incoming.status_options.unwrap_or_else(|| {
        DEFAULT_STATUS_OPTIONS
            .iter()
            .map(|s| s.to_string())
            .collect()
    });

    SchemaRegistry {
        reference_writers: unique_strings(incoming.reference_writers.unwrap_or_default()),
        materials: unique_strings(incoming.materials.unwrap_or_default()),
        status_options: unique_strings(status_options),
        custom_fields: unique_by_id(incoming.custom_fields.unwrap_or_default(), |f: &CustomField| {
            f.id.clone()
        }),
        custom_checklists: unique_by_id(
            incoming.custom_checklists.unwrap_or_default(),
            |c: &CustomChecklist| c.id.clone(),
        ),
    }
}

fn unique_strings(values: Vec<String>) -> Vec<String> {
    unique_by_id(values, String::clone)
}

fn unique_by_id<T>(values: Vec<T>, key: impl Fn(&T) -> String) -> Vec<T> {
    let mut seen = std::collections::HashSet::new();
    values.into_iter().filter(|v| seen.insert(key(v))).collect()
}

/// Map an incoming record to the canonical shape. The carried id, if any,
/// is returned alongside; the record itself gets a placeholder id.
fn canonicalize(raw: IncomingApplication) -> (Option<i64>, Application) {
    let app = Application {
        id: 0,
        school: raw.school.unwrap_or_default(),
        position: raw.position.unwrap_or_default(),
        title: raw.title.unwrap_or_default(),
        location: raw.location.unwrap_or_default(),
        deadline: raw.deadline.unwrap_or_default(),
        status: raw
            .status
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| FALLBACK_STATUS.to_string()),
        contact: raw.contact.unwrap_or_default(),
        connections: raw.connections.unwrap_or_default(),
        link: raw.link.unwrap_or_default(),
        comments: raw.comments.unwrap_or_default(),
        num_refs: raw
            .num_refs
            .filter(|n| *n != 0)
            .unwrap_or(DEFAULT_NUM_REFS),
        refs: raw.refs.unwrap_or_default(),
        materials: raw.materials.unwrap_or_default(),
        custom_field_values: raw.custom_field_values.unwrap_or_default(),
        custom_checklist_values: raw.custom_checklist_values.unwrap_or_default(),
    };
    (raw.id, app)
}

/// Keep carried ids as they are; records without one are numbered after
/// the largest carried id, in input order.
fn assign_carried_ids(
    records: Vec<(Option<i64>, Application)>,
) -> Result<Vec<Application>, AppError> {
    let mut next = records
        .iter()
        .filter_map(|(id, _)| *id)
        .max()
        .unwrap_or(0);

    records
        .into_iter()
        .map(|(id, mut app)| {
            app.id = match id {
                Some(id) => id,
                None => {
                    next = next_id_after(next)?;
                    next
                }
            };
            Ok(app)
        })
        .collect()
}

fn next_id_after(id: i64) -> Result<i64, AppError> {
    id.checked_add(1).ok_or_else(|| {
        AppError::MalformedDocument(format!("no application id is left after {}", id))
    })
}

fn preview_duplicates(found: usize, details: Vec<DuplicateDetail>) -> DuplicatePreview {
    let shown: Vec<DuplicateDetail> = details.into_iter().take(DUPLICATE_PREVIEW_LIMIT).collect();
    DuplicatePreview {
        found,
        remaining: found.saturating_sub(shown.len()),
        shown,
    }
}

fn summary_message(summary: &ImportSummary) -> String {
    let adding = summary.mode == ImportMode::Add;

    let mut message = match &summary.format {
        DetectedFormat::Standardized { version } => {
            let mode_text = if adding {
                "added to existing data"
            } else {
                "replaced existing data"
            };
            let totals = if adding {
                format!(
                    "{} imported ({} total)",
                    summary.total_imported, summary.resulting_total
                )
            } else {
                summary.resulting_total.to_string()
            };
            let exported = summary
                .exported_at
                .as_deref()
                .and_then(|date| chrono::DateTime::parse_from_rfc3339(date).ok())
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            format!(
                "Data imported successfully! ({})\nFormat: {}\nApplications: {}\nExported: {}",
                mode_text, version, totals, exported
            )
        }
        DetectedFormat::Legacy => {
            let mode_text = if adding {
                " (added to existing data)"
            } else {
                ""
            };
            format!("Data imported successfully! (Legacy format{})", mode_text)
        }
    };

    let duplicates = &summary.duplicates_skipped;
    if adding && duplicates.found > 0 {
        message.push_str(&format!("\n\nDuplicates skipped: {}", duplicates.found));
        message.push_str(if duplicates.remaining > 0 {
            "\nFirst 3 skipped:"
        } else {
            "\nSkipped applications:"
        });
        for detail in &duplicates.shown {
            message.push_str(&format!("\n- {}: {}", detail.school, detail.position));
        }
        if duplicates.remaining > 0 {
            message.push_str(&format!("\n... and {} more", duplicates.remaining));
        }
    }

    message
}
