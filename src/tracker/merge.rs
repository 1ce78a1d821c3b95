//! Additive merge of imported settings into the local registry.

use crate::models::{IncomingSettings, SchemaRegistry};

/// Append incoming registry entries the local registry does not have yet.
///
/// Plain lists compare by value; custom fields and checklists compare by id,
/// and the local entry wins when ids collide. Nothing local is removed or
/// reordered.
pub fn merge_settings(registry: &mut SchemaRegistry, incoming: &IncomingSettings) {
    if let Some(writers) = &incoming.reference_writers {
        append_missing(&mut registry.reference_writers, writers);
    }
    if let Some(materials) = &incoming.materials {
        append_missing(&mut registry.materials, materials);
    }
    if let Some(statuses) = &incoming.status_options {
        append_missing(&mut registry.status_options, statuses);
    }

    if let Some(fields) = &incoming.custom_fields {
        for field in fields {
            if !registry.custom_fields.iter().any(|f| f.id == field.id) {
                registry.custom_fields.push(field.clone());
            }
        }
    }

    if let Some(checklists) = &incoming.custom_checklists {
        for checklist in checklists {
            if !registry.custom_checklists.iter().any(|c| c.id == checklist.id) {
                registry.custom_checklists.push(checklist.clone());
            }
        }
    }
}

fn append_missing(local: &mut Vec<String>, incoming: &[String]) {
    for value in incoming {
        if !local.contains(value) {
            local.push(value.clone());
        }
    }
}
