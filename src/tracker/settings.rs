//! Editing operations on the schema registry.
//!
//! Each operation validates against the registry's uniqueness rules and
//! mutates it in place. Callers re-normalize applications afterwards.

use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{CustomChecklist, CustomField, FieldType, RegistryList, SchemaRegistry};

/// Request body for adding or renaming a plain registry entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryEntryRequest {
    pub value: String,
}

/// Request body for a new custom field.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCustomFieldRequest {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
}

/// Request body for a new custom checklist.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateChecklistRequest {
    pub name: String,
    #[serde(default)]
    pub items: Vec<String>,
}

/// Lowercase `raw` and collapse each whitespace run into `separator`.
pub fn to_key(raw: &str, separator: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(separator)
}

fn entry_key(list: RegistryList, raw: &str) -> Result<String, AppError> {
    let key = to_key(raw, list.key_separator());
    if key.is_empty() {
        return Err(AppError::Validation(format!(
            "A value is required for {}",
            list.as_str()
        )));
    }
    Ok(key)
}

pub fn add_entry(
    registry: &mut SchemaRegistry,
    list: RegistryList,
    raw: &str,
) -> Result<String, AppError> {
    let key = entry_key(list, raw)?;
    let entries = list.get_mut(registry);
    if entries.contains(&key) {
        return Err(AppError::Validation(format!(
            "'{}' already exists in {}",
            key,
            list.as_str()
        )));
    }
    entries.push(key.clone());
    Ok(key)
}

pub fn rename_entry(
    registry: &mut SchemaRegistry,
    list: RegistryList,
    index: usize,
    raw: &str,
) -> Result<String, AppError> {
    let key = entry_key(list, raw)?;
    let entries = list.get_mut(registry);
    if index >= entries.len() {
        return Err(entry_not_found(list, index));
    }
    if entries
        .iter()
        .enumerate()
        .any(|(i, existing)| i != index && *existing == key)
    {
        return Err(AppError::Validation(format!(
            "'{}' already exists in {}",
            key,
            list.as_str()
        )));
    }
    entries[index] = key.clone();
    Ok(key)
}

pub fn remove_entry(
    registry: &mut SchemaRegistry,
    list: RegistryList,
    index: usize,
) -> Result<String, AppError> {
    let entries = list.get_mut(registry);
    if index >= entries.len() {
        return Err(entry_not_found(list, index));
    }
    Ok(entries.remove(index))
}

fn entry_not_found(list: RegistryList, index: usize) -> AppError {
    AppError::NotFound(format!("No entry {} in {}", index, list.as_str()))
}

pub fn add_custom_field(
    registry: &mut SchemaRegistry,
    request: &CreateCustomFieldRequest,
) -> Result<CustomField, AppError> {
    let name = request.name.trim();
    let id = to_key(name, "_");
    if id.is_empty() {
        return Err(AppError::Validation(
            "Custom field name is required".to_string(),
        ));
    }
    if registry.custom_fields.iter().any(|f| f.id == id) {
        return Err(AppError::Validation(format!(
            "Custom field '{}' already exists",
            id
        )));
    }

    let field = CustomField {
        id,
        name: name.to_string(),
        field_type: request.field_type,
    };
    registry.custom_fields.push(field.clone());
    Ok(field)
}

pub fn remove_custom_field(registry: &mut SchemaRegistry, id: &str) -> Result<(), AppError> {
    let before = registry.custom_fields.len();
    registry.custom_fields.retain(|f| f.id != id);
    if registry.custom_fields.len() == before {
        return Err(AppError::NotFound(format!("Custom field {} not found", id)));
    }
    Ok(())
}

pub fn add_custom_checklist(
    registry: &mut SchemaRegistry,
    request: &CreateChecklistRequest,
) -> Result<CustomChecklist, AppError> {
    let name = request.name.trim();
    let id = to_key(name, "_");
    if id.is_empty() {
        return Err(AppError::Validation("Checklist name is required".to_string()));
    }
    if registry.custom_checklists.iter().any(|c| c.id == id) {
        return Err(AppError::Validation(format!(
            "Checklist '{}' already exists",
            id
        )));
    }

    let mut items: Vec<String> = Vec::new();
    for item in request.items.iter().map(|i| i.trim()).filter(|i| !i.is_empty()) {
        if !items.iter().any(|existing| existing == item) {
            items.push(item.to_string());
        }
    }
    if items.is_empty() {
        return Err(AppError::Validation(
            "A checklist needs at least one item".to_string(),
        ));
    }

    let checklist = CustomChecklist {
        id,
        name: name.to_string(),
        items,
    };
    registry.custom_checklists.push(checklist.clone());
    Ok(checklist)
}

pub fn remove_custom_checklist(registry: &mut SchemaRegistry, id: &str) -> Result<(), AppError> {
    let before = registry.custom_checklists.len();
    registry.custom_checklists.retain(|c| c.id != id);
    if registry.custom_checklists.len() == before {
        return Err(AppError::NotFound(format!("Checklist {} not found", id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_key() {
        assert_eq!(to_key("  Jane   Doe ", "_"), "jane_doe");
        assert_eq!(to_key("Under Review", "-"), "under-review");
        assert_eq!(to_key("   ", "_"), "");
    }

    #[test]
    fn test_add_entry_normalizes_and_rejects_duplicates() {
        let mut registry = SchemaRegistry::default();
        let key = add_entry(&mut registry, RegistryList::StatusOptions, "On Hold").unwrap();
        assert_eq!(key, "on-hold");
        assert_eq!(registry.status_options.last().unwrap(), "on-hold");

        let err = add_entry(&mut registry, RegistryList::ReferenceWriters, "Henrich").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = add_entry(&mut registry, RegistryList::Materials, "  ").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_rename_and_remove_entry() {
        let mut registry = SchemaRegistry::default();
        rename_entry(&mut registry, RegistryList::Materials, 0, "Cover Letter").unwrap();
        assert_eq!(registry.materials[0], "cover_letter");

        // renaming to its own value is allowed
        rename_entry(&mut registry, RegistryList::Materials, 0, "cover_letter").unwrap();

        let err = rename_entry(&mut registry, RegistryList::Materials, 0, "cv").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let removed = remove_entry(&mut registry, RegistryList::Materials, 1).unwrap();
        assert_eq!(removed, "cv");
        assert!(matches!(
            remove_entry(&mut registry, RegistryList::Materials, 50),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_custom_field_lifecycle() {
        let mut registry = SchemaRegistry::default();
        let request = CreateCustomFieldRequest {
            name: "Application Portal".into(),
            field_type: FieldType::Url,
        };
        let field = add_custom_field(&mut registry, &request).unwrap();
        assert_eq!(field.id, "application_portal");
        assert_eq!(field.name, "Application Portal");

        assert!(add_custom_field(&mut registry, &request).is_err());
        remove_custom_field(&mut registry, "application_portal").unwrap();
        assert!(remove_custom_field(&mut registry, "application_portal").is_err());
    }

    #[test]
    fn test_checklist_requires_items() {
        let mut registry = SchemaRegistry::default();
        let empty = CreateChecklistRequest {
            name: "Visa".into(),
            items: vec!["  ".into()],
        };
        assert!(add_custom_checklist(&mut registry, &empty).is_err());

        let request = CreateChecklistRequest {
            name: "Visa Docs".into(),
            items: vec![" form ".into(), "".into(), "photo".into(), "form".into()],
        };
        let checklist = add_custom_checklist(&mut registry, &request).unwrap();
        assert_eq!(checklist.id, "visa_docs");
        assert_eq!(checklist.items, vec!["form", "photo"]);
    }
}
