//! Schema registry: the user-configurable extension points of an application record.

use serde::{Deserialize, Serialize};

/// Status used when neither the record nor the registry provides one.
pub const FALLBACK_STATUS: &str = "pending";

/// Statuses restored when a replace-mode import carries none.
pub const DEFAULT_STATUS_OPTIONS: [&str; 3] = ["pending", "in-progress", "submitted"];

const DEFAULT_WRITERS: [&str; 6] = [
    "henrich", "sandor", "farbod", "hoffman", "leiblich", "branden",
];
const DEFAULT_MATERIALS: [&str; 6] = ["cover", "cv", "research", "teaching", "diversity", "pubs"];

/// Input type rendered for a custom field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Textarea,
    Date,
    Url,
}

/// A free-text field added to every application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomField {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
}

/// A named group of tri-state items added to every application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomChecklist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub items: Vec<String>,
}

/// The single registry instance owned by the tracker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRegistry {
    pub reference_writers: Vec<String>,
    pub materials: Vec<String>,
    pub status_options: Vec<String>,
    pub custom_fields: Vec<CustomField>,
    pub custom_checklists: Vec<CustomChecklist>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self {
            reference_writers: DEFAULT_WRITERS.iter().map(|s| s.to_string()).collect(),
            materials: DEFAULT_MATERIALS.iter().map(|s| s.to_string()).collect(),
            status_options: DEFAULT_STATUS_OPTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            custom_fields: Vec::new(),
            custom_checklists: Vec::new(),
        }
    }
}

impl SchemaRegistry {
    #[cfg(test)]
    pub fn empty() -> Self {
        Self {
            reference_writers: Vec::new(),
            materials: Vec::new(),
            status_options: Vec::new(),
            custom_fields: Vec::new(),
            custom_checklists: Vec::new(),
        }
    }

    /// Status assigned to new records.
    pub fn default_status(&self) -> &str {
        self.status_options
            .first()
            .map(String::as_str)
            .unwrap_or(FALLBACK_STATUS)
    }

    pub fn has_status(&self, status: &str) -> bool {
        self.status_options.iter().any(|s| s == status)
    }

    pub fn checklist(&self, id: &str) -> Option<&CustomChecklist> {
        self.custom_checklists.iter().find(|c| c.id == id)
    }
}

/// Which of the three plain string lists an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegistryList {
    ReferenceWriters,
    Materials,
    StatusOptions,
}

impl RegistryList {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryList::ReferenceWriters => "referenceWriters",
            RegistryList::Materials => "materials",
            RegistryList::StatusOptions => "statusOptions",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "referenceWriters" => Some(RegistryList::ReferenceWriters),
            "materials" => Some(RegistryList::Materials),
            "statusOptions" => Some(RegistryList::StatusOptions),
            _ => None,
        }
    }

    /// Separator that replaces whitespace when a new key is entered.
    pub fn key_separator(&self) -> &'static str {
        match self {
            RegistryList::StatusOptions => "-",
            _ => "_",
        }
    }

    pub fn get_mut<'a>(&self, registry: &'a mut SchemaRegistry) -> &'a mut Vec<String> {
        match self {
            RegistryList::ReferenceWriters => &mut registry.reference_writers,
            RegistryList::Materials => &mut registry.materials,
            RegistryList::StatusOptions => &mut registry.status_options,
        }
    }
}
