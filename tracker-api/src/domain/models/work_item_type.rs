use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{WorkItem, WorkItemStorage, SYSTEM_ORDER};
use crate::domain::ConversionError;

/// Separator between labels of a materialized type path.
pub const PATH_SEPARATOR: char = '.';

/// Definition of a single field on a work item type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub label: Option<String>,
}

/// A work item type.
///
/// Types form a tree. Each type carries its materialized `path`: the labels
/// of all its ancestors followed by its own label, joined by `.` (the same
/// representation the `ltree` column uses).
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItemType {
    pub id: Uuid,
    pub name: String,
    pub path: String,
    pub fields: HashMap<String, FieldDefinition>,
}

impl WorkItemType {
    /// Creates a root type.
    pub fn root(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            path: path_label(id),
            fields: HashMap::new(),
        }
    }

    /// Creates a type extending `parent`.
    pub fn extending(parent: &WorkItemType, id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            path: format!("{}{PATH_SEPARATOR}{}", parent.path, path_label(id)),
            fields: parent.fields.clone(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, definition: FieldDefinition) -> Self {
        self.fields.insert(name.into(), definition);
        self
    }

    /// Whether this type is `ancestor` itself or lies below it in the tree.
    pub fn is_descendant_or_self(&self, ancestor: &WorkItemType) -> bool {
        self.path == ancestor.path
            || self
                .path
                .strip_prefix(ancestor.path.as_str())
                .is_some_and(|rest| rest.starts_with(PATH_SEPARATOR))
    }

    /// Converts a stored row of this type into its domain representation.
    pub fn convert_storage(&self, storage: WorkItemStorage) -> Result<WorkItem, ConversionError> {
        if storage.type_id != self.id {
            return Err(ConversionError::new(format!(
                "work item {} has type {} but was converted with type {}",
                storage.id, storage.type_id, self.id
            )));
        }

        let id = u64::try_from(storage.id).map_err(|_| {
            ConversionError::new(format!("work item ID {} is negative", storage.id))
        })?;

        let mut fields = storage.fields.0;
        for (name, definition) in &self.fields {
            let missing = fields.get(name).map_or(true, Value::is_null);
            if definition.required && missing {
                return Err(ConversionError::new(format!(
                    "work item {id} of type '{}' is missing required field '{name}'",
                    self.name
                )));
            }
        }
        fields.insert(SYSTEM_ORDER.to_string(), Value::from(storage.execution_order));

        Ok(WorkItem {
            id,
            type_id: storage.type_id,
            space_id: storage.space_id,
            version: storage.version,
            fields,
            created_at: storage.created_at,
            updated_at: storage.updated_at,
        })
    }
}

/// The `ltree` label for a type ID (`-` is not a valid label character).
pub fn path_label(id: Uuid) -> String {
    id.simple().to_string()
}
