use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use time::OffsetDateTime;
use uuid::Uuid;

/// Field values of a work item, keyed by field name (e.g. `system.title`).
pub type Fields = Map<String, Value>;

/// Well-known field names.
pub const SYSTEM_TITLE: &str = "system.title";
pub const SYSTEM_DESCRIPTION: &str = "system.description";
pub const SYSTEM_STATE: &str = "system.state";
pub const SYSTEM_ORDER: &str = "system.order";

/// A work item as it is stored in the `work_items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WorkItemStorage {
    pub id: i64,
    /// ID of the work item type
    #[sqlx(rename = "type")]
    pub type_id: Uuid,
    /// Version for optimistic concurrency control
    pub version: i32,
    pub fields: Json<Fields>,
    /// Position of the work item within its space
    pub execution_order: f64,
    pub space_id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Domain representation of a work item.
///
/// Built from a [`WorkItemStorage`] row by its [`WorkItemType`](super::WorkItemType).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: u64,
    pub type_id: Uuid,
    pub space_id: Uuid,
    pub version: i32,
    pub fields: Fields,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl WorkItem {
    pub fn title(&self) -> Option<&str> {
        self.fields.get(SYSTEM_TITLE).and_then(Value::as_str)
    }

    pub fn order(&self) -> Option<f64> {
        self.fields.get(SYSTEM_ORDER).and_then(Value::as_f64)
    }
}
