use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use moka::sync::Cache;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::models::{FieldDefinition, WorkItem, WorkItemStorage, WorkItemType};
use crate::domain::search::{self, TypeHierarchy, WorkItemConverter};

use super::repo_error::RepositoryError;

/// Number of work item types kept in memory.
const DEFAULT_CACHE_CAPACITY: u64 = 1024;

pub trait WorkItemTypeRepository {
    async fn load(&self, id: Uuid) -> Result<WorkItemType, RepositoryError>;
    async fn descendant_ids(&self, ids: &[Uuid]) -> Result<HashSet<Uuid>, RepositoryError>;
}

/// Work item types stored in `work_item_types`, whose `path` column is an
/// `ltree` of type ID labels.
///
/// Loaded types are cached; cloning the repository shares the cache.
#[derive(Clone)]
pub struct WorkItemTypeRepositoryImpl {
    pool: PgPool,
    cache: Cache<Uuid, WorkItemType>,
}

impl WorkItemTypeRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self::with_cache_capacity(pool, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(pool: PgPool, capacity: u64) -> Self {
        Self {
            pool,
            cache: Cache::new(capacity),
        }
    }

    /// Drops all cached types, e.g. after type definitions changed.
    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
    }
}

#[derive(sqlx::FromRow)]
struct WorkItemTypeRow {
    id: Uuid,
    name: String,
    path: String,
    fields: Json<HashMap<String, FieldDefinition>>,
}

impl From<WorkItemTypeRow> for WorkItemType {
    fn from(row: WorkItemTypeRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            path: row.path,
            fields: row.fields.0,
        }
    }
}

impl WorkItemTypeRepository for WorkItemTypeRepositoryImpl {
    async fn load(&self, id: Uuid) -> Result<WorkItemType, RepositoryError> {
        if let Some(wit) = self.cache.get(&id) {
            return Ok(wit);
        }

        let row = sqlx::query_as::<_, WorkItemTypeRow>(
            r#"
            SELECT id, name, path::text AS path, fields
            FROM work_item_types
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("work item type {id}")))?;

        let wit = WorkItemType::from(row);
        self.cache.insert(id, wit.clone());
        Ok(wit)
    }

    async fn descendant_ids(&self, ids: &[Uuid]) -> Result<HashSet<Uuid>, RepositoryError> {
        let subtypes = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT DISTINCT subtype.id
            FROM work_item_types subtype
            JOIN work_item_types supertype ON subtype.path <@ supertype.path
            WHERE supertype.id = ANY($1)
              AND subtype.deleted_at IS NULL
            "#,
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(subtypes.into_iter().collect())
    }
}

#[async_trait]
impl TypeHierarchy for WorkItemTypeRepositoryImpl {
    async fn descendants_or_self(&self, type_ids: &[Uuid]) -> search::Result<HashSet<Uuid>> {
        Ok(self.descendant_ids(type_ids).await?)
    }
}

#[async_trait]
impl WorkItemConverter for WorkItemTypeRepositoryImpl {
    async fn convert(&self, row: WorkItemStorage) -> search::Result<WorkItem> {
        let wit = self.load(row.type_id).await?;
        Ok(wit.convert_storage(row)?)
    }
}
