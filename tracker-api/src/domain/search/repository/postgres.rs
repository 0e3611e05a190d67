//! PostgreSQL store running compiled queries against the `tsv` column.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::models::WorkItemStorage;
use crate::domain::search::traits::{Result, WorkItemStore};
use crate::domain::search::types::{StorePage, StoreQuery};

/// Text search configuration used when none is configured.
pub const DEFAULT_TEXT_SEARCH_CONFIG: &str = "english";

/// PostgreSQL-backed work item store.
///
/// Matches `work_items.tsv` against `to_tsquery`, ranks with `ts_rank` and
/// computes the total match count with a window function in the same query.
#[derive(Clone)]
pub struct PgWorkItemStore {
    pool: PgPool,
    text_search_config: String,
}

impl PgWorkItemStore {
    pub fn new(pool: PgPool) -> Self {
        Self::with_text_search_config(pool, DEFAULT_TEXT_SEARCH_CONFIG)
    }

    pub fn with_text_search_config(pool: PgPool, text_search_config: impl Into<String>) -> Self {
        Self {
            pool,
            text_search_config: text_search_config.into(),
        }
    }

    fn build_query(&self, query: &StoreQuery) -> QueryBuilder<'static, Postgres> {
        build_search_query(&self.text_search_config, query)
    }
}

fn build_search_query(
    text_search_config: &str,
    query: &StoreQuery,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(
        r#"SELECT count(*) OVER () AS total_count,
            wi.id, wi.type, wi.version, wi.fields, wi.execution_order,
            wi.space_id, wi.created_at, wi.updated_at
        FROM work_items wi, to_tsquery("#,
    );
    builder
        .push_bind(text_search_config.to_string())
        .push("::regconfig, ")
        .push_bind(query.expression.as_str().to_string())
        .push(") AS query, ts_rank(wi.tsv, query) AS rank")
        .push(" WHERE wi.tsv @@ query AND wi.deleted_at IS NULL");

    if let Some(scope) = &query.type_scope {
        let type_ids: Vec<Uuid> = scope.iter().copied().collect();
        builder.push(" AND wi.type = ANY(").push_bind(type_ids).push(")");
    }
    if let Some(space_id) = query.space_id {
        builder.push(" AND wi.space_id = ").push_bind(space_id);
    }

    builder.push(" ORDER BY rank DESC, wi.updated_at DESC");

    if let Some(offset) = query.pagination.offset {
        builder.push(" OFFSET ").push_bind(offset);
    }
    if let Some(limit) = query.pagination.limit {
        builder.push(" LIMIT ").push_bind(limit);
    }

    builder
}

#[async_trait]
impl WorkItemStore for PgWorkItemStore {
    async fn search(&self, query: &StoreQuery) -> Result<StorePage> {
        let mut builder = self.build_query(query);
        let rows: Vec<SearchRow> = builder.build_query_as().fetch_all(&self.pool).await?;

        // every row carries the same windowed count; an empty page has none
        let total_count = rows
            .first()
            .map(|row| u64::try_from(row.total_count).unwrap_or_default())
            .unwrap_or(0);

        Ok(StorePage {
            rows: rows.into_iter().map(|row| row.work_item).collect(),
            total_count,
        })
    }
}

// Row types for sqlx queries

#[derive(sqlx::FromRow)]
struct SearchRow {
    total_count: i64,
    #[sqlx(flatten)]
    work_item: WorkItemStorage,
}
