//! Search service compiling user queries and running them against the store.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument};
use uuid::Uuid;

use super::assembler::assemble;
use super::known_url::{KnownUrlError, KnownUrlRegistry};
use super::parser::tokenize;
use super::traits::{Result, SearchError, TypeHierarchy, WorkItemConverter, WorkItemStore};
use super::types::{Pagination, ParsedQuery, SearchResultPage, StoreQuery};

/// Configuration for the search service.
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    /// Abort store round trips that take longer than this
    pub query_timeout: Option<Duration>,
}

/// Full-text search over work items.
///
/// # Type Parameters
///
/// * `S` - WorkItemStore executing compiled queries
/// * `H` - TypeHierarchy resolving `type:` filters to type subtrees
/// * `C` - WorkItemConverter turning stored rows into work items
///
/// # Examples
///
/// ```ignore
/// let config = SearchConfig::default();
/// let service = SearchService::new(store, types.clone(), types, registry, config);
/// let page = service.search_full_text("crash type:<uuid>", None, Some(20), None).await?;
/// ```
pub struct SearchService<S, H, C>
where
    S: WorkItemStore,
    H: TypeHierarchy,
    C: WorkItemConverter,
{
    store: S,
    hierarchy: H,
    converter: C,
    known_urls: Arc<KnownUrlRegistry>,
    config: SearchConfig,
}

impl<S, H, C> SearchService<S, H, C>
where
    S: WorkItemStore,
    H: TypeHierarchy,
    C: WorkItemConverter,
{
    /// Create a new search service.
    pub fn new(
        store: S,
        hierarchy: H,
        converter: C,
        known_urls: Arc<KnownUrlRegistry>,
        config: SearchConfig,
    ) -> Self {
        Self {
            store,
            hierarchy,
            converter,
            known_urls,
            config,
        }
    }

    pub fn known_urls(&self) -> &KnownUrlRegistry {
        &self.known_urls
    }

    /// Register an additional known URL pattern.
    pub fn register_known_url(
        &self,
        name: &str,
        pattern: &str,
    ) -> std::result::Result<(), KnownUrlError> {
        self.known_urls.register(name, pattern)
    }

    /// Execute a raw user search.
    ///
    /// # Arguments
    ///
    /// * `raw_query` - Free-form search string (words, URLs, `id:` and `type:` tokens)
    /// * `offset` - Number of matching items to skip; must not be negative
    /// * `limit` - Maximum number of items to return; must be positive
    /// * `space_id` - Restrict results to one space
    ///
    /// # Returns
    ///
    /// Items ordered by descending rank, then by most recent update, and the
    /// number of matching items before pagination.
    #[instrument(name = "search_full_text", skip(self))]
    pub async fn search_full_text(
        &self,
        raw_query: &str,
        offset: Option<i64>,
        limit: Option<i64>,
        space_id: Option<&str>,
    ) -> Result<SearchResultPage> {
        let parsed = tokenize(raw_query, &self.known_urls)?;

        let space_id = space_id
            .map(|id| Uuid::parse_str(id).map_err(|_| SearchError::bad_parameter("space_id", id)))
            .transpose()?;

        self.search(&parsed, Pagination::new(offset, limit), space_id).await
    }

    /// Execute an already tokenized query.
    pub async fn search(
        &self,
        parsed: &ParsedQuery,
        pagination: Pagination,
        space_id: Option<Uuid>,
    ) -> Result<SearchResultPage> {
        pagination.validate()?;

        let expression = assemble(parsed);
        if expression.is_empty() {
            debug!("Empty search expression, skipping store");
            return Ok(SearchResultPage::default());
        }

        let type_scope = if parsed.type_filters.is_empty() {
            None
        } else {
            let type_ids: Vec<Uuid> = parsed.type_filters.iter().copied().collect();
            let scope = self.hierarchy.descendants_or_self(&type_ids).await?;
            if scope.is_empty() {
                debug!(?type_ids, "No known types in filter, nothing can match");
                return Ok(SearchResultPage::default());
            }
            Some(scope)
        };

        let query = StoreQuery {
            expression,
            type_scope,
            space_id,
            pagination,
        };
        debug!(expression = %query.expression, "Running full-text search");

        let page = match self.config.query_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.store.search(&query))
                .await
                .map_err(|_| {
                    SearchError::internal(format!(
                        "search query exceeded {} ms",
                        timeout.as_millis()
                    ))
                })??,
            None => self.store.search(&query).await?,
        };

        let mut items = Vec::with_capacity(page.rows.len());
        for row in page.rows {
            items.push(self.converter.convert(row).await?);
        }

        debug!(returned = items.len(), total = page.total_count, "Search finished");
        Ok(SearchResultPage {
            items,
            total_count: page.total_count,
        })
    }
}
