//! Full-text search over work items.
//!
//! A raw search string goes through these steps:
//!
//! 1. [`tokenize`] splits it into `id:` filters, `type:` filters and word
//!    fragments. URLs the tracker itself produces are recognised through the
//!    [`KnownUrlRegistry`] and decomposed so that a pasted link finds the item
//!    it points to.
//! 2. [`assemble`] joins the fragments into one PostgreSQL `tsquery`.
//! 3. [`SearchService`] restricts the query to type subtrees and a space,
//!    runs it through a [`WorkItemStore`], and converts the rows into
//!    [`WorkItem`](crate::domain::models::WorkItem)s.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tracker_api::domain::search::{KnownUrlRegistry, SearchConfig, SearchService};
//! use tracker_api::domain::search::repository::PgWorkItemStore;
//! use tracker_api::repositories::WorkItemTypeRepositoryImpl;
//!
//! let types = WorkItemTypeRepositoryImpl::new(pool.clone());
//! let service = SearchService::new(
//!     PgWorkItemStore::new(pool),
//!     types.clone(),
//!     types,
//!     Arc::new(KnownUrlRegistry::with_defaults()),
//!     SearchConfig::default(),
//! );
//!
//! let page = service.search_full_text("login crash", None, Some(20), None).await?;
//! ```
//!
//! # Query Syntax
//!
//! - `"crash"` → `crash:*`
//! - `"id:42"` → `42:*A`
//! - `"type:<uuid>"` → items of that type or any of its subtypes
//! - `"demo.almighty.io/work-item/list/detail/500"` →
//!   `(500:* | demo.almighty.io/work-item/list/detail/500:*)`

mod assembler;
mod decomposer;
mod known_url;
mod parser;
mod service;
mod traits;
mod types;

pub mod repository;

pub use assembler::assemble;
pub use decomposer::{
    decompose, decompose_with, escape_lexeme, sanitize_generic_url, trim_protocol,
    url_to_query_fragment, PREFIX_MATCH,
};
pub use known_url::{
    KnownUrl, KnownUrlError, KnownUrlMatch, KnownUrlRegistry, WORK_ITEM_BOARD_DETAILS,
    WORK_ITEM_LIST_DETAILS,
};
pub use parser::{classify, is_url, query_unescape, tokenize, UnescapeError};
pub use service::{SearchConfig, SearchService};
pub use traits::{Result, SearchError, TypeHierarchy, WorkItemConverter, WorkItemStore};
pub use types::{
    CompiledQuery, Pagination, ParsedQuery, SearchResultPage, SearchToken, StorePage, StoreQuery,
};
