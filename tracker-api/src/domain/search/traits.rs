//! Trait definitions for the collaborators of the search executor.
//!
//! These traits enable dependency injection and easy testing through mocking.

use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;

use super::types::{StorePage, StoreQuery};
use crate::domain::models::{WorkItem, WorkItemStorage};
use crate::domain::ConversionError;

/// Error type for search operations.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Bad value for parameter '{parameter}': '{value}'")]
    BadParameter { parameter: String, value: String },

    #[error("Conversion error: {0}")]
    ConversionError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl SearchError {
    pub fn bad_parameter(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::BadParameter {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }
}

impl From<sqlx::Error> for SearchError {
    fn from(e: sqlx::Error) -> Self {
        SearchError::InternalError(e.to_string())
    }
}

impl From<ConversionError> for SearchError {
    fn from(e: ConversionError) -> Self {
        SearchError::ConversionError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;

/// Executes compiled full-text queries against the work item store.
#[async_trait]
pub trait WorkItemStore: Send + Sync {
    /// Returns one page of matching rows, ordered by descending rank and then
    /// descending last-modified time, together with the number of rows that
    /// matched before pagination.
    async fn search(&self, query: &StoreQuery) -> Result<StorePage>;
}

/// Lookup into the work item type tree.
#[async_trait]
pub trait TypeHierarchy: Send + Sync {
    /// Returns the given type IDs together with the IDs of all their
    /// descendant types. Unknown IDs contribute nothing.
    async fn descendants_or_self(&self, type_ids: &[Uuid]) -> Result<HashSet<Uuid>>;
}

/// Turns stored rows into domain work items, using the row's type.
#[async_trait]
pub trait WorkItemConverter: Send + Sync {
    async fn convert(&self, row: WorkItemStorage) -> Result<WorkItem>;
}
