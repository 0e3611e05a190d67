//! Core types for the search domain.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use super::traits::{Result, SearchError};
use crate::domain::models::{WorkItem, WorkItemStorage};

/// One classified token of a raw search string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchToken {
    /// From an `id:` prefixed token.
    IdFilter { value: String },
    /// From a `type:` prefixed token.
    TypeFilter { type_id: Uuid },
    /// From a plain word or a decomposed URL.
    WordFragment { query_fragment: String },
}

/// Search string split into its filter and text parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Restrict results to these types and their descendants
    pub type_filters: HashSet<Uuid>,
    /// Lexeme fragments built from `id:` tokens
    pub id_fragments: Vec<String>,
    /// Lexeme fragments built from words and URLs
    pub word_fragments: Vec<String>,
}

impl ParsedQuery {
    pub fn push(&mut self, token: SearchToken) {
        match token {
            SearchToken::IdFilter { value } => self.id_fragments.push(value),
            SearchToken::TypeFilter { type_id } => {
                self.type_filters.insert(type_id);
            }
            SearchToken::WordFragment { query_fragment } => {
                self.word_fragments.push(query_fragment)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.type_filters.is_empty()
            && self.id_fragments.is_empty()
            && self.word_fragments.is_empty()
    }
}

/// A boolean lexeme expression in `tsquery` syntax.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledQuery(String);

impl CompiledQuery {
    pub fn new(expression: impl Into<String>) -> Self {
        Self(expression.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Offset/limit pagination. `None` means "not restricted".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn new(offset: Option<i64>, limit: Option<i64>) -> Self {
        Self { offset, limit }
    }

    /// Rejects a negative offset and a non-positive limit.
    pub fn validate(&self) -> Result<()> {
        if let Some(offset) = self.offset.filter(|offset| *offset < 0) {
            return Err(SearchError::bad_parameter("offset", offset));
        }
        if let Some(limit) = self.limit.filter(|limit| *limit <= 0) {
            return Err(SearchError::bad_parameter("limit", limit));
        }
        Ok(())
    }
}

/// A fully resolved query handed to a [`WorkItemStore`](super::traits::WorkItemStore).
#[derive(Debug, Clone, PartialEq)]
pub struct StoreQuery {
    pub expression: CompiledQuery,
    /// Allowed type IDs, already expanded to include descendant types
    pub type_scope: Option<HashSet<Uuid>>,
    pub space_id: Option<Uuid>,
    pub pagination: Pagination,
}

/// Raw rows returned by a store together with the windowed match count.
#[derive(Debug, Clone, Default)]
pub struct StorePage {
    pub rows: Vec<WorkItemStorage>,
    pub total_count: u64,
}

/// One page of search results.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultPage {
    pub items: Vec<WorkItem>,
    /// Number of matching work items before pagination
    pub total_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_accepts_unrestricted_and_valid_values() {
        assert!(Pagination::default().validate().is_ok());
        assert!(Pagination::new(Some(0), Some(1)).validate().is_ok());
    }

    #[test]
    fn pagination_rejects_negative_offset() {
        let err = Pagination::new(Some(-1), None).validate().unwrap_err();
        assert!(
            matches!(err, SearchError::BadParameter { ref parameter, .. } if parameter == "offset")
        );
    }

    #[test]
    fn pagination_rejects_non_positive_limit() {
        let err = Pagination::new(None, Some(0)).validate().unwrap_err();
        assert!(
            matches!(err, SearchError::BadParameter { ref parameter, .. } if parameter == "limit")
        );
    }

    #[test]
    fn parsed_query_collects_tokens_by_kind() {
        let type_id = Uuid::new_v4();
        let mut parsed = ParsedQuery::default();
        assert!(parsed.is_empty());

        parsed.push(SearchToken::IdFilter { value: "1:*A".to_string() });
        parsed.push(SearchToken::TypeFilter { type_id });
        parsed.push(SearchToken::TypeFilter { type_id });
        parsed.push(SearchToken::WordFragment { query_fragment: "a:*".to_string() });

        assert_eq!(parsed.id_fragments, vec!["1:*A"]);
        assert_eq!(parsed.word_fragments, vec!["a:*"]);
        assert_eq!(parsed.type_filters.len(), 1);
    }
}
