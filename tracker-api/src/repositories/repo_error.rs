use thiserror::Error;

use crate::domain::search::SearchError;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<RepositoryError> for SearchError {
    fn from(e: RepositoryError) -> Self {
        SearchError::InternalError(e.to_string())
    }
}
