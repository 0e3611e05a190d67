//! Work item tracker backend: full-text search over work items.

pub mod app_state;
pub mod config;
pub mod domain;
pub mod repositories;
pub mod telemetry;

pub use app_state::{AppState, PgSearchService};
pub use domain::search::{KnownUrlRegistry, SearchError, SearchResultPage, SearchService};
