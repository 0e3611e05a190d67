//! Work item store implementations.

#[cfg(test)]
mod mock;
mod postgres;

#[cfg(test)]
pub use mock::{MockTypeCatalog, MockWorkItemStore};
pub use postgres::{PgWorkItemStore, DEFAULT_TEXT_SEARCH_CONFIG};
