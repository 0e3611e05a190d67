use std::sync::Arc;

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::{SearchSettings, Settings};
use crate::domain::search::repository::PgWorkItemStore;
use crate::domain::search::{KnownUrlError, KnownUrlRegistry, SearchConfig, SearchService};
use crate::repositories::WorkItemTypeRepositoryImpl;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Search service wired to PostgreSQL.
pub type PgSearchService =
    SearchService<PgWorkItemStore, WorkItemTypeRepositoryImpl, WorkItemTypeRepositoryImpl>;

#[derive(Debug, thiserror::Error)]
pub enum AppStateError {
    #[error("Failed to register known URL: {0}")]
    KnownUrl(#[from] KnownUrlError),
    #[error("Failed to run migrations: {0}")]
    Migration(#[from] MigrateError),
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    search_service: Arc<PgSearchService>,
}

impl AppState {
    /// Builds the state from settings. The pool connects lazily, so this
    /// does not touch the database.
    pub fn new(settings: &Settings) -> Result<Self, AppStateError> {
        let db_pool = PgPoolOptions::new().connect_lazy_with(settings.database.with_db());
        Self::with_pool(db_pool, &settings.search)
    }

    pub fn with_pool(db_pool: PgPool, settings: &SearchSettings) -> Result<Self, AppStateError> {
        let known_urls = Arc::new(build_known_url_registry(settings)?);
        let types = WorkItemTypeRepositoryImpl::new(db_pool.clone());
        let store =
            PgWorkItemStore::with_text_search_config(db_pool.clone(), &settings.text_search_config);

        let search_service = SearchService::new(
            store,
            types.clone(),
            types,
            known_urls,
            SearchConfig {
                query_timeout: settings.query_timeout(),
            },
        );

        Ok(Self {
            db_pool,
            search_service: Arc::new(search_service),
        })
    }

    pub fn search_service(&self) -> &PgSearchService {
        &self.search_service
    }

    pub async fn run_migrations(&self) -> Result<(), AppStateError> {
        MIGRATOR.run(&self.db_pool).await?;
        info!("Database migrations applied");
        Ok(())
    }
}

/// The built-in known URLs followed by the configured ones.
pub fn build_known_url_registry(
    settings: &SearchSettings,
) -> Result<KnownUrlRegistry, KnownUrlError> {
    let registry = KnownUrlRegistry::with_defaults();
    for known_url in &settings.known_urls {
        registry.register(&known_url.name, &known_url.pattern)?;
    }
    Ok(registry)
}
