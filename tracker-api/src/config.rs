use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use serde_with::serde_as;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use strum::{Display, EnumString};

use crate::domain::search::repository::DEFAULT_TEXT_SEARCH_CONFIG;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub database: DatabaseSettings,
    #[serde(default)]
    pub search: SearchSettings,
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub port: u16,
    pub host: String,
    pub database_name: String,
    pub require_ssl: bool,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SearchSettings {
    /// PostgreSQL text search configuration used by `to_tsquery`. Must match
    /// the configuration the `work_items.tsv` column is generated with
    /// (`english` in the migrations), otherwise query lexemes are stemmed
    /// differently from indexed ones.
    #[serde(default = "default_text_search_config")]
    pub text_search_config: String,
    #[serde(default)]
    pub query_timeout_ms: Option<u64>,
    /// Extra known URL patterns, registered after the built-in ones
    #[serde(default)]
    pub known_urls: Vec<KnownUrlSettings>,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct KnownUrlSettings {
    pub name: String,
    pub pattern: String,
}

fn default_text_search_config() -> String {
    DEFAULT_TEXT_SEARCH_CONFIG.to_string()
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            text_search_config: default_text_search_config(),
            query_timeout_ms: None,
            known_urls: Vec::new(),
        }
    }
}

impl SearchSettings {
    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_ms.map(Duration::from_millis)
    }
}

impl DatabaseSettings {
    pub fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
            .ssl_mode(ssl_mode)
    }

    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db().database(&self.database_name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to determine the current directory: {0}")]
    CurrentDir(#[from] std::io::Error),
    #[error("Failed to parse APP_ENVIRONMENT: {0}")]
    Environment(#[from] strum::ParseError),
    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

/// Reads `config/base.yaml`, then `config/<APP_ENVIRONMENT>.yaml`, then
/// `TRACKER_` prefixed environment variables (`TRACKER_DATABASE__PORT`).
pub fn read_config() -> Result<Settings, ConfigError> {
    dotenvy::dotenv().ok();

    let base_path = std::env::current_dir()?;
    let config_directory = base_path.join("config");

    let environment = Environment::from_str(
        std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .as_str(),
    )?;
    let environment_filename = format!("{}.yaml", environment);

    let settings = config::Config::builder()
        .add_source(config::File::from(config_directory.join("base.yaml")))
        .add_source(config::File::from(
            config_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("TRACKER")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize::<Settings>()?)
}

#[derive(Display, Debug, EnumString, PartialEq)]
pub enum Environment {
    #[strum(ascii_case_insensitive, serialize = "local")]
    Local,
    #[strum(ascii_case_insensitive, serialize = "production")]
    Production,
}
