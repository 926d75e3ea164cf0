//! Legacy database reader
//!
//! Reads the `mwnf3` MySQL schema. Each source query is a single ordered
//! `SELECT`; rows are returned whole since the foundation tables are small.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::config::DatabaseConfig;

pub const COUNTRY_NAMES_QUERY: &str =
    "SELECT country, lang, name FROM mwnf3.countrynames ORDER BY country, lang";

pub const LANGUAGE_NAMES_QUERY: &str =
    "SELECT lang_id, lang, name FROM mwnf3.langnames ORDER BY lang_id, lang";

/// One row of `mwnf3.countrynames`: the name of `country` written in `lang`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CountryNameRow {
    pub country: String,
    pub lang: String,
    pub name: String,
}

/// One row of `mwnf3.langnames`: the name of `lang_id` written in `lang`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LanguageNameRow {
    pub lang_id: String,
    pub lang: String,
    pub name: String,
}

/// Read access to the legacy schema
#[async_trait]
pub trait LegacySource: Send + Sync {
    async fn country_names(&self) -> Result<Vec<CountryNameRow>>;

    async fn language_names(&self) -> Result<Vec<LanguageNameRow>>;
}

/// Build MySQL connect options from config
pub fn connect_options(config: &DatabaseConfig) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.database)
        .charset("utf8mb4")
}

/// Open a small MySQL pool. Importers await one query at a time.
#[instrument(skip(config), fields(db = %config.describe()))]
pub async fn connect_pool(config: &DatabaseConfig) -> Result<MySqlPool> {
    let pool = MySqlPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(connect_options(config))
        .await
        .with_context(|| format!("Failed to connect to {}", config.describe()))?;

    info!("Connected");
    Ok(pool)
}

pub struct MySqlLegacyDatabase {
    pool: MySqlPool,
}

impl MySqlLegacyDatabase {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = connect_pool(config)
            .await
            .context("Legacy database connection failed")?;
        Ok(Self { pool })
    }

    /// Round-trip a trivial query
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Legacy database did not answer")?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl LegacySource for MySqlLegacyDatabase {
    async fn country_names(&self) -> Result<Vec<CountryNameRow>> {
        debug!(query = COUNTRY_NAMES_QUERY, "Reading legacy rows");
        sqlx::query_as::<_, CountryNameRow>(COUNTRY_NAMES_QUERY)
            .fetch_all(&self.pool)
            .await
            .context("Failed to read mwnf3.countrynames")
    }

    async fn language_names(&self) -> Result<Vec<LanguageNameRow>> {
        debug!(query = LANGUAGE_NAMES_QUERY, "Reading legacy rows");
        sqlx::query_as::<_, LanguageNameRow>(LANGUAGE_NAMES_QUERY)
            .fetch_all(&self.pool)
            .await
            .context("Failed to read mwnf3.langnames")
    }
}
