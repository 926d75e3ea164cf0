//! Sample collector
//!
//! Stores raw legacy records in a SQLite file while importing, to build
//! test fixtures from real data. Every entity type shares one
//! `legacy_samples` table; records are deduplicated by a SHA-256 hash of
//! their JSON form.
//!
//! Collection never fails an import: storage errors are logged and dropped.

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::warn;

use legacy_import_core::EntityType;

use crate::config::SampleConfig;

/// Source database recorded when the caller does not name one
pub const DEFAULT_SOURCE_DB: &str = "mwnf3";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS legacy_samples (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_type TEXT NOT NULL,
    source_db TEXT,
    raw_data TEXT NOT NULL,
    sample_reason TEXT NOT NULL,
    language TEXT,
    collected_at TEXT NOT NULL,
    record_hash TEXT NOT NULL UNIQUE
);
CREATE INDEX IF NOT EXISTS idx_samples_entity ON legacy_samples(entity_type);
CREATE INDEX IF NOT EXISTS idx_samples_source ON legacy_samples(source_db);
CREATE INDEX IF NOT EXISTS idx_samples_reason ON legacy_samples(sample_reason);
CREATE INDEX IF NOT EXISTS idx_samples_language ON legacy_samples(language);
CREATE INDEX IF NOT EXISTS idx_samples_entity_reason ON legacy_samples(entity_type, sample_reason);
"#;

/// Why a record is worth keeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleReason {
    Success,
    Warning,
    Edge,
    Foundation,
}

impl SampleReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleReason::Success => "success",
            SampleReason::Warning => "warning",
            SampleReason::Edge => "edge",
            SampleReason::Foundation => "foundation",
        }
    }
}

impl fmt::Display for SampleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record offered to the collector
#[derive(Debug, Clone)]
pub struct Sample<'a> {
    pub entity_type: EntityType,
    pub raw: serde_json::Value,
    pub reason: SampleReason,
    pub details: Option<&'a str>,
    pub language: Option<&'a str>,
    pub source_db: Option<&'a str>,
}

impl<'a> Sample<'a> {
    pub fn new<T: Serialize>(entity_type: EntityType, record: &T, reason: SampleReason) -> Self {
        Self {
            entity_type,
            raw: serde_json::to_value(record).unwrap_or(serde_json::Value::Null),
            reason,
            details: None,
            language: None,
            source_db: None,
        }
    }

    pub fn details(mut self, details: &'a str) -> Self {
        self.details = Some(details);
        self
    }

    pub fn language(mut self, language: &'a str) -> Self {
        self.language = Some(language);
        self
    }

    /// `reason` or `reason:details`
    pub fn full_reason(&self) -> String {
        match self.details {
            Some(details) => format!("{}:{}", self.reason, details),
            None => self.reason.to_string(),
        }
    }
}

/// Hex SHA-256 over entity type, reason and the record's JSON form
pub fn record_hash(entity_type: EntityType, full_reason: &str, raw_json: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(entity_type.as_str().as_bytes());
    hasher.update(b"\0");
    hasher.update(full_reason.as_bytes());
    hasher.update(b"\0");
    hasher.update(raw_json.as_bytes());
    hex::encode(hasher.finalize())
}

fn is_foundation(entity_type: EntityType) -> bool {
    matches!(
        entity_type,
        EntityType::Language
            | EntityType::LanguageTranslation
            | EntityType::Country
            | EntityType::CountryTranslation
    )
}

pub struct SampleCollector {
    pool: SqlitePool,
    config: SampleConfig,
    /// category (`entity:reason`) -> hashes stored during this run
    collected: HashMap<String, Vec<String>>,
}

impl SampleCollector {
    /// Open (or create) the SQLite file and its schema
    pub async fn open(config: SampleConfig) -> Result<Self> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create sample directory: {}", parent.display())
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open sample database: {}", config.db_path.display()))?;

        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .context("Failed to create legacy_samples table")?;

        Ok(Self {
            pool,
            config,
            collected: HashMap::new(),
        })
    }

    fn should_collect(&self, category: &str, sample: &Sample<'_>) -> bool {
        match sample.reason {
            SampleReason::Warning if self.config.collect_all_warnings => return true,
            SampleReason::Edge if self.config.collect_all_edge_cases => return true,
            _ => {}
        }

        if self.config.collect_all_foundation && is_foundation(sample.entity_type) {
            return true;
        }

        match sample.reason {
            SampleReason::Success => self
                .collected
                .get(category)
                .map_or(true, |hashes| hashes.len() < self.config.sample_size),
            _ => true,
        }
    }

    /// Offer one record; returns true when it was stored
    pub async fn collect(&mut self, sample: Sample<'_>) -> bool {
        let full_reason = sample.full_reason();
        let category = format!("{}:{}", sample.entity_type, full_reason);

        if !self.should_collect(&category, &sample) {
            return false;
        }

        let raw_json = sample.raw.to_string();
        let hash = record_hash(sample.entity_type, &full_reason, &raw_json);
        if self
            .collected
            .get(&category)
            .is_some_and(|hashes| hashes.contains(&hash))
        {
            return false;
        }

        let result = sqlx::query(
            "INSERT OR IGNORE INTO legacy_samples \
             (entity_type, source_db, raw_data, sample_reason, language, collected_at, record_hash) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(sample.entity_type.as_str())
        .bind(sample.source_db.unwrap_or(DEFAULT_SOURCE_DB))
        .bind(&raw_json)
        .bind(&full_reason)
        .bind(sample.language)
        .bind(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
        .bind(&hash)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 1 => {
                self.collected.entry(category).or_default().push(hash);
                true
            }
            Ok(_) => false,
            Err(e) => {
                warn!("Failed to collect sample for {}: {}", sample.entity_type, e);
                false
            }
        }
    }

    /// Stored sample counts keyed by `entity_type:sample_reason`
    pub async fn stats(&self) -> Result<BTreeMap<String, i64>> {
        let rows: Vec<(String, String, i64)> = sqlx::query_as(
            "SELECT entity_type, sample_reason, COUNT(*) FROM legacy_samples \
             GROUP BY entity_type, sample_reason ORDER BY entity_type, sample_reason",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to read sample stats")?;

        Ok(rows
            .into_iter()
            .map(|(entity, reason, count)| (format!("{}:{}", entity, reason), count))
            .collect())
    }

    pub async fn clear(&mut self) -> Result<()> {
        sqlx::query("DELETE FROM legacy_samples")
            .execute(&self.pool)
            .await
            .context("Failed to clear samples")?;
        self.collected.clear();
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
