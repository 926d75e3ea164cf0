//! Import configuration
//!
//! Values come from an optional `legacy-import.toml`, then from the
//! environment (`.env` is loaded by the binary before this runs).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "legacy-import.toml";

pub const DEFAULT_SEED_DIR: &str = "data";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' is not a port number")]
    InvalidPort { key: String, value: String },

    #[error("Sample size must be at least 1")]
    InvalidSampleSize,
}

/// Connection settings for one MySQL database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl DatabaseConfig {
    fn with_database(database: &str) -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: database.to_string(),
        }
    }

    /// `user@host:port/database`, without the password
    pub fn describe(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::with_database("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleConfig {
    /// SQLite file receiving collected samples
    pub db_path: PathBuf,
    /// Max `success` samples kept per entity type
    pub sample_size: usize,
    pub collect_all_warnings: bool,
    pub collect_all_edge_cases: bool,
    pub collect_all_foundation: bool,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("test-fixtures/samples.sqlite"),
            sample_size: 20,
            collect_all_warnings: true,
            collect_all_edge_cases: true,
            collect_all_foundation: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub legacy_db: DatabaseConfig,
    pub target_db: DatabaseConfig,
    /// Directory holding `countries.json` and `languages.json`. A relative
    /// path is looked up in the working directory, then next to the binary.
    pub seed_dir: PathBuf,
    pub log_dir: PathBuf,
    pub samples: SampleConfig,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            legacy_db: DatabaseConfig::with_database("mwnf3"),
            target_db: DatabaseConfig::with_database("inventory"),
            seed_dir: PathBuf::from(DEFAULT_SEED_DIR),
            log_dir: PathBuf::from("logs"),
            samples: SampleConfig::default(),
        }
    }
}

impl ImportConfig {
    /// Load from a TOML file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: ImportConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load from `path`, then apply process environment overrides
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_with(|key| std::env::var(key).ok())?;
        config.validate()?;

        let exe = std::env::current_exe().ok();
        config.seed_dir = config.locate_seed_dir(exe.as_deref().and_then(Path::parent));
        Ok(config)
    }

    /// Resolve `seed_dir`: as given when it exists, else relative to
    /// `exe_dir`. Falls back to the configured path so the importer reports
    /// the missing file.
    pub fn locate_seed_dir(&self, exe_dir: Option<&Path>) -> PathBuf {
        if self.seed_dir.is_dir() || self.seed_dir.is_absolute() {
            return self.seed_dir.clone();
        }
        exe_dir
            .map(|dir| dir.join(&self.seed_dir))
            .filter(|candidate| candidate.is_dir())
            .unwrap_or_else(|| self.seed_dir.clone())
    }

    /// Apply overrides from a variable lookup
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        apply_database_env(
            &mut self.legacy_db,
            &lookup,
            ["LEGACY_DB_HOST", "LEGACY_DB_PORT", "LEGACY_DB_USER", "LEGACY_DB_PASSWORD", "LEGACY_DB_DATABASE"],
        )?;
        apply_database_env(
            &mut self.target_db,
            &lookup,
            ["DB_HOST", "DB_PORT", "DB_USERNAME", "DB_PASSWORD", "DB_DATABASE"],
        )?;

        if let Some(dir) = lookup("IMPORT_SEED_DIR") {
            self.seed_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("IMPORT_LOG_DIR") {
            self.log_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("IMPORT_SAMPLE_DB") {
            self.samples.db_path = PathBuf::from(path);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.samples.sample_size == 0 {
            return Err(ConfigError::InvalidSampleSize);
        }
        Ok(())
    }
}

fn apply_database_env<F>(
    db: &mut DatabaseConfig,
    lookup: &F,
    [host, port, user, password, database]: [&str; 5],
) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(host) {
        db.host = value;
    }
    if let Some(value) = lookup(port) {
        db.port = value.parse().map_err(|_| ConfigError::InvalidPort {
            key: port.to_string(),
            value,
        })?;
    }
    if let Some(value) = lookup(user) {
        db.user = value;
    }
    if let Some(value) = lookup(password) {
        db.password = value;
    }
    if let Some(value) = lookup(database) {
        db.database = value;
    }
    Ok(())
}
