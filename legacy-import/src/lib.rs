//! Legacy Import Library
//!
//! Imports foundation data (default context, languages, countries and their
//! translations) from the legacy `mwnf3` schema into the inventory schema.

pub mod config;
pub mod context;
pub mod driver;
pub mod importers;
pub mod legacy_db;
pub mod samples;
pub mod sanitize;
pub mod sql_strategy;

pub use config::{DatabaseConfig, ImportConfig, SampleConfig};
pub use context::ImportContext;
pub use driver::{registry, ImporterEntry, RunSummary, Selection};
pub use importers::Importer;
pub use legacy_db::{LegacySource, MySqlLegacyDatabase};
pub use samples::SampleCollector;
pub use sql_strategy::SqlWriteStrategy;

/// Import result type
pub type Result<T> = anyhow::Result<T>;
