//! Per-entity importers
//!
//! Each importer reads one bounded source (a JSON seed file or one ordered
//! legacy query) and walks it in source order. Per record it computes the
//! backward-compatibility key, skips keys already tracked, then writes (or
//! simulates) and registers the new id. A failing record is logged and
//! counted; the loop always continues.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::Path;

use legacy_import_core::{ImportLogger, ImportResult};

use crate::context::ImportContext;

pub mod country;
pub mod country_translation;
pub mod default_context;
pub mod language;
pub mod language_translation;

pub use country::{CountryImporter, CountrySeed};
pub use country_translation::CountryTranslationImporter;
pub use default_context::{DefaultContextImporter, DEFAULT_CONTEXT_KEY};
pub use language::{LanguageImporter, LanguageSeed};
pub use language_translation::LanguageTranslationImporter;

#[async_trait]
pub trait Importer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run the import. Never fails: problems are reported in the result.
    async fn import(&self, ctx: &mut ImportContext, logger: &ImportLogger) -> ImportResult;
}

/// Read a JSON array seed file
pub fn load_seed<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse seed file: {}", path.display()))
}

/// Close a run that could not read its source
pub(crate) fn abort(logger: &ImportLogger, context: &str, err: anyhow::Error) -> ImportResult {
    logger.error(context, &err, &[]);
    logger.show_summary(0, 0, 1);
    ImportResult::aborted(format!("{}: {:#}", context, err))
}

/// Record one failed record and move on
pub(crate) fn record_error(
    result: &mut ImportResult,
    logger: &ImportLogger,
    record_id: &str,
    err: anyhow::Error,
    extra: &[(&str, String)],
) {
    logger.error(&format!("Importing {}", record_id), &err, extra);
    logger.show_error();
    result.errors.push(format!("{}: {:#}", record_id, err));
}
