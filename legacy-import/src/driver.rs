//! Importer registry and sequential driver

use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use legacy_import_core::{ImportLogger, ImportResult, PhaseSummary};

use crate::context::ImportContext;
use crate::importers::{
    CountryImporter, CountryTranslationImporter, DefaultContextImporter, Importer,
    LanguageImporter, LanguageTranslationImporter,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DriverError {
    #[error("Unknown importer: {0}")]
    UnknownImporter(String),
}

pub struct ImporterEntry {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub importer: Box<dyn Importer>,
}

/// Every importer, in dependency order
pub fn registry() -> Vec<ImporterEntry> {
    vec![
        ImporterEntry {
            key: "default-context",
            name: "Default Context",
            description: "Create the default context",
            importer: Box::new(DefaultContextImporter),
        },
        ImporterEntry {
            key: "language",
            name: "Languages",
            description: "Import languages from languages.json",
            importer: Box::new(LanguageImporter),
        },
        ImporterEntry {
            key: "country",
            name: "Countries",
            description: "Import countries from countries.json",
            importer: Box::new(CountryImporter),
        },
        ImporterEntry {
            key: "language-translation",
            name: "Language Translations",
            description: "Import language names from mwnf3.langnames",
            importer: Box::new(LanguageTranslationImporter),
        },
        ImporterEntry {
            key: "country-translation",
            name: "Country Translations",
            description: "Import country names from mwnf3.countrynames",
            importer: Box::new(CountryTranslationImporter),
        },
    ]
}

/// Which importers to run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub only: Option<String>,
    pub start_at: Option<String>,
    pub stop_at: Option<String>,
}

fn position(entries: &[ImporterEntry], key: &str) -> Result<usize, DriverError> {
    entries
        .iter()
        .position(|e| e.key == key)
        .ok_or_else(|| DriverError::UnknownImporter(key.to_string()))
}

impl Selection {
    /// Resolve against the registry. `only` wins over the range bounds.
    pub fn select<'a>(
        &self,
        entries: &'a [ImporterEntry],
    ) -> Result<Vec<&'a ImporterEntry>, DriverError> {
        if let Some(only) = &self.only {
            let index = position(entries, only)?;
            return Ok(vec![&entries[index]]);
        }

        let start = match &self.start_at {
            Some(key) => position(entries, key)?,
            None => 0,
        };
        let stop = match &self.stop_at {
            Some(key) => position(entries, key)?,
            None => entries.len().saturating_sub(1),
        };

        Ok(entries
            .iter()
            .enumerate()
            .filter(|(i, _)| *i >= start && *i <= stop)
            .map(|(_, e)| e)
            .collect())
    }
}

/// One line per importer for `--list-importers`
pub fn list_importers(entries: &[ImporterEntry]) -> Vec<String> {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| format!("{:>2}. {:<22} - {}", i + 1, e.key, e.description))
        .collect()
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub results: Vec<(&'static str, ImportResult)>,
    pub phases: Vec<PhaseSummary>,
}

impl RunSummary {
    pub fn imported(&self) -> usize {
        self.results.iter().map(|(_, r)| r.imported).sum()
    }

    pub fn skipped(&self) -> usize {
        self.results.iter().map(|(_, r)| r.skipped).sum()
    }

    pub fn errors(&self) -> usize {
        self.results.iter().map(|(_, r)| r.errors.len()).sum()
    }

    pub fn warnings(&self) -> usize {
        self.results.iter().map(|(_, r)| r.warnings.len()).sum()
    }

    pub fn has_errors(&self) -> bool {
        self.errors() > 0
    }
}

/// Run the selected importers one after another on a shared context
pub async fn run(
    ctx: &mut ImportContext,
    selected: &[&ImporterEntry],
    logger: &ImportLogger,
) -> RunSummary {
    let mut summary = RunSummary::default();

    for entry in selected {
        logger.log_phase_start(entry.name);
        logger.log_importer_start(entry.importer.name());
        info!(importer = entry.key, "Starting importer");

        let started = Instant::now();
        let importer_logger = logger.named(entry.importer.name());
        let result = entry.importer.import(ctx, &importer_logger).await;
        let duration = started.elapsed();

        for err in &result.errors {
            logger.log_importer_error(entry.importer.name(), err);
        }
        logger.log_importer_complete(
            entry.importer.name(),
            result.imported,
            result.skipped,
            result.errors.len(),
            duration,
        );
        logger.show_result_details(&result.errors, result.warnings.len());

        summary.phases.push(PhaseSummary {
            phase: entry.name.to_string(),
            duration,
            imported: result.imported,
            skipped: result.skipped,
            errors: result.errors.len(),
        });
        summary.results.push((entry.key, result));
    }

    if let Ok(id) = ctx.default_language_id() {
        debug!(default_language_id = id, "Default language");
    }
    if let Ok(id) = ctx.default_context_id() {
        debug!(default_context_id = id, "Default context");
    }

    logger.log_final_summary(&summary.phases);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(selected: &[&ImporterEntry]) -> Vec<&'static str> {
        selected.iter().map(|e| e.key).collect()
    }

    #[test]
    fn test_registry_order() {
        let entries = registry();
        assert_eq!(
            entries.iter().map(|e| e.key).collect::<Vec<_>>(),
            vec![
                "default-context",
                "language",
                "country",
                "language-translation",
                "country-translation"
            ]
        );
    }

    #[test]
    fn test_select_all_by_default() {
        let entries = registry();
        let selected = Selection::default().select(&entries).unwrap();
        assert_eq!(selected.len(), entries.len());
    }

    #[test]
    fn test_select_only() {
        let entries = registry();
        let selection = Selection {
            only: Some("country".to_string()),
            start_at: Some("language".to_string()),
            ..Selection::default()
        };
        assert_eq!(keys(&selection.select(&entries).unwrap()), vec!["country"]);
    }

    #[test]
    fn test_select_range() {
        let entries = registry();
        let selection = Selection {
            start_at: Some("language".to_string()),
            stop_at: Some("language-translation".to_string()),
            ..Selection::default()
        };
        assert_eq!(
            keys(&selection.select(&entries).unwrap()),
            vec!["language", "country", "language-translation"]
        );
    }

    #[test]
    fn test_unknown_importer() {
        let entries = registry();
        let selection = Selection {
            stop_at: Some("partner".to_string()),
            ..Selection::default()
        };
        assert_eq!(
            selection.select(&entries).err(),
            Some(DriverError::UnknownImporter("partner".to_string()))
        );
    }

    #[test]
    fn test_list_importers() {
        let lines = list_importers(&registry());
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with(" 1. default-context"));
    }
}
