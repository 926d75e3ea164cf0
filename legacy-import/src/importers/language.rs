//! Languages, from the bundled `languages.json` seed

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use legacy_import_core::backward_compat;
use legacy_import_core::tracker::DEFAULT_LANGUAGE_ID;
use legacy_import_core::{EntityType, ImportLogger, ImportResult, LanguageData, WriteRequest, LEGACY_SCHEMA};

use super::{abort, load_seed, record_error, Importer};
use crate::context::ImportContext;
use crate::samples::{Sample, SampleReason};

pub const SEED_FILE: &str = "languages.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSeed {
    /// ISO 639-3 code
    pub id: String,
    pub internal_name: String,
    /// Legacy 2-character code
    pub backward_compatibility: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Tracker key of a language, by legacy code
pub fn language_key(legacy_code: &str) -> String {
    backward_compat::format(LEGACY_SCHEMA, "langs", [legacy_code])
}

pub struct LanguageImporter;

#[async_trait]
impl Importer for LanguageImporter {
    fn name(&self) -> &'static str {
        "LanguageImporter"
    }

    async fn import(&self, ctx: &mut ImportContext, logger: &ImportLogger) -> ImportResult {
        let path = ctx.seed_dir.join(SEED_FILE);
        let seeds: Vec<LanguageSeed> = match load_seed(&path) {
            Ok(seeds) => seeds,
            Err(e) => return abort(logger, "Loading languages", e),
        };
        logger.info(&format!("Found {} languages in {}", seeds.len(), path.display()));

        let mut result = ImportResult::new();

        for seed in &seeds {
            let key = language_key(&seed.backward_compatibility);

            if ctx.tracker.exists(&key) {
                if seed.is_default && ctx.tracker.get_metadata(DEFAULT_LANGUAGE_ID).is_none() {
                    ctx.tracker.set_metadata(DEFAULT_LANGUAGE_ID, seed.id.as_str());
                }
                result.skipped += 1;
                logger.show_skipped();
                continue;
            }

            ctx.collect_sample(Sample::new(EntityType::Language, seed, SampleReason::Foundation))
                .await;

            let request = WriteRequest::Language(LanguageData {
                id: seed.id.clone(),
                internal_name: seed.internal_name.clone(),
                backward_compatibility: seed.backward_compatibility.clone(),
                is_default: seed.is_default,
            });

            match ctx.persist(request, &key, || seed.id.clone()).await {
                Ok(id) => {
                    if seed.is_default {
                        ctx.tracker.set_metadata(DEFAULT_LANGUAGE_ID, id);
                    }
                    result.imported += 1;
                    logger.show_progress();
                }
                Err(e) => record_error(
                    &mut result,
                    logger,
                    &seed.id,
                    e.into(),
                    &[("backward_compatibility", seed.backward_compatibility.clone())],
                ),
            }
        }

        if ctx.tracker.get_metadata(DEFAULT_LANGUAGE_ID).is_none() {
            let message = "No default language found in languages.json".to_string();
            logger.warning(&message, None);
            result.warnings.push(message);
        }

        logger.show_summary(result.imported, result.skipped, result.errors.len());
        result.finalize()
    }
}
