//! Countries, from the bundled `countries.json` seed

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use legacy_import_core::backward_compat;
use legacy_import_core::{CountryData, EntityType, ImportLogger, ImportResult, WriteRequest, LEGACY_SCHEMA};

use super::{abort, load_seed, record_error, Importer};
use crate::context::ImportContext;
use crate::samples::{Sample, SampleReason};

pub const SEED_FILE: &str = "countries.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountrySeed {
    /// ISO 3166-1 alpha-3 code
    pub id: String,
    pub internal_name: String,
    /// Legacy 2-character code
    pub backward_compatibility: String,
}

/// Tracker key of a country, by legacy code
pub fn country_key(legacy_code: &str) -> String {
    backward_compat::format(LEGACY_SCHEMA, "countries", [legacy_code])
}

pub struct CountryImporter;

#[async_trait]
impl Importer for CountryImporter {
    fn name(&self) -> &'static str {
        "CountryImporter"
    }

    async fn import(&self, ctx: &mut ImportContext, logger: &ImportLogger) -> ImportResult {
        let path = ctx.seed_dir.join(SEED_FILE);
        let seeds: Vec<CountrySeed> = match load_seed(&path) {
            Ok(seeds) => seeds,
            Err(e) => return abort(logger, "Loading countries", e),
        };
        logger.info(&format!("Found {} countries in {}", seeds.len(), path.display()));

        let mut result = ImportResult::new();

        for seed in &seeds {
            let key = country_key(&seed.backward_compatibility);
            if ctx.tracker.exists(&key) {
                result.skipped += 1;
                logger.show_skipped();
                continue;
            }

            ctx.collect_sample(Sample::new(EntityType::Country, seed, SampleReason::Foundation))
                .await;

            let request = WriteRequest::Country(CountryData {
                id: seed.id.clone(),
                internal_name: seed.internal_name.clone(),
                backward_compatibility: seed.backward_compatibility.clone(),
            });

            match ctx.persist(request, &key, || seed.id.clone()).await {
                Ok(_) => {
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

        logger.show_summary(result.imported, result.skipped, result.errors.len());
        result.finalize()
    }
}
