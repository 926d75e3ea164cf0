//! Country names per language, from `mwnf3.countrynames`

use async_trait::async_trait;
use uuid::Uuid;

use legacy_import_core::backward_compat::{self, PkValue};
use legacy_import_core::{
    map_country_code, map_language_code, CountryTranslationData, EntityType, ImportLogger,
    ImportResult, StrategyError, WriteRequest, LEGACY_SCHEMA,
};

use super::{abort, record_error, Importer};
use crate::context::ImportContext;
use crate::legacy_db::CountryNameRow;
use crate::samples::{Sample, SampleReason};

/// Tracker key of one country name. The language is appended after the
/// denormalized key so each translation stays distinct.
pub fn country_translation_key(row: &CountryNameRow) -> String {
    let base = backward_compat::format_denormalized(
        LEGACY_SCHEMA,
        "countrynames",
        &[
            ("country", PkValue::from(row.country.as_str())),
            ("lang", PkValue::from(row.lang.as_str())),
        ],
        None,
    );
    format!("{}:{}", base, row.lang)
}

pub struct CountryTranslationImporter;

#[async_trait]
impl Importer for CountryTranslationImporter {
    fn name(&self) -> &'static str {
        "CountryTranslationImporter"
    }

    async fn import(&self, ctx: &mut ImportContext, logger: &ImportLogger) -> ImportResult {
        let rows = match ctx.source.country_names().await {
            Ok(rows) => rows,
            Err(e) => return abort(logger, "Querying country names", e),
        };
        logger.info(&format!("Found {} country translations", rows.len()));

        let mut result = ImportResult::new();

        for row in &rows {
            let record_id = format!("{}:{}", row.country, row.lang);
            let key = country_translation_key(row);

            if ctx.tracker.exists(&key) {
                result.skipped += 1;
                logger.show_skipped();
                continue;
            }

            let codes = map_country_code(&row.country)
                .and_then(|country| map_language_code(&row.lang).map(|lang| (country, lang)));
            let (country_id, language_id) = match codes {
                Ok(codes) => codes,
                Err(e) => {
                    ctx.collect_sample(
                        Sample::new(EntityType::CountryTranslation, row, SampleReason::Edge)
                            .details("unknown_code")
                            .language(&row.lang),
                    )
                    .await;
                    record_error(&mut result, logger, &record_id, e.into(), &[]);
                    continue;
                }
            };

            if row.name.trim().is_empty() {
                let message = format!("{}: empty country name", record_id);
                logger.warning(&message, None);
                result.warnings.push(message);
                ctx.collect_sample(
                    Sample::new(EntityType::CountryTranslation, row, SampleReason::Warning)
                        .details("missing_name")
                        .language(language_id),
                )
                .await;
                result.skipped += 1;
                logger.show_skipped();
                continue;
            }

            ctx.collect_sample(
                Sample::new(EntityType::CountryTranslation, row, SampleReason::Success)
                    .language(language_id),
            )
            .await;

            let request = WriteRequest::CountryTranslation(CountryTranslationData {
                country_id: country_id.to_string(),
                language_id: language_id.to_string(),
                name: row.name.clone(),
                backward_compatibility: key.clone(),
            });

            match ctx.persist(request, &key, || Uuid::new_v4().to_string()).await {
                Ok(_) => {
                    result.imported += 1;
                    logger.show_progress();
                }
                Err(e @ StrategyError::ForeignKeyViolation { .. }) => {
                    logger.warning(
                        &format!("{}: parent row missing, skipped ({})", record_id, e),
                        None,
                    );
                    result.skipped += 1;
                    logger.show_skipped();
                }
                Err(e) => record_error(
                    &mut result,
                    logger,
                    &record_id,
                    e.into(),
                    &[
                        ("country_id", country_id.to_string()),
                        ("language_id", language_id.to_string()),
                    ],
                ),
            }
        }

        logger.show_summary(result.imported, result.skipped, result.errors.len());
        result.finalize()
    }
}
