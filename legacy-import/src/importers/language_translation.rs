//! Language names per language, from `mwnf3.langnames`

use async_trait::async_trait;
use uuid::Uuid;

use legacy_import_core::backward_compat::{self, PkValue};
use legacy_import_core::{
    map_language_code, EntityType, ImportLogger, ImportResult, LanguageTranslationData,
    StrategyError, WriteRequest, LEGACY_SCHEMA,
};

use super::{abort, record_error, Importer};
use crate::context::ImportContext;
use crate::legacy_db::LanguageNameRow;
use crate::samples::{Sample, SampleReason};

pub fn language_translation_key(row: &LanguageNameRow) -> String {
    let base = backward_compat::format_denormalized(
        LEGACY_SCHEMA,
        "langnames",
        &[
            ("lang_id", PkValue::from(row.lang_id.as_str())),
            ("lang", PkValue::from(row.lang.as_str())),
        ],
        None,
    );
    format!("{}:{}", base, row.lang)
}

pub struct LanguageTranslationImporter;

#[async_trait]
impl Importer for LanguageTranslationImporter {
    fn name(&self) -> &'static str {
        "LanguageTranslationImporter"
    }

    async fn import(&self, ctx: &mut ImportContext, logger: &ImportLogger) -> ImportResult {
        let rows = match ctx.source.language_names().await {
            Ok(rows) => rows,
            Err(e) => return abort(logger, "Querying language names", e),
        };
        logger.info(&format!("Found {} language translations", rows.len()));

        let mut result = ImportResult::new();

        for row in &rows {
            let record_id = format!("{}:{}", row.lang_id, row.lang);
            let key = language_translation_key(row);

            if ctx.tracker.exists(&key) {
                result.skipped += 1;
                logger.show_skipped();
                continue;
            }

            let codes = map_language_code(&row.lang_id)
                .and_then(|named| map_language_code(&row.lang).map(|display| (named, display)));
            let (language_id, display_language_id) = match codes {
                Ok(codes) => codes,
                Err(e) => {
                    ctx.collect_sample(
                        Sample::new(EntityType::LanguageTranslation, row, SampleReason::Edge)
                            .details("unknown_code")
                            .language(&row.lang),
                    )
                    .await;
                    record_error(&mut result, logger, &record_id, e.into(), &[]);
                    continue;
                }
            };

            if row.name.trim().is_empty() {
                let message = format!("{}: empty language name", record_id);
                logger.warning(&message, None);
                result.warnings.push(message);
                ctx.collect_sample(
                    Sample::new(EntityType::LanguageTranslation, row, SampleReason::Warning)
                        .details("missing_name")
                        .language(display_language_id),
                )
                .await;
                result.skipped += 1;
                logger.show_skipped();
                continue;
            }

            ctx.collect_sample(
                Sample::new(EntityType::LanguageTranslation, row, SampleReason::Success)
                    .language(display_language_id),
            )
            .await;

            let request = WriteRequest::LanguageTranslation(LanguageTranslationData {
                language_id: language_id.to_string(),
                display_language_id: display_language_id.to_string(),
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
                        ("language_id", language_id.to_string()),
                        ("display_language_id", display_language_id.to_string()),
                    ],
                ),
            }
        }

        logger.show_summary(result.imported, result.skipped, result.errors.len());
        result.finalize()
    }
}
