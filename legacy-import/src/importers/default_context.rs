//! The single default context every imported record hangs off

use async_trait::async_trait;
use uuid::Uuid;

use legacy_import_core::tracker::{TrackedEntity, DEFAULT_CONTEXT_ID};
use legacy_import_core::{ContextData, EntityType, ImportLogger, ImportResult, TargetTable, WriteRequest};

use super::{record_error, Importer};
use crate::context::ImportContext;

/// Tracker key and `backward_compatibility` value of the default context
pub const DEFAULT_CONTEXT_KEY: &str = "__default_context__";

pub const DEFAULT_CONTEXT_NAME: &str = "Default Context";

pub struct DefaultContextImporter;

#[async_trait]
impl Importer for DefaultContextImporter {
    fn name(&self) -> &'static str {
        "DefaultContextImporter"
    }

    async fn import(&self, ctx: &mut ImportContext, logger: &ImportLogger) -> ImportResult {
        let mut result = ImportResult::new();

        if let Some(id) = ctx.tracker.get_uuid(DEFAULT_CONTEXT_KEY).map(str::to_string) {
            ctx.tracker.set_metadata(DEFAULT_CONTEXT_ID, id);
            result.skipped += 1;
            logger.show_skipped();
            logger.show_summary(result.imported, result.skipped, 0);
            return result.finalize();
        }

        // A previous run may have created it already
        if !ctx.is_simulated() {
            let existing = ctx
                .strategy
                .find_by_backward_compatibility(TargetTable::Contexts, DEFAULT_CONTEXT_KEY)
                .await;
            match existing {
                Ok(Some(id)) => {
                    logger.info(&format!("Default context already present: {}", id));
                    ctx.tracker.register(TrackedEntity::new(
                        id.as_str(),
                        DEFAULT_CONTEXT_KEY,
                        EntityType::Context,
                    ));
                    ctx.tracker.set_metadata(DEFAULT_CONTEXT_ID, id);
                    result.skipped += 1;
                    logger.show_skipped();
                    logger.show_summary(result.imported, result.skipped, 0);
                    return result.finalize();
                }
                Ok(None) => {}
                Err(e) => {
                    record_error(&mut result, logger, DEFAULT_CONTEXT_KEY, e.into(), &[]);
                    logger.show_summary(result.imported, result.skipped, result.errors.len());
                    return result.finalize();
                }
            }
        }

        let request = WriteRequest::Context(ContextData {
            internal_name: DEFAULT_CONTEXT_NAME.to_string(),
            backward_compatibility: DEFAULT_CONTEXT_KEY.to_string(),
            is_default: true,
        });

        match ctx
            .persist(request, DEFAULT_CONTEXT_KEY, || Uuid::new_v4().to_string())
            .await
        {
            Ok(id) => {
                logger.info(&format!("Created default context: {}", id));
                ctx.tracker.set_metadata(DEFAULT_CONTEXT_ID, id);
                result.imported += 1;
                logger.show_progress();
            }
            Err(e) => record_error(&mut result, logger, DEFAULT_CONTEXT_KEY, e.into(), &[]),
        }

        logger.show_summary(result.imported, result.skipped, result.errors.len());
        result.finalize()
    }
}
