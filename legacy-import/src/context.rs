//! Run-scoped state shared by every importer

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::sync::Arc;

use legacy_import_core::strategy::{StrategyError, WriteRequest, WriteStrategy};
use legacy_import_core::tracker::{EntityTracker, TrackedEntity, DEFAULT_CONTEXT_ID, DEFAULT_LANGUAGE_ID};

use crate::legacy_db::LegacySource;
use crate::samples::{Sample, SampleCollector};

pub struct ImportContext {
    pub source: Arc<dyn LegacySource>,
    pub strategy: Arc<dyn WriteStrategy>,
    pub tracker: EntityTracker,
    pub seed_dir: PathBuf,
    pub dry_run: bool,
    pub sample_only: bool,
    pub samples: Option<SampleCollector>,
}

impl ImportContext {
    pub fn new(
        source: Arc<dyn LegacySource>,
        strategy: Arc<dyn WriteStrategy>,
        seed_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            strategy,
            tracker: EntityTracker::new(),
            seed_dir: seed_dir.into(),
            dry_run: false,
            sample_only: false,
            samples: None,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Attach a sample collector. `sample_only` skips every write.
    pub fn with_samples(mut self, collector: SampleCollector, sample_only: bool) -> Self {
        self.samples = Some(collector);
        self.sample_only = sample_only;
        self
    }

    /// True when records are only simulated, not written
    pub fn is_simulated(&self) -> bool {
        self.dry_run || self.sample_only
    }

    pub async fn collect_sample(&mut self, sample: Sample<'_>) {
        if let Some(collector) = self.samples.as_mut() {
            collector.collect(sample).await;
        }
    }

    /// Write `request` and register the returned id under `key`.
    ///
    /// When simulating, nothing is written and `simulated_id` is registered
    /// instead, so later importers of a dry run still resolve their parents.
    pub async fn persist(
        &mut self,
        request: WriteRequest,
        key: &str,
        simulated_id: impl FnOnce() -> String,
    ) -> Result<String, StrategyError> {
        let entity_type = request.entity_type();
        let id = if self.is_simulated() {
            simulated_id()
        } else {
            self.strategy.write(request).await?
        };

        self.tracker
            .register(TrackedEntity::new(id.clone(), key, entity_type));
        Ok(id)
    }

    pub fn default_language_id(&self) -> Result<&str> {
        self.tracker.get_metadata(DEFAULT_LANGUAGE_ID).ok_or_else(|| {
            anyhow!("Default language ID not found in tracker. Language import must run first.")
        })
    }

    pub fn default_context_id(&self) -> Result<&str> {
        self.tracker.get_metadata(DEFAULT_CONTEXT_ID).ok_or_else(|| {
            anyhow!("Default context ID not found in tracker. Default context import must run first.")
        })
    }
}
