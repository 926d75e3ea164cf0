//! Importer tests against in-memory fakes of the legacy source and the
//! write strategy

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use legacy_import::config::SampleConfig;
use legacy_import::driver::{self, Selection};
use legacy_import::importers::{
    CountryImporter, CountryTranslationImporter, DefaultContextImporter, Importer,
    LanguageImporter, LanguageTranslationImporter, DEFAULT_CONTEXT_KEY,
};
use legacy_import::legacy_db::{CountryNameRow, LanguageNameRow, LegacySource};
use legacy_import::{ImportContext, SampleCollector};
use legacy_import_core::tracker::{DEFAULT_CONTEXT_ID, DEFAULT_LANGUAGE_ID};
use legacy_import_core::{
    EntityType, ImportLogger, StrategyError, TargetTable, WriteRequest, WriteStrategy,
};

// =========================================================================
// Fakes
// =========================================================================

#[derive(Default)]
struct FakeSource {
    country_names: Vec<CountryNameRow>,
    language_names: Vec<LanguageNameRow>,
    unavailable: bool,
    queries: AtomicUsize,
}

#[async_trait]
impl LegacySource for FakeSource {
    async fn country_names(&self) -> Result<Vec<CountryNameRow>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(anyhow!("Lost connection to MySQL server during query"));
        }
        Ok(self.country_names.clone())
    }

    async fn language_names(&self) -> Result<Vec<LanguageNameRow>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(anyhow!("Lost connection to MySQL server during query"));
        }
        Ok(self.language_names.clone())
    }
}

#[derive(Default)]
struct FakeStrategy {
    writes: Mutex<Vec<WriteRequest>>,
    /// Country ids whose translations fail with a missing parent
    missing_countries: HashSet<String>,
    /// Language ids whose translations fail with a missing parent
    missing_languages: HashSet<String>,
    /// Language or country ids whose writes fail in the backend
    failing_ids: HashSet<String>,
    /// Rows already present in the target store
    existing: HashMap<(TargetTable, String), String>,
    next_id: AtomicUsize,
}

impl FakeStrategy {
    fn writes(&self) -> Vec<WriteRequest> {
        self.writes.lock().unwrap().clone()
    }

    fn count(&self, entity_type: EntityType) -> usize {
        self.writes()
            .iter()
            .filter(|w| w.entity_type() == entity_type)
            .count()
    }
}

#[async_trait]
impl WriteStrategy for FakeStrategy {
    async fn write(&self, request: WriteRequest) -> Result<String, StrategyError> {
        match &request {
            WriteRequest::CountryTranslation(data)
                if self.missing_countries.contains(&data.country_id) =>
            {
                return Err(StrategyError::ForeignKeyViolation {
                    table: TargetTable::CountryTranslations,
                    message: "Cannot add or update a child row".to_string(),
                });
            }
            WriteRequest::LanguageTranslation(data)
                if self.missing_languages.contains(&data.language_id) =>
            {
                return Err(StrategyError::ForeignKeyViolation {
                    table: TargetTable::LanguageTranslations,
                    message: "Cannot add or update a child row".to_string(),
                });
            }
            WriteRequest::Country(data) if self.failing_ids.contains(&data.id) => {
                return Err(StrategyError::Backend {
                    table: TargetTable::Countries,
                    source: "Deadlock found when trying to get lock".into(),
                });
            }
            WriteRequest::Language(data) if self.failing_ids.contains(&data.id) => {
                return Err(StrategyError::Duplicate {
                    table: TargetTable::Languages,
                    message: format!("Duplicate entry '{}' for key 'PRIMARY'", data.id),
                });
            }
            _ => {}
        }

        let id = match &request {
            WriteRequest::Language(data) => data.id.clone(),
            WriteRequest::Country(data) => data.id.clone(),
            _ => format!("uuid-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
        };
        self.writes.lock().unwrap().push(request);
        Ok(id)
    }

    async fn find_by_backward_compatibility(
        &self,
        table: TargetTable,
        backward_compatibility: &str,
    ) -> Result<Option<String>, StrategyError> {
        Ok(self
            .existing
            .get(&(table, backward_compatibility.to_string()))
            .cloned())
    }
}

// =========================================================================
// Test Helpers
// =========================================================================

struct TestEnvironment {
    dir: TempDir,
    source: Arc<FakeSource>,
    strategy: Arc<FakeStrategy>,
    logger: ImportLogger,
}

impl TestEnvironment {
    fn new(source: FakeSource, strategy: FakeStrategy) -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("countries.json"),
            r#"[
                { "id": "usa", "internal_name": "United States of America", "backward_compatibility": "us" },
                { "id": "fra", "internal_name": "France", "backward_compatibility": "fr" },
                { "id": "egy", "internal_name": "Egypt", "backward_compatibility": "eg" }
            ]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("languages.json"),
            r#"[
                { "id": "eng", "internal_name": "English", "backward_compatibility": "en", "is_default": true },
                { "id": "fra", "internal_name": "Français", "backward_compatibility": "fr", "is_default": false },
                { "id": "ara", "internal_name": "Arabic", "backward_compatibility": "ar", "is_default": false }
            ]"#,
        )
        .unwrap();

        let logger = ImportLogger::with_file("Test", dir.path().join("logs").join("run.log")).quiet();
        Self {
            dir,
            source: Arc::new(source),
            strategy: Arc::new(strategy),
            logger,
        }
    }

    fn context(&self) -> ImportContext {
        ImportContext::new(self.source.clone(), self.strategy.clone(), self.dir.path())
    }

    fn log(&self) -> String {
        std::fs::read_to_string(self.logger.log_file_path()).unwrap()
    }
}

fn country_name(country: &str, lang: &str, name: &str) -> CountryNameRow {
    CountryNameRow {
        country: country.to_string(),
        lang: lang.to_string(),
        name: name.to_string(),
    }
}

fn language_name(lang_id: &str, lang: &str, name: &str) -> LanguageNameRow {
    LanguageNameRow {
        lang_id: lang_id.to_string(),
        lang: lang.to_string(),
        name: name.to_string(),
    }
}

// =========================================================================
// Foundation importers
// =========================================================================

#[tokio::test]
async fn test_country_import_writes_and_registers() {
    let env = TestEnvironment::new(FakeSource::default(), FakeStrategy::default());
    let mut ctx = env.context();

    let result = CountryImporter.import(&mut ctx, &env.logger).await;

    assert!(result.success);
    assert_eq!(result.imported, 3);
    assert_eq!(result.skipped, 0);
    assert!(result.errors.is_empty());
    assert_eq!(env.strategy.count(EntityType::Country), 3);
    assert_eq!(env.source.queries.load(Ordering::SeqCst), 0);

    assert_eq!(ctx.tracker.get_uuid("mwnf3:countries:us"), Some("usa"));
    assert_eq!(ctx.tracker.get_uuid("mwnf3:countries:eg"), Some("egy"));

    let writes = env.strategy.writes();
    match &writes[1] {
        WriteRequest::Country(data) => {
            assert_eq!(data.id, "fra");
            assert_eq!(data.internal_name, "France");
            assert_eq!(data.backward_compatibility, "fr");
        }
        other => panic!("unexpected write: {:?}", other),
    }
}

#[tokio::test]
async fn test_second_country_import_skips_everything() {
    let env = TestEnvironment::new(FakeSource::default(), FakeStrategy::default());
    let mut ctx = env.context();

    CountryImporter.import(&mut ctx, &env.logger).await;
    let second = CountryImporter.import(&mut ctx, &env.logger).await;

    assert!(second.success);
    assert_eq!(second.imported, 0);
    assert_eq!(second.skipped, 3);
    assert_eq!(env.strategy.count(EntityType::Country), 3);
}

#[tokio::test]
async fn test_country_dry_run_registers_without_writing() {
    let env = TestEnvironment::new(FakeSource::default(), FakeStrategy::default());
    let mut ctx = env.context().with_dry_run(true);

    let result = CountryImporter.import(&mut ctx, &env.logger).await;

    assert!(result.success);
    assert_eq!(result.imported, 3);
    assert!(env.strategy.writes().is_empty());
    assert!(ctx.tracker.exists("mwnf3:countries:us"));
    assert_eq!(ctx.tracker.get_uuid("mwnf3:countries:fr"), Some("fra"));
}

#[tokio::test]
async fn test_missing_seed_file_aborts() {
    let env = TestEnvironment::new(FakeSource::default(), FakeStrategy::default());
    std::fs::remove_file(env.dir.path().join("countries.json")).unwrap();
    let mut ctx = env.context();

    let result = CountryImporter.import(&mut ctx, &env.logger).await;

    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.imported, 0);
    assert!(result.errors[0].contains("countries.json"));
}

#[tokio::test]
async fn test_language_import_sets_default_language() {
    let env = TestEnvironment::new(FakeSource::default(), FakeStrategy::default());
    let mut ctx = env.context();

    let result = LanguageImporter.import(&mut ctx, &env.logger).await;

    assert!(result.success);
    assert_eq!(result.imported, 3);
    assert!(result.warnings.is_empty());
    assert_eq!(ctx.tracker.get_metadata(DEFAULT_LANGUAGE_ID), Some("eng"));
    assert_eq!(ctx.default_language_id().unwrap(), "eng");
    assert_eq!(ctx.tracker.get_uuid("mwnf3:langs:ar"), Some("ara"));
}

#[tokio::test]
async fn test_language_and_country_keys_do_not_collide() {
    let env = TestEnvironment::new(FakeSource::default(), FakeStrategy::default());
    let mut ctx = env.context();

    LanguageImporter.import(&mut ctx, &env.logger).await;
    let countries = CountryImporter.import(&mut ctx, &env.logger).await;

    // "fr" is both a language and a country code
    assert_eq!(countries.imported, 3);
    assert_eq!(ctx.tracker.get_stats().language, 3);
    assert_eq!(ctx.tracker.get_stats().country, 3);
}

// =========================================================================
// Default context
// =========================================================================

#[tokio::test]
async fn test_default_context_created_once() {
    let env = TestEnvironment::new(FakeSource::default(), FakeStrategy::default());
    let mut ctx = env.context();

    let first = DefaultContextImporter.import(&mut ctx, &env.logger).await;
    let second = DefaultContextImporter.import(&mut ctx, &env.logger).await;

    assert_eq!(first.imported, 1);
    assert_eq!(second.imported, 0);
    assert_eq!(second.skipped, 1);
    assert_eq!(env.strategy.count(EntityType::Context), 1);
    assert_eq!(ctx.tracker.get_metadata(DEFAULT_CONTEXT_ID), Some("uuid-0"));
}

#[tokio::test]
async fn test_default_context_resumes_from_target_store() {
    let mut strategy = FakeStrategy::default();
    strategy.existing.insert(
        (TargetTable::Contexts, DEFAULT_CONTEXT_KEY.to_string()),
        "existing-context".to_string(),
    );
    let env = TestEnvironment::new(FakeSource::default(), strategy);
    let mut ctx = env.context();

    let result = DefaultContextImporter.import(&mut ctx, &env.logger).await;

    assert!(result.success);
    assert_eq!(result.imported, 0);
    assert_eq!(result.skipped, 1);
    assert!(env.strategy.writes().is_empty());
    assert_eq!(ctx.default_context_id().unwrap(), "existing-context");
}

// =========================================================================
// Translations
// =========================================================================

#[tokio::test]
async fn test_country_translation_unknown_code_is_one_error() {
    let source = FakeSource {
        country_names: vec![
            country_name("eg", "en", "Egypt"),
            country_name("eg", "fr", "Égypte"),
            country_name("xx", "en", "Nowhere"),
        ],
        ..FakeSource::default()
    };
    let env = TestEnvironment::new(source, FakeStrategy::default());
    let mut ctx = env.context();

    let result = CountryTranslationImporter.import(&mut ctx, &env.logger).await;

    assert!(!result.success);
    assert_eq!(result.imported, 2);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("xx:en"));
    assert!(env.log().contains("Unknown country code 'xx'"));

    let writes = env.strategy.writes();
    match &writes[1] {
        WriteRequest::CountryTranslation(data) => {
            assert_eq!(data.country_id, "egy");
            assert_eq!(data.language_id, "fra");
            assert_eq!(data.backward_compatibility, "mwnf3:countrynames:eg:fr");
        }
        other => panic!("unexpected write: {:?}", other),
    }
}

#[tokio::test]
async fn test_country_translation_missing_parent_is_skipped() {
    let mut strategy = FakeStrategy::default();
    strategy.missing_countries.insert("fra".to_string());
    let source = FakeSource {
        country_names: vec![
            country_name("eg", "en", "Egypt"),
            country_name("fr", "en", "France"),
        ],
        ..FakeSource::default()
    };
    let env = TestEnvironment::new(source, strategy);
    let mut ctx = env.context();

    let result = CountryTranslationImporter.import(&mut ctx, &env.logger).await;

    assert!(result.success);
    assert_eq!(result.imported, 1);
    assert_eq!(result.skipped, 1);
    assert!(result.errors.is_empty());
    assert!(!ctx.tracker.exists("mwnf3:countrynames:fr:en"));
}

#[tokio::test]
async fn test_language_translation_missing_parent_is_skipped() {
    let mut strategy = FakeStrategy::default();
    strategy.missing_languages.insert("fra".to_string());
    let source = FakeSource {
        language_names: vec![
            language_name("fr", "en", "French"),
            language_name("ar", "en", "Arabic"),
        ],
        ..FakeSource::default()
    };
    let env = TestEnvironment::new(source, strategy);
    let mut ctx = env.context();

    let result = LanguageTranslationImporter.import(&mut ctx, &env.logger).await;

    assert!(result.success);
    assert_eq!(result.imported, 1);
    assert_eq!(result.skipped, 1);
    assert!(result.errors.is_empty());
    assert!(!ctx.tracker.exists("mwnf3:langnames:fr:en"));
    assert!(ctx.tracker.exists("mwnf3:langnames:ar:en"));
    assert!(env.log().contains("fr:en: parent row missing"));
}

#[tokio::test]
async fn test_failed_country_write_is_recorded_and_run_continues() {
    let mut strategy = FakeStrategy::default();
    strategy.failing_ids.insert("fra".to_string());
    let env = TestEnvironment::new(FakeSource::default(), strategy);
    let mut ctx = env.context();

    let result = CountryImporter.import(&mut ctx, &env.logger).await;

    assert!(!result.success);
    assert_eq!(result.imported, 2);
    assert_eq!(result.skipped, 0);
    assert_eq!(
        result.errors,
        vec!["fra: Write to countries failed: Deadlock found when trying to get lock".to_string()]
    );
    assert!(ctx.tracker.exists("mwnf3:countries:us"));
    assert!(!ctx.tracker.exists("mwnf3:countries:fr"));
    assert!(ctx.tracker.exists("mwnf3:countries:eg"));

    let log = env.log();
    assert!(log.contains("[ERROR] [Test] Importing fra"));
    assert!(log.contains("[CAUSE] Deadlock found when trying to get lock"));
}

#[tokio::test]
async fn test_duplicate_language_write_is_an_error() {
    let mut strategy = FakeStrategy::default();
    strategy.failing_ids.insert("ara".to_string());
    let env = TestEnvironment::new(FakeSource::default(), strategy);
    let mut ctx = env.context();

    let result = LanguageImporter.import(&mut ctx, &env.logger).await;

    assert!(!result.success);
    assert_eq!(result.imported, 2);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("ara: Duplicate entry in languages"));
    assert_eq!(env.strategy.count(EntityType::Language), 2);
}

#[tokio::test]
async fn test_empty_translation_source_queries_once() {
    let env = TestEnvironment::new(FakeSource::default(), FakeStrategy::default());
    let mut ctx = env.context();

    let result = CountryTranslationImporter.import(&mut ctx, &env.logger).await;

    assert_eq!(env.source.queries.load(Ordering::SeqCst), 1);
    assert!(result.success);
    assert_eq!(result.imported, 0);
    assert_eq!(result.skipped, 0);
}

#[tokio::test]
async fn test_unavailable_source_aborts_run() {
    let source = FakeSource {
        unavailable: true,
        ..FakeSource::default()
    };
    let env = TestEnvironment::new(source, FakeStrategy::default());
    let mut ctx = env.context();

    let result = LanguageTranslationImporter.import(&mut ctx, &env.logger).await;

    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);
    assert!(env.log().contains("Lost connection"));
}

#[tokio::test]
async fn test_language_translation_empty_name_warns() {
    let source = FakeSource {
        language_names: vec![
            language_name("fr", "en", "French"),
            language_name("fr", "de", "  "),
        ],
        ..FakeSource::default()
    };
    let env = TestEnvironment::new(source, FakeStrategy::default());
    let mut ctx = env.context();

    let result = LanguageTranslationImporter.import(&mut ctx, &env.logger).await;

    assert!(result.success);
    assert_eq!(result.imported, 1);
    assert_eq!(result.skipped, 1);
    assert_eq!(result.warnings.len(), 1);

    match &env.strategy.writes()[0] {
        WriteRequest::LanguageTranslation(data) => {
            assert_eq!(data.language_id, "fra");
            assert_eq!(data.display_language_id, "eng");
            assert_eq!(data.name, "French");
        }
        other => panic!("unexpected write: {:?}", other),
    }
}

// =========================================================================
// Driver
// =========================================================================

fn full_source() -> FakeSource {
    FakeSource {
        country_names: vec![
            country_name("eg", "en", "Egypt"),
            country_name("fr", "ar", "فرنسا"),
        ],
        language_names: vec![
            language_name("ar", "en", "Arabic"),
            language_name("en", "fr", "Anglais"),
        ],
        ..FakeSource::default()
    }
}

#[tokio::test]
async fn test_driver_runs_all_importers_in_order() {
    let env = TestEnvironment::new(full_source(), FakeStrategy::default());
    let mut ctx = env.context();
    let entries = driver::registry();
    let selected = Selection::default().select(&entries).unwrap();

    let summary = driver::run(&mut ctx, &selected, &env.logger).await;

    let keys: Vec<&str> = summary.results.iter().map(|(k, _)| *k).collect();
    assert_eq!(
        keys,
        vec![
            "default-context",
            "language",
            "country",
            "language-translation",
            "country-translation"
        ]
    );
    assert_eq!(summary.imported(), 1 + 3 + 3 + 2 + 2);
    assert!(!summary.has_errors());
    assert_eq!(summary.phases.len(), 5);
    assert_eq!(ctx.tracker.len(), summary.imported());
    assert!(env.log().contains("IMPORT SUMMARY"));
}

#[tokio::test]
async fn test_driver_dry_run_then_real_run() {
    let env = TestEnvironment::new(full_source(), FakeStrategy::default());
    let entries = driver::registry();
    let selected = Selection::default().select(&entries).unwrap();

    let mut dry = env.context().with_dry_run(true);
    let summary = driver::run(&mut dry, &selected, &env.logger).await;
    assert_eq!(summary.imported(), 11);
    assert!(env.strategy.writes().is_empty());

    // A fresh context starts from an empty tracker
    let mut real = env.context();
    let summary = driver::run(&mut real, &selected, &env.logger).await;
    assert_eq!(summary.imported(), 11);
    assert_eq!(env.strategy.writes().len(), 11);
}

#[tokio::test]
async fn test_sample_only_collects_without_writing() {
    let env = TestEnvironment::new(full_source(), FakeStrategy::default());
    let collector = SampleCollector::open(SampleConfig {
        db_path: env.dir.path().join("samples.sqlite"),
        ..SampleConfig::default()
    })
    .await
    .unwrap();
    let mut ctx = env.context().with_samples(collector, true);
    let entries = driver::registry();
    let selected = Selection {
        start_at: Some("language".to_string()),
        ..Selection::default()
    }
    .select(&entries)
    .unwrap();

    let summary = driver::run(&mut ctx, &selected, &env.logger).await;

    assert_eq!(summary.imported(), 3 + 3 + 2 + 2);
    assert!(env.strategy.writes().is_empty());

    let stats = ctx.samples.as_ref().unwrap().stats().await.unwrap();
    assert_eq!(stats.get("language:foundation"), Some(&3));
    assert_eq!(stats.get("country:foundation"), Some(&3));
    assert_eq!(stats.get("country_translation:success"), Some(&2));
}
