//! Write strategy contract
//!
//! Importers never talk to the target store directly. They hand a
//! [`WriteRequest`] to a [`WriteStrategy`], which persists it and returns
//! the identifier assigned in the new schema.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::types::{
    ContextData, CountryData, CountryTranslationData, EntityType, LanguageData,
    LanguageTranslationData,
};

/// One write, tagged by entity type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteRequest {
    Language(LanguageData),
    LanguageTranslation(LanguageTranslationData),
    Country(CountryData),
    CountryTranslation(CountryTranslationData),
    Context(ContextData),
}

impl WriteRequest {
    pub fn entity_type(&self) -> EntityType {
        match self {
            WriteRequest::Language(_) => EntityType::Language,
            WriteRequest::LanguageTranslation(_) => EntityType::LanguageTranslation,
            WriteRequest::Country(_) => EntityType::Country,
            WriteRequest::CountryTranslation(_) => EntityType::CountryTranslation,
            WriteRequest::Context(_) => EntityType::Context,
        }
    }

    pub fn table(&self) -> TargetTable {
        match self {
            WriteRequest::Language(_) => TargetTable::Languages,
            WriteRequest::LanguageTranslation(_) => TargetTable::LanguageTranslations,
            WriteRequest::Country(_) => TargetTable::Countries,
            WriteRequest::CountryTranslation(_) => TargetTable::CountryTranslations,
            WriteRequest::Context(_) => TargetTable::Contexts,
        }
    }
}

/// Target tables that carry a `backward_compatibility` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetTable {
    Languages,
    LanguageTranslations,
    Countries,
    CountryTranslations,
    Contexts,
}

impl TargetTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetTable::Languages => "languages",
            TargetTable::LanguageTranslations => "language_translations",
            TargetTable::Countries => "countries",
            TargetTable::CountryTranslations => "country_translations",
            TargetTable::Contexts => "contexts",
        }
    }
}

impl fmt::Display for TargetTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write failures, classified so importers can react without parsing
/// driver messages
#[derive(Debug, Error)]
pub enum StrategyError {
    /// A referenced parent row does not exist
    #[error("Foreign key constraint failed on {table}: {message}")]
    ForeignKeyViolation { table: TargetTable, message: String },

    #[error("Duplicate entry in {table}: {message}")]
    Duplicate { table: TargetTable, message: String },

    #[error("Write to {table} failed")]
    Backend {
        table: TargetTable,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StrategyError {
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, StrategyError::ForeignKeyViolation { .. })
    }
}

/// Persists import records into the target store
#[async_trait]
pub trait WriteStrategy: Send + Sync {
    /// Persist one record and return its identifier in the new schema
    async fn write(&self, request: WriteRequest) -> Result<String, StrategyError>;

    /// Look up an already persisted row by its backward-compatibility key
    async fn find_by_backward_compatibility(
        &self,
        table: TargetTable,
        backward_compatibility: &str,
    ) -> Result<Option<String>, StrategyError>;
}
