//! Shared import types: entity kinds, run results and write payloads

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity kinds tracked across an import run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Context,
    Collection,
    Partner,
    Item,
    Image,
    Language,
    LanguageTranslation,
    Country,
    CountryTranslation,
}

impl EntityType {
    pub const ALL: [EntityType; 9] = [
        EntityType::Context,
        EntityType::Collection,
        EntityType::Partner,
        EntityType::Item,
        EntityType::Image,
        EntityType::Language,
        EntityType::LanguageTranslation,
        EntityType::Country,
        EntityType::CountryTranslation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Context => "context",
            EntityType::Collection => "collection",
            EntityType::Partner => "partner",
            EntityType::Item => "item",
            EntityType::Image => "image",
            EntityType::Language => "language",
            EntityType::LanguageTranslation => "language_translation",
            EntityType::Country => "country",
            EntityType::CountryTranslation => "country_translation",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one importer run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub success: bool,
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Default for ImportResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportResult {
    pub fn new() -> Self {
        Self {
            success: true,
            imported: 0,
            skipped: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// A run that could not read its source at all
    pub fn aborted(error: impl Into<String>) -> Self {
        let mut result = Self::new();
        result.errors.push(error.into());
        result.finalize()
    }

    /// Seal the result; a run succeeds when it recorded no errors
    pub fn finalize(mut self) -> Self {
        self.success = self.errors.is_empty();
        self
    }
}

/// Language row for the `languages` table. `id` is the ISO 639-3 code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageData {
    pub id: String,
    pub internal_name: String,
    pub backward_compatibility: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageTranslationData {
    /// Language being named
    pub language_id: String,
    /// Language the name is written in
    pub display_language_id: String,
    pub name: String,
    pub backward_compatibility: String,
}

/// Country row for the `countries` table. `id` is the ISO 3166-1 alpha-3 code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryData {
    pub id: String,
    pub internal_name: String,
    pub backward_compatibility: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryTranslationData {
    pub country_id: String,
    pub language_id: String,
    pub name: String,
    pub backward_compatibility: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextData {
    pub internal_name: String,
    pub backward_compatibility: String,
    pub is_default: bool,
}
