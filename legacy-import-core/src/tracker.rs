//! In-memory identity tracker
//!
//! Maps backward-compatibility keys to the identifiers assigned in the new
//! schema. One tracker is shared by every importer of a run so that later
//! importers can resolve the parents registered by earlier ones.
//!
//! State lives for the process only. A later run rebuilds it by re-checking
//! the target store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::EntityType;

/// Metadata key holding the default language id
pub const DEFAULT_LANGUAGE_ID: &str = "default_language_id";

/// Metadata key holding the default context id
pub const DEFAULT_CONTEXT_ID: &str = "default_context_id";

/// One imported entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedEntity {
    pub uuid: String,
    pub backward_compatibility: String,
    pub entity_type: EntityType,
    pub created_at: DateTime<Utc>,
}

impl TrackedEntity {
    pub fn new(
        uuid: impl Into<String>,
        backward_compatibility: impl Into<String>,
        entity_type: EntityType,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            backward_compatibility: backward_compatibility.into(),
            entity_type,
            created_at: Utc::now(),
        }
    }
}

/// Per-type entity counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerStats {
    pub context: usize,
    pub collection: usize,
    pub partner: usize,
    pub item: usize,
    pub image: usize,
    pub language: usize,
    pub language_translation: usize,
    pub country: usize,
    pub country_translation: usize,
}

impl TrackerStats {
    fn slot(&mut self, entity_type: EntityType) -> &mut usize {
        match entity_type {
            EntityType::Context => &mut self.context,
            EntityType::Collection => &mut self.collection,
            EntityType::Partner => &mut self.partner,
            EntityType::Item => &mut self.item,
            EntityType::Image => &mut self.image,
            EntityType::Language => &mut self.language,
            EntityType::LanguageTranslation => &mut self.language_translation,
            EntityType::Country => &mut self.country,
            EntityType::CountryTranslation => &mut self.country_translation,
        }
    }

    pub fn total(&self) -> usize {
        self.context
            + self.collection
            + self.partner
            + self.item
            + self.image
            + self.language
            + self.language_translation
            + self.country
            + self.country_translation
    }
}

/// Backward-compatibility key → new identifier map
#[derive(Debug, Default)]
pub struct EntityTracker {
    entities: HashMap<String, TrackedEntity>,
    metadata: HashMap<String, String>,
}

impl EntityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for `entity.backward_compatibility`.
    ///
    /// Last write wins: a later run re-registering a key replaces whatever a
    /// partial earlier attempt left behind.
    pub fn register(&mut self, entity: TrackedEntity) {
        self.entities
            .insert(entity.backward_compatibility.clone(), entity);
    }

    pub fn exists(&self, backward_compatibility: &str) -> bool {
        self.entities.contains_key(backward_compatibility)
    }

    pub fn get_uuid(&self, backward_compatibility: &str) -> Option<&str> {
        self.entities
            .get(backward_compatibility)
            .map(|e| e.uuid.as_str())
    }

    pub fn get(&self, backward_compatibility: &str) -> Option<&TrackedEntity> {
        self.entities.get(backward_compatibility)
    }

    /// All entities of one type, in map iteration order
    pub fn get_by_type(&self, entity_type: EntityType) -> Vec<&TrackedEntity> {
        self.entities
            .values()
            .filter(|e| e.entity_type == entity_type)
            .collect()
    }

    pub fn get_all(&self) -> Vec<&TrackedEntity> {
        self.entities.values().collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get_stats(&self) -> TrackerStats {
        let mut stats = TrackerStats::default();
        for entity in self.entities.values() {
            *stats.slot(entity.entity_type) += 1;
        }
        stats
    }

    /// Store a run-scoped value shared between importers
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn get_metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Drop every entity and metadata entry. Only meant for test isolation;
    /// clearing mid-run makes every following record look new.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.metadata.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut tracker = EntityTracker::new();
        tracker.register(TrackedEntity::new(
            "test-uuid-1",
            "mwnf3:projects:vm",
            EntityType::Context,
        ));

        assert!(tracker.exists("mwnf3:projects:vm"));
        assert_eq!(tracker.get_uuid("mwnf3:projects:vm"), Some("test-uuid-1"));
        assert!(!tracker.exists("mwnf3:projects:unknown"));
        assert_eq!(tracker.get_uuid("mwnf3:projects:unknown"), None);
    }

    #[test]
    fn test_register_overwrites_same_key() {
        let mut tracker = EntityTracker::new();
        tracker.register(TrackedEntity::new("uuid-1", "mwnf3:projects:vm", EntityType::Context));
        tracker.register(TrackedEntity::new("uuid-2", "mwnf3:projects:vm", EntityType::Context));

        assert_eq!(tracker.get_uuid("mwnf3:projects:vm"), Some("uuid-2"));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_get_by_type() {
        let mut tracker = EntityTracker::new();
        tracker.register(TrackedEntity::new("context-1", "mwnf3:projects:vm", EntityType::Context));
        tracker.register(TrackedEntity::new("context-2", "sh:projects:sh1", EntityType::Context));
        tracker.register(TrackedEntity::new(
            "item-1",
            "mwnf3:objects:vm:ma:louvre:001",
            EntityType::Item,
        ));

        let contexts = tracker.get_by_type(EntityType::Context);
        assert_eq!(contexts.len(), 2);
        assert!(contexts.iter().all(|e| e.entity_type == EntityType::Context));
        assert!(tracker.get_by_type(EntityType::Image).is_empty());
    }

    #[test]
    fn test_stats_default_to_zero() {
        let mut tracker = EntityTracker::new();
        tracker.register(TrackedEntity::new("c1", "mwnf3:projects:vm", EntityType::Context));
        tracker.register(TrackedEntity::new("c2", "sh:projects:sh1", EntityType::Collection));
        tracker.register(TrackedEntity::new("i1", "mwnf3:objects:001", EntityType::Item));
        tracker.register(TrackedEntity::new("i2", "mwnf3:objects:002", EntityType::Item));

        let stats = tracker.get_stats();
        assert_eq!(
            stats,
            TrackerStats {
                context: 1,
                collection: 1,
                item: 2,
                ..TrackerStats::default()
            }
        );
        assert_eq!(stats.partner, 0);
        assert_eq!(stats.total(), tracker.get_all().len());
    }

    #[test]
    fn test_metadata() {
        let mut tracker = EntityTracker::new();
        assert_eq!(tracker.get_metadata(DEFAULT_LANGUAGE_ID), None);

        tracker.set_metadata(DEFAULT_LANGUAGE_ID, "eng");
        assert_eq!(tracker.get_metadata(DEFAULT_LANGUAGE_ID), Some("eng"));
    }

    #[test]
    fn test_clear() {
        let mut tracker = EntityTracker::new();
        tracker.register(TrackedEntity::new("test", "mwnf3:projects:vm", EntityType::Context));
        tracker.set_metadata(DEFAULT_CONTEXT_ID, "test");

        tracker.clear();

        assert!(!tracker.exists("mwnf3:projects:vm"));
        assert_eq!(tracker.get_stats().context, 0);
        assert!(tracker.is_empty());
        assert_eq!(tracker.get_metadata(DEFAULT_CONTEXT_ID), None);
    }
}
