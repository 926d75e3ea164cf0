//! Legacy Import Core - identity keys and shared plumbing for the importer
//!
//! This crate provides the pieces every importer and tool shares:
//! - Backward-compatibility key formatting and parsing
//! - Legacy to ISO code mapping tables
//! - The in-memory entity tracker
//! - The write strategy contract
//! - The dual console/file import logger

pub mod backward_compat;
pub mod code_mappings;
pub mod error;
pub mod logging;
pub mod strategy;
pub mod tracker;
pub mod types;

pub use backward_compat::{BackwardCompatibilityError, BackwardCompatibilityRef, PkValue};
pub use code_mappings::{map_country_code, map_language_code, MappingError};
pub use error::ApiError;
pub use logging::{init_tracing, ImportLogger, PhaseSummary};
pub use strategy::{StrategyError, TargetTable, WriteRequest, WriteStrategy};
pub use tracker::{EntityTracker, TrackedEntity, TrackerStats, DEFAULT_CONTEXT_ID, DEFAULT_LANGUAGE_ID};
pub use types::*;

/// Schema name of the legacy database
pub const LEGACY_SCHEMA: &str = "mwnf3";
