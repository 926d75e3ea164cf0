//! Backward-compatibility identity keys
//!
//! Every imported row carries a stable key derived from its legacy natural
//! key, of the form `schema:table:pk1[:pk2[:...]]`. The key stands in for a
//! foreign key across the schema migration: importers use it to detect rows
//! that were already migrated and to resolve references to parents.
//!
//! Components are joined with [`SEPARATOR`] and never escaped. Callers must
//! not pass components that themselves contain a colon.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Component separator
pub const SEPARATOR: char = ':';

/// Column dropped by default from denormalized (per-language) tables
pub const LANGUAGE_COLUMN: &str = "lang";

/// One primary key component
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PkValue {
    Text(String),
    Number(i64),
}

impl fmt::Display for PkValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PkValue::Text(s) => f.write_str(s),
            PkValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl PkValue {
    /// String form of the value; numbers come back as decimal text
    pub fn to_text(&self) -> PkValue {
        PkValue::Text(self.to_string())
    }
}

impl From<&str> for PkValue {
    fn from(value: &str) -> Self {
        PkValue::Text(value.to_string())
    }
}

impl From<String> for PkValue {
    fn from(value: String) -> Self {
        PkValue::Text(value)
    }
}

impl From<&String> for PkValue {
    fn from(value: &String) -> Self {
        PkValue::Text(value.clone())
    }
}

impl From<i64> for PkValue {
    fn from(value: i64) -> Self {
        PkValue::Number(value)
    }
}

impl From<i32> for PkValue {
    fn from(value: i32) -> Self {
        PkValue::Number(value.into())
    }
}

impl From<u32> for PkValue {
    fn from(value: u32) -> Self {
        PkValue::Number(value.into())
    }
}

/// Backward-compatibility formatting errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackwardCompatibilityError {
    #[error("Invalid backward_compatibility format '{value}': expected schema:table:pk..., got {components} component(s)")]
    InvalidFormat { value: String, components: usize },
}

/// Structured form of a backward-compatibility key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackwardCompatibilityRef {
    pub schema: String,
    pub table: String,
    pub pk_values: Vec<PkValue>,
}

impl BackwardCompatibilityRef {
    pub fn new<I, V>(schema: impl Into<String>, table: impl Into<String>, pk_values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<PkValue>,
    {
        Self {
            schema: schema.into(),
            table: table.into(),
            pk_values: pk_values.into_iter().map(Into::into).collect(),
        }
    }

    /// Render as `schema:table:pk1:pk2...`
    pub fn format(&self) -> String {
        self.to_string()
    }

    /// Parse a formatted key. All pk values come back as [`PkValue::Text`].
    pub fn parse(formatted: &str) -> Result<Self, BackwardCompatibilityError> {
        let parts: Vec<&str> = formatted.split(SEPARATOR).collect();
        if parts.len() < 3 {
            return Err(BackwardCompatibilityError::InvalidFormat {
                value: formatted.to_string(),
                components: parts.len(),
            });
        }

        Ok(Self {
            schema: parts[0].to_string(),
            table: parts[1].to_string(),
            pk_values: parts[2..].iter().map(|p| PkValue::from(*p)).collect(),
        })
    }
}

impl fmt::Display for BackwardCompatibilityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.schema, SEPARATOR, self.table)?;
        for pk in &self.pk_values {
            write!(f, "{}{}", SEPARATOR, pk)?;
        }
        Ok(())
    }
}

impl FromStr for BackwardCompatibilityRef {
    type Err = BackwardCompatibilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Format a key from schema, table and ordered pk values
pub fn format<I, V>(schema: &str, table: &str, pk_values: I) -> String
where
    I: IntoIterator<Item = V>,
    V: Into<PkValue>,
{
    BackwardCompatibilityRef::new(schema, table, pk_values).format()
}

/// Parse a formatted key
pub fn parse(formatted: &str) -> Result<BackwardCompatibilityRef, BackwardCompatibilityError> {
    BackwardCompatibilityRef::parse(formatted)
}

/// Format the key of a row from a denormalized table.
///
/// Translation tables repeat one logical row per language, so the language
/// column is not part of the identity. `pk_columns` is given in column
/// declaration order; excluded columns are dropped and the remaining values
/// keep that order. Pass `None` to exclude [`LANGUAGE_COLUMN`] only.
pub fn format_denormalized(
    schema: &str,
    table: &str,
    pk_columns: &[(&str, PkValue)],
    exclude_columns: Option<&[&str]>,
) -> String {
    let exclude = exclude_columns.unwrap_or(&[LANGUAGE_COLUMN]);
    let values = pk_columns
        .iter()
        .filter(|(column, _)| !exclude.contains(column))
        .map(|(_, value)| value.clone());

    format(schema, table, values)
}

/// Format the key of the `image_index`-th image of an item
pub fn format_image<I, V>(schema: &str, table: &str, item_pk_values: I, image_index: usize) -> String
where
    I: IntoIterator<Item = V>,
    V: Into<PkValue>,
{
    let mut key = format(schema, table, item_pk_values);
    key.push(SEPARATOR);
    key.push_str(&image_index.to_string());
    key
}
