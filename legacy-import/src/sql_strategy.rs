//! Direct SQL write strategy for the target MySQL schema

use anyhow::Context;
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::error::ErrorKind;
use sqlx::mysql::{MySqlDatabaseError, MySqlPool};
use tracing::debug;
use uuid::Uuid;

use legacy_import_core::strategy::{StrategyError, TargetTable, WriteRequest, WriteStrategy};

use crate::sanitize::HtmlSanitizer;

/// MySQL error numbers for a missing parent row
const MYSQL_FK_ERRNOS: [u16; 3] = [1216, 1452, 1701];

/// MySQL error number for a duplicate unique key
const MYSQL_DUPLICATE_ERRNO: u16 = 1062;

/// Writes import records with plain `INSERT` statements.
///
/// Languages and countries use their ISO code as primary key; every other
/// row gets a fresh v4 UUID. String fields are converted from HTML to
/// Markdown before they are bound.
pub struct SqlWriteStrategy {
    pool: MySqlPool,
    now: NaiveDateTime,
    sanitizer: HtmlSanitizer,
}

impl SqlWriteStrategy {
    pub fn new(pool: MySqlPool) -> anyhow::Result<Self> {
        Ok(Self {
            pool,
            now: Utc::now().naive_utc(),
            sanitizer: HtmlSanitizer::new().context("Failed to build HTML sanitizer")?,
        })
    }

    /// Round-trip a trivial query
    pub async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Target database did not answer")?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl WriteStrategy for SqlWriteStrategy {
    async fn write(&self, request: WriteRequest) -> Result<String, StrategyError> {
        let table = request.table();
        debug!(%table, "Writing record");
        let request = self.sanitizer.sanitize(request);

        let id = match request {
            WriteRequest::Language(data) => {
                sqlx::query(
                    "INSERT INTO languages (id, internal_name, backward_compatibility, is_default, created_at, updated_at) \
                     VALUES (?, ?, ?, ?, ?, ?)",
                )
                .bind(&data.id)
                .bind(&data.internal_name)
                .bind(&data.backward_compatibility)
                .bind(data.is_default)
                .bind(self.now)
                .bind(self.now)
                .execute(&self.pool)
                .await
                .map_err(|e| classify(table, e))?;
                data.id
            }
            WriteRequest::LanguageTranslation(data) => {
                let id = Uuid::new_v4().to_string();
                sqlx::query(
                    "INSERT INTO language_translations (id, language_id, display_language_id, name, backward_compatibility, created_at, updated_at) \
                     VALUES (?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&id)
                .bind(&data.language_id)
                .bind(&data.display_language_id)
                .bind(&data.name)
                .bind(&data.backward_compatibility)
                .bind(self.now)
                .bind(self.now)
                .execute(&self.pool)
                .await
                .map_err(|e| classify(table, e))?;
                id
            }
            WriteRequest::Country(data) => {
                sqlx::query(
                    "INSERT INTO countries (id, internal_name, backward_compatibility, created_at, updated_at) \
                     VALUES (?, ?, ?, ?, ?)",
                )
                .bind(&data.id)
                .bind(&data.internal_name)
                .bind(&data.backward_compatibility)
                .bind(self.now)
                .bind(self.now)
                .execute(&self.pool)
                .await
                .map_err(|e| classify(table, e))?;
                data.id
            }
            WriteRequest::CountryTranslation(data) => {
                let id = Uuid::new_v4().to_string();
                sqlx::query(
                    "INSERT INTO country_translations (id, country_id, language_id, name, backward_compatibility, created_at, updated_at) \
                     VALUES (?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&id)
                .bind(&data.country_id)
                .bind(&data.language_id)
                .bind(&data.name)
                .bind(&data.backward_compatibility)
                .bind(self.now)
                .bind(self.now)
                .execute(&self.pool)
                .await
                .map_err(|e| classify(table, e))?;
                id
            }
            WriteRequest::Context(data) => {
                let id = Uuid::new_v4().to_string();
                sqlx::query(
                    "INSERT INTO contexts (id, internal_name, is_default, backward_compatibility, created_at, updated_at) \
                     VALUES (?, ?, ?, ?, ?, ?)",
                )
                .bind(&id)
                .bind(&data.internal_name)
                .bind(data.is_default)
                .bind(&data.backward_compatibility)
                .bind(self.now)
                .bind(self.now)
                .execute(&self.pool)
                .await
                .map_err(|e| classify(table, e))?;
                id
            }
        };

        Ok(id)
    }

    async fn find_by_backward_compatibility(
        &self,
        table: TargetTable,
        backward_compatibility: &str,
    ) -> Result<Option<String>, StrategyError> {
        // Table names come from the closed TargetTable set, never from input
        let sql = format!(
            "SELECT id FROM {} WHERE backward_compatibility = ? LIMIT 1",
            table.as_str()
        );
        let row: Option<(String,)> = sqlx::query_as(&sql)
            .bind(backward_compatibility)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify(table, e))?;
        Ok(row.map(|(id,)| id))
    }
}

/// Map a driver error to a [`StrategyError`]
pub fn classify(table: TargetTable, err: sqlx::Error) -> StrategyError {
    if let sqlx::Error::Database(db_err) = &err {
        let message = db_err.message().to_string();
        let errno = db_err
            .try_downcast_ref::<MySqlDatabaseError>()
            .map(MySqlDatabaseError::number);

        let is_fk = matches!(db_err.kind(), ErrorKind::ForeignKeyViolation)
            || errno.is_some_and(|n| MYSQL_FK_ERRNOS.contains(&n));
        if is_fk {
            return StrategyError::ForeignKeyViolation { table, message };
        }

        let is_duplicate = matches!(db_err.kind(), ErrorKind::UniqueViolation)
            || errno == Some(MYSQL_DUPLICATE_ERRNO);
        if is_duplicate {
            return StrategyError::Duplicate { table, message };
        }
    }

    StrategyError::Backend {
        table,
        source: Box::new(err),
    }
}
