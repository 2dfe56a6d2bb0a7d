//! Database repository for CRUD operations.
//!
//! The per-resource operations live in sibling modules as further
//! `impl Repository` blocks; this file holds the shared pieces.

use chrono::{SecondsFormat, Utc};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use crate::errors::AppError;
use crate::models::RevisionInfo;

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pub(super) pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    /// Increment the revision ID and return the new value.
    pub async fn increment_revision(&self) -> Result<i64, AppError> {
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(now_timestamp())
            .execute(&self.pool)
            .await?;
        self.get_revision_id().await
    }

    /// Number of rows in `table` whose `column` equals `id`.
    ///
    /// `table` and `column` are always compile-time constants of this module.
    pub(super) async fn count_references(
        &self,
        table: &'static str,
        column: &'static str,
        id: &str,
    ) -> Result<i64, AppError> {
        let sql = format!("SELECT COUNT(*) AS n FROM {} WHERE {} = ?", table, column);
        let row = sqlx::query(&sql).bind(id).fetch_one(&self.pool).await?;
        Ok(row.get("n"))
    }
}

/// Increment the revision inside an open transaction.
pub(super) async fn increment_revision_tx(
    tx: &mut Transaction<'_, Sqlite>,
) -> Result<(), AppError> {
    sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
        .bind(now_timestamp())
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Fixed-width RFC 3339 timestamp so that text order equals time order.
pub(super) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(super) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
