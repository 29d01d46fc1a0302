//! PostgreSQL audit store (feature `postgres`).
//!
//! Reports are stored as JSONB so the schema survives additive report
//! changes without migrations; `stored_at` drives the recency ordering.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::types::report::AuditResult;

use super::{AuditRecord, AuditStore, StoreError};

/// DDL applied by [`PostgresAuditStore::init_schema`]; exported so
/// deployments can run migrations out of band.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS audit_reports (
    audit_id  TEXT PRIMARY KEY,
    report    JSONB NOT NULL,
    stored_at TIMESTAMPTZ NOT NULL
);
CREATE INDEX IF NOT EXISTS audit_reports_stored_at_idx
    ON audit_reports (stored_at DESC);
"#;

/// PostgreSQL-backed audit store.
pub struct PostgresAuditStore {
    pool: PgPool,
}

impl PostgresAuditStore {
    /// Wrap an existing pool. Call [`Self::init_schema`] before first use.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and ensure the schema exists.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(url).await.map_err(backend)?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create the reports table and recency index if absent.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA.split(';').filter(|s| !s.trim().is_empty()) {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(backend)?;
        }
        Ok(())
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn record_from_row(row: &sqlx::postgres::PgRow) -> Result<AuditRecord, StoreError> {
    let report: serde_json::Value = row.get("report");
    let stored_at: DateTime<Utc> = row.get("stored_at");
    let result: AuditResult = serde_json::from_value(report)?;
    Ok(AuditRecord { result, stored_at })
}

#[async_trait]
impl AuditStore for PostgresAuditStore {
    async fn put(&self, record: AuditRecord) -> Result<(), StoreError> {
        let report = serde_json::to_value(&record.result)?;
        sqlx::query(
            r#"
            INSERT INTO audit_reports (audit_id, report, stored_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (audit_id)
            DO UPDATE SET report = EXCLUDED.report, stored_at = EXCLUDED.stored_at
            "#,
        )
        .bind(record.audit_id())
        .bind(report)
        .bind(record.stored_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn get(&self, audit_id: &str) -> Result<Option<AuditRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT report, stored_at FROM audit_reports WHERE audit_id = $1",
        )
        .bind(audit_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<AuditRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT report, stored_at FROM audit_reports ORDER BY stored_at DESC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter().map(record_from_row).collect()
    }
}
