//! Audit report persistence.
//!
//! Storage sits behind an async trait so the in-memory backend (tests,
//! single-node deployments) and the PostgreSQL backend (feature `postgres`)
//! are interchangeable at service construction.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::report::AuditResult;

pub use memory::InMemoryAuditStore;

#[cfg(feature = "postgres")]
pub use postgres::{PostgresAuditStore, SCHEMA};

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Serialization of a report failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Backend failure (connection, query).
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// One persisted audit report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// The audit result as produced by the engine.
    pub result: AuditResult,
    /// When the record was stored.
    pub stored_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Wrap a result with the current timestamp.
    pub fn new(result: AuditResult) -> Self {
        Self {
            result,
            stored_at: Utc::now(),
        }
    }

    /// The record's audit id.
    pub fn audit_id(&self) -> &str {
        &self.result.audit_id
    }
}

/// Persistence interface for audit reports.
///
/// `put` upserts by audit id. `list_recent` returns records most recent
/// first.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Store (or replace) a record.
    async fn put(&self, record: AuditRecord) -> Result<(), StoreError>;

    /// Fetch a record by audit id.
    async fn get(&self, audit_id: &str) -> Result<Option<AuditRecord>, StoreError>;

    /// The most recently stored records, newest first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<AuditRecord>, StoreError>;
}
