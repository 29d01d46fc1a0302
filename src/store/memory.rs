//! In-memory audit store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{AuditRecord, AuditStore, StoreError};

#[derive(Default)]
struct Inner {
    records: BTreeMap<String, AuditRecord>,
    // Audit ids, most recent first. A re-put moves the id to the front.
    recency: Vec<String>,
}

/// Non-persistent store for tests and single-node deployments.
#[derive(Default)]
pub struct InMemoryAuditStore {
    inner: RwLock<Inner>,
}

impl InMemoryAuditStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn put(&self, record: AuditRecord) -> Result<(), StoreError> {
        let id = record.audit_id().to_string();
        let mut inner = self.inner.write();
        inner.recency.retain(|existing| existing != &id);
        inner.recency.insert(0, id.clone());
        inner.records.insert(id, record);
        Ok(())
    }

    async fn get(&self, audit_id: &str) -> Result<Option<AuditRecord>, StoreError> {
        Ok(self.inner.read().records.get(audit_id).cloned())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<AuditRecord>, StoreError> {
        let inner = self.inner.read();
        Ok(inner
            .recency
            .iter()
            .take(limit)
            .filter_map(|id| inner.records.get(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::AuditPolicy;
    use crate::types::request::AuditRequest;
    use crate::AuditEngine;
    use std::io::Write;

    fn sample_record(audit_id: &str) -> AuditRecord {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.est");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(
            br#"{"kind": "linear",
                 "model": {"weights": [1.0, 1.0, 0.0, 0.0, 0.0, 0.0], "bias": 0.0}}"#,
        )
        .unwrap();

        let mut request = AuditRequest::full(path);
        request.audit_id = Some(audit_id.to_string());
        let engine = AuditEngine::new(AuditPolicy::minimal()).unwrap();
        AuditRecord::new(engine.run(&request).unwrap())
    }

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let store = InMemoryAuditStore::new();
        store.put(sample_record("a1")).await.unwrap();

        let fetched = store.get("a1").await.unwrap().unwrap();
        assert_eq!(fetched.audit_id(), "a1");
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_recent_is_newest_first() {
        let store = InMemoryAuditStore::new();
        store.put(sample_record("a1")).await.unwrap();
        store.put(sample_record("a2")).await.unwrap();
        store.put(sample_record("a3")).await.unwrap();

        let recent = store.list_recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].audit_id(), "a3");
        assert_eq!(recent[1].audit_id(), "a2");
    }

    #[tokio::test]
    async fn test_reput_moves_to_front() {
        let store = InMemoryAuditStore::new();
        store.put(sample_record("a1")).await.unwrap();
        store.put(sample_record("a2")).await.unwrap();
        store.put(sample_record("a1")).await.unwrap();

        let recent = store.list_recent(10).await.unwrap();
        assert_eq!(recent[0].audit_id(), "a1");
        assert_eq!(store.len(), 2);
    }
}
