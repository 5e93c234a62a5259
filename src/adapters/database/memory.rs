//! In-memory keyed store
//!
//! Backs the `memory` store target and the test-suite. A single
//! mutex serializes every write, which makes `update` atomic per key.

use super::traits::{KeyedStore, ListFilter, RecordEditor, StoreResult};
use crate::core::context::ExecutionContext;
use crate::domain::{EntityKind, ExternalId, InternalKey, MirroredRecord, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Collection {
    records: HashMap<InternalKey, MirroredRecord>,
    by_external_id: HashMap<ExternalId, InternalKey>,
}

/// Mutex-backed store keeping one map per kind
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<EntityKind, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, HashMap<EntityKind, Collection>>> {
        self.collections
            .lock()
            .map_err(|_| StoreError::ConnectionFailed("memory store lock poisoned".to_string()))
    }

    /// Number of records stored for a kind, placeholders and removed included
    pub fn len(&self, kind: EntityKind) -> usize {
        self.lock()
            .map(|c| c.get(&kind).map(|col| col.records.len()).unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, kind: EntityKind) -> bool {
        self.len(kind) == 0
    }

    /// Record lookup by external id, for inspection
    pub fn record_by_external_id(
        &self,
        kind: EntityKind,
        external_id: &str,
    ) -> Option<MirroredRecord> {
        let guard = self.lock().ok()?;
        let collection = guard.get(&kind)?;
        let id = ExternalId::new(external_id).ok()?;
        let key = collection.by_external_id.get(&id)?;
        collection.records.get(key).cloned()
    }
}

#[async_trait]
impl KeyedStore for MemoryStore {
    async fn test_connection(&self) -> StoreResult<()> {
        self.lock().map(|_| ())
    }

    async fn ensure_collection(
        &self,
        _ctx: &ExecutionContext,
        kind: EntityKind,
    ) -> StoreResult<()> {
        self.lock()?.entry(kind).or_default();
        Ok(())
    }

    async fn find_by_external_id(
        &self,
        _ctx: &ExecutionContext,
        kind: EntityKind,
        external_id: &ExternalId,
    ) -> StoreResult<Option<InternalKey>> {
        Ok(self
            .lock()?
            .get(&kind)
            .and_then(|c| c.by_external_id.get(external_id).copied()))
    }

    async fn get(
        &self,
        _ctx: &ExecutionContext,
        kind: EntityKind,
        key: InternalKey,
    ) -> StoreResult<Option<MirroredRecord>> {
        Ok(self
            .lock()?
            .get(&kind)
            .and_then(|c| c.records.get(&key).cloned()))
    }

    async fn create(
        &self,
        _ctx: &ExecutionContext,
        kind: EntityKind,
        external_id: &ExternalId,
        payload: Value,
    ) -> StoreResult<InternalKey> {
        let mut guard = self.lock()?;
        let collection = guard.entry(kind).or_default();

        if collection.by_external_id.contains_key(external_id) {
            return Err(StoreError::AlreadyExists {
                collection: kind.collection().to_string(),
                external_id: external_id.to_string(),
            });
        }

        let key = InternalKey::generate();
        let record = MirroredRecord::new(key, kind, external_id.clone(), payload);
        collection.by_external_id.insert(external_id.clone(), key);
        collection.records.insert(key, record);
        Ok(key)
    }

    async fn update(
        &self,
        _ctx: &ExecutionContext,
        kind: EntityKind,
        key: InternalKey,
        editor: RecordEditor,
    ) -> StoreResult<MirroredRecord> {
        let mut guard = self.lock()?;
        let record = guard
            .get_mut(&kind)
            .and_then(|c| c.records.get_mut(&key))
            .ok_or_else(|| StoreError::RecordNotFound(format!("{}/{}", kind.collection(), key)))?;

        // Identity fields survive whatever the editor does
        let (internal_key, external_id, created_at) =
            (record.internal_key, record.external_id.clone(), record.created_at);
        editor(record);
        record.internal_key = internal_key;
        record.kind = kind;
        record.external_id = external_id;
        record.created_at = created_at;

        Ok(record.clone())
    }

    async fn list_all(
        &self,
        _ctx: &ExecutionContext,
        kind: EntityKind,
        filter: &ListFilter,
    ) -> StoreResult<Vec<MirroredRecord>> {
        let guard = self.lock()?;
        let mut records: Vec<MirroredRecord> = guard
            .get(&kind)
            .map(|c| {
                c.records
                    .values()
                    .filter(|r| filter.matches(r))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        records.sort_by(|a, b| a.external_id.cmp(&b.external_id));
        Ok(records)
    }

    async fn reindex_all(&self, _ctx: &ExecutionContext, kind: EntityKind) -> StoreResult<()> {
        tracing::debug!(kind = %kind, "Memory store needs no reindex");
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
