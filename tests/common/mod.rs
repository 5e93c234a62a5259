//! Shared fixtures for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use cristin_sync::adapters::cristin::{ListQuery, Page, SourceFetcher, SourceResult};
use cristin_sync::adapters::database::{
    KeyedStore, ListFilter, MemoryStore, RecordEditor, StoreResult,
};
use cristin_sync::core::context::ExecutionContext;
use cristin_sync::domain::{EntityKind, ExternalId, InternalKey, MirroredRecord, SourceError, StoreError};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// What the scripted source answers for one entity
#[derive(Debug, Clone)]
pub enum Detail {
    Found(Value),
    Missing,
    Unavailable,
}

/// In-process stand-in for the Cristin API
///
/// Serves `list` in pages of the requested size and answers detail requests
/// from `details`. Every call is recorded.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    list: Vec<Value>,
    total: Option<usize>,
    failing_page: Option<usize>,
    details: HashMap<String, Detail>,
    pages_requested: Mutex<Vec<usize>>,
    details_requested: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list(mut self, list: Vec<Value>) -> Self {
        self.list = list;
        self
    }

    /// Overrides the total reported with every page
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    /// Answers a 502 for `page` and every page after it
    pub fn with_failing_page(mut self, page: usize) -> Self {
        self.failing_page = Some(page);
        self
    }

    pub fn with_detail(mut self, external_id: &str, detail: Detail) -> Self {
        self.details.insert(external_id.to_string(), detail);
        self
    }

    pub fn pages_requested(&self) -> Vec<usize> {
        self.pages_requested.lock().unwrap().clone()
    }

    pub fn details_requested(&self) -> Vec<String> {
        self.details_requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceFetcher for ScriptedSource {
    async fn fetch_one(
        &self,
        _ctx: &ExecutionContext,
        _kind: EntityKind,
        external_id: &str,
    ) -> SourceResult<Value> {
        self.details_requested
            .lock()
            .unwrap()
            .push(external_id.to_string());

        match self.details.get(external_id) {
            Some(Detail::Found(value)) => Ok(value.clone()),
            Some(Detail::Unavailable) => Err(SourceError::ServerError {
                status: 503,
                message: "Service Unavailable".to_string(),
            }),
            Some(Detail::Missing) | None => Err(SourceError::NotFound(external_id.to_string())),
        }
    }

    async fn fetch_page(
        &self,
        _ctx: &ExecutionContext,
        _kind: EntityKind,
        _query: &ListQuery,
        page: usize,
        page_size: usize,
    ) -> SourceResult<Page> {
        self.pages_requested.lock().unwrap().push(page);

        if self.failing_page.is_some_and(|failing| page >= failing) {
            return Err(SourceError::ServerError {
                status: 502,
                message: "Bad Gateway".to_string(),
            });
        }

        let data = self
            .list
            .iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .cloned()
            .collect();

        Ok(Page {
            data,
            total: self.total.unwrap_or(self.list.len()),
        })
    }

    fn base_url(&self) -> &str {
        "scripted://cristin"
    }
}

/// Memory store that fails the writes and listings it is told to
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: Arc<MemoryStore>,
    failing_creates: HashSet<String>,
    failing_list: bool,
}

impl FaultyStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// `create` of this external id fails with a write error
    pub fn failing_create(mut self, external_id: &str) -> Self {
        self.failing_creates.insert(external_id.to_string());
        self
    }

    /// `list_all` fails with a query error
    pub fn failing_list(mut self) -> Self {
        self.failing_list = true;
        self
    }
}

#[async_trait]
impl KeyedStore for FaultyStore {
    async fn test_connection(&self) -> StoreResult<()> {
        self.inner.test_connection().await
    }

    async fn ensure_collection(&self, ctx: &ExecutionContext, kind: EntityKind) -> StoreResult<()> {
        self.inner.ensure_collection(ctx, kind).await
    }

    async fn find_by_external_id(
        &self,
        ctx: &ExecutionContext,
        kind: EntityKind,
        external_id: &ExternalId,
    ) -> StoreResult<Option<InternalKey>> {
        self.inner.find_by_external_id(ctx, kind, external_id).await
    }

    async fn get(
        &self,
        ctx: &ExecutionContext,
        kind: EntityKind,
        key: InternalKey,
    ) -> StoreResult<Option<MirroredRecord>> {
        self.inner.get(ctx, kind, key).await
    }

    async fn create(
        &self,
        ctx: &ExecutionContext,
        kind: EntityKind,
        external_id: &ExternalId,
        payload: Value,
    ) -> StoreResult<InternalKey> {
        if self.failing_creates.contains(external_id.as_str()) {
            return Err(StoreError::WriteFailed(format!("disk full writing {external_id}")));
        }
        self.inner.create(ctx, kind, external_id, payload).await
    }

    async fn update(
        &self,
        ctx: &ExecutionContext,
        kind: EntityKind,
        key: InternalKey,
        editor: RecordEditor,
    ) -> StoreResult<MirroredRecord> {
        self.inner.update(ctx, kind, key, editor).await
    }

    async fn list_all(
        &self,
        ctx: &ExecutionContext,
        kind: EntityKind,
        filter: &ListFilter,
    ) -> StoreResult<Vec<MirroredRecord>> {
        if self.failing_list {
            return Err(StoreError::QueryFailed("connection reset".to_string()));
        }
        self.inner.list_all(ctx, kind, filter).await
    }

    async fn reindex_all(&self, ctx: &ExecutionContext, kind: EntityKind) -> StoreResult<()> {
        self.inner.reindex_all(ctx, kind).await
    }

    fn backend_name(&self) -> &str {
        "faulty-memory"
    }
}

/// Seeds one record directly into the store
pub async fn seed(store: &MemoryStore, kind: EntityKind, external_id: &str, payload: Value) -> InternalKey {
    store
        .create(
            &ExecutionContext::system(),
            kind,
            &ExternalId::new(external_id).unwrap(),
            payload,
        )
        .await
        .unwrap()
}

/// `count` person list entries with ids 1..=count
pub fn persons(count: usize) -> Vec<Value> {
    (1..=count)
        .map(|i| serde_json::json!({"cristin_person_id": i.to_string(), "name": format!("P{i}")}))
        .collect()
}
