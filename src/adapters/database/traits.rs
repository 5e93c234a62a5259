//! Keyed store abstraction
//!
//! This module defines the trait that store backends must implement to hold
//! mirrored records. Both engines talk to the store only through it.

use crate::core::context::ExecutionContext;
use crate::domain::{EntityKind, ExternalId, InternalKey, MirroredRecord, StoreError};
use async_trait::async_trait;
use serde_json::Value;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Pure read-modify-write function applied to one stored record
pub type RecordEditor = Box<dyn FnOnce(&mut MirroredRecord) + Send>;

/// Filter applied when enumerating a collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// External ids that are never returned (collection root placeholders)
    pub exclude_ids: Vec<String>,

    /// Drop records already flagged as removed from the source
    pub exclude_removed: bool,
}

impl ListFilter {
    /// Filter used by reconciliation: skip placeholders and removed records
    pub fn active_records() -> Self {
        Self {
            exclude_ids: crate::domain::PLACEHOLDER_IDS
                .iter()
                .map(|id| id.to_string())
                .collect(),
            exclude_removed: true,
        }
    }

    /// Returns true when the record passes the filter
    pub fn matches(&self, record: &MirroredRecord) -> bool {
        if self.exclude_removed && record.removed_from_source {
            return false;
        }
        !self
            .exclude_ids
            .iter()
            .any(|id| id == record.external_id.as_str())
    }
}

/// Keyed store for mirrored records
///
/// Every call carries the [`ExecutionContext`] of the run issuing it.
/// Records are never physically deleted through this interface.
#[async_trait]
pub trait KeyedStore: Send + Sync {
    /// Test the store connection
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn test_connection(&self) -> StoreResult<()>;

    /// Create the backing storage for a kind if it does not exist
    ///
    /// Idempotent.
    async fn ensure_collection(&self, ctx: &ExecutionContext, kind: EntityKind)
        -> StoreResult<()>;

    /// Look up the internal key of the record with `external_id`
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` when no record of that kind carries the id.
    async fn find_by_external_id(
        &self,
        ctx: &ExecutionContext,
        kind: EntityKind,
        external_id: &ExternalId,
    ) -> StoreResult<Option<InternalKey>>;

    /// Fetch a record by its internal key
    async fn get(
        &self,
        ctx: &ExecutionContext,
        kind: EntityKind,
        key: InternalKey,
    ) -> StoreResult<Option<MirroredRecord>>;

    /// Create a record and return its freshly assigned key
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] when a record with the same
    /// external id already exists for the kind.
    async fn create(
        &self,
        ctx: &ExecutionContext,
        kind: EntityKind,
        external_id: &ExternalId,
        payload: Value,
    ) -> StoreResult<InternalKey>;

    /// Apply `editor` to the stored record atomically
    ///
    /// Concurrent updates of the same key are serialized by the backend.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RecordNotFound`] when the key is unknown.
    async fn update(
        &self,
        ctx: &ExecutionContext,
        kind: EntityKind,
        key: InternalKey,
        editor: RecordEditor,
    ) -> StoreResult<MirroredRecord>;

    /// Every record of a kind that passes `filter`, ordered by external id
    async fn list_all(
        &self,
        ctx: &ExecutionContext,
        kind: EntityKind,
        filter: &ListFilter,
    ) -> StoreResult<Vec<MirroredRecord>>;

    /// Best-effort refresh of the backend's indexes for a kind
    async fn reindex_all(&self, ctx: &ExecutionContext, kind: EntityKind) -> StoreResult<()>;

    /// Human-readable backend name used in log lines
    fn backend_name(&self) -> &str;
}
