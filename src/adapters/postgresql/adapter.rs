//! PostgreSQL keyed store
//!
//! All kinds share the `mirrored_records` table, partitioned logically by the
//! `kind` column. `(kind, external_id)` is unique, and `update` locks the row
//! with `SELECT ... FOR UPDATE` inside a transaction.

use crate::adapters::database::traits::{KeyedStore, ListFilter, RecordEditor, StoreResult};
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::adapters::postgresql::models::{PostgreSQLRecord, RECORD_COLUMNS};
use crate::core::context::ExecutionContext;
use crate::domain::{EntityKind, ExternalId, InternalKey, MirroredRecord, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tokio_postgres::error::SqlState;
use uuid::Uuid;

/// PostgreSQL implementation of [`KeyedStore`]
pub struct PostgreSQLStore {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLStore {
    /// Create a new PostgreSQL store
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Create a new PostgreSQL store with an Arc-wrapped client
    pub fn new_with_arc(client: Arc<PostgreSQLClient>) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }
}

#[async_trait]
impl KeyedStore for PostgreSQLStore {
    async fn test_connection(&self) -> StoreResult<()> {
        self.client.test_connection().await
    }

    async fn ensure_collection(
        &self,
        _ctx: &ExecutionContext,
        kind: EntityKind,
    ) -> StoreResult<()> {
        // One table serves every collection; creating it is the whole job
        self.client.ensure_schema().await?;
        tracing::debug!(collection = kind.collection(), "Collection ready");
        Ok(())
    }

    async fn find_by_external_id(
        &self,
        _ctx: &ExecutionContext,
        kind: EntityKind,
        external_id: &ExternalId,
    ) -> StoreResult<Option<InternalKey>> {
        let rows = self
            .client
            .query(
                "SELECT internal_key FROM mirrored_records WHERE kind = $1 AND external_id = $2",
                &[&kind.short_name(), &external_id.as_str()],
            )
            .await?;

        match rows.first() {
            Some(row) => {
                let key: Uuid = row
                    .try_get("internal_key")
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(InternalKey::from_uuid(key)))
            }
            None => Ok(None),
        }
    }

    async fn get(
        &self,
        _ctx: &ExecutionContext,
        kind: EntityKind,
        key: InternalKey,
    ) -> StoreResult<Option<MirroredRecord>> {
        let query = format!(
            "SELECT {RECORD_COLUMNS} FROM mirrored_records WHERE kind = $1 AND internal_key = $2"
        );
        let rows = self
            .client
            .query(&query, &[&kind.short_name(), key.as_uuid()])
            .await?;

        rows.first()
            .map(|row| PostgreSQLRecord::from_row(row)?.to_domain())
            .transpose()
    }

    async fn create(
        &self,
        _ctx: &ExecutionContext,
        kind: EntityKind,
        external_id: &ExternalId,
        payload: Value,
    ) -> StoreResult<InternalKey> {
        let key = InternalKey::generate();
        let now = Utc::now();

        let insert = r#"
            INSERT INTO mirrored_records (
                internal_key, kind, collection, external_id, node_type,
                payload, removed_from_source, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7, $7)
        "#;

        let conn = self.client.get_connection().await?;
        let result = conn
            .execute(
                insert,
                &[
                    key.as_uuid(),
                    &kind.short_name(),
                    &kind.collection(),
                    &external_id.as_str(),
                    &kind.node_type(),
                    &payload,
                    &now,
                ],
            )
            .await;

        match result {
            Ok(_) => Ok(key),
            Err(e) if e.code() == Some(&SqlState::UNIQUE_VIOLATION) => {
                Err(StoreError::AlreadyExists {
                    collection: kind.collection().to_string(),
                    external_id: external_id.to_string(),
                })
            }
            Err(e) => Err(StoreError::WriteFailed(e.to_string())),
        }
    }

    async fn update(
        &self,
        _ctx: &ExecutionContext,
        kind: EntityKind,
        key: InternalKey,
        editor: RecordEditor,
    ) -> StoreResult<MirroredRecord> {
        let mut conn = self.client.get_connection().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| StoreError::WriteFailed(format!("Failed to begin transaction: {e}")))?;

        let select = format!(
            "SELECT {RECORD_COLUMNS} FROM mirrored_records \
             WHERE kind = $1 AND internal_key = $2 FOR UPDATE"
        );
        let rows = tx
            .query(&select, &[&kind.short_name(), key.as_uuid()])
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        let row = rows
            .first()
            .ok_or_else(|| StoreError::RecordNotFound(format!("{}/{}", kind.collection(), key)))?;
        let stored = PostgreSQLRecord::from_row(row)?.to_domain()?;
        let mut record = stored.clone();

        editor(&mut record);

        // Identity columns are never written back
        let edited = PostgreSQLRecord::from(&record);
        tx.execute(
            "UPDATE mirrored_records \
             SET payload = $1, removed_from_source = $2, updated_at = $3 \
             WHERE internal_key = $4",
            &[
                &edited.payload,
                &edited.removed_from_source,
                &edited.updated_at,
                key.as_uuid(),
            ],
        )
        .await
        .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::WriteFailed(format!("Failed to commit transaction: {e}")))?;

        Ok(MirroredRecord {
            internal_key: stored.internal_key,
            kind: stored.kind,
            external_id: stored.external_id,
            created_at: stored.created_at,
            ..record
        })
    }

    async fn list_all(
        &self,
        _ctx: &ExecutionContext,
        kind: EntityKind,
        filter: &ListFilter,
    ) -> StoreResult<Vec<MirroredRecord>> {
        let query = format!(
            "SELECT {RECORD_COLUMNS} FROM mirrored_records \
             WHERE kind = $1 \
               AND NOT (external_id = ANY($2)) \
               AND (NOT $3 OR removed_from_source = FALSE) \
             ORDER BY external_id"
        );

        let rows = self
            .client
            .query(
                &query,
                &[&kind.short_name(), &filter.exclude_ids, &filter.exclude_removed],
            )
            .await?;

        let records = rows
            .iter()
            .map(|row| PostgreSQLRecord::from_row(row)?.to_domain())
            .collect::<StoreResult<Vec<_>>>()?;

        tracing::debug!(
            kind = %kind,
            count = records.len(),
            "Listed records from PostgreSQL"
        );

        Ok(records)
    }

    async fn reindex_all(&self, _ctx: &ExecutionContext, kind: EntityKind) -> StoreResult<()> {
        self.client
            .execute("ANALYZE mirrored_records", &[])
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Reindex failed: {e}")))?;

        tracing::debug!(kind = %kind, "Refreshed PostgreSQL statistics");
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "postgresql"
    }
}
