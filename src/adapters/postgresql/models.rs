//! PostgreSQL row models
//!
//! This module maps rows of the `mirrored_records` table to domain records.

use crate::domain::{EntityKind, ExternalId, InternalKey, MirroredRecord, StoreError};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio_postgres::Row;
use uuid::Uuid;

/// Column list shared by every SELECT against `mirrored_records`
pub const RECORD_COLUMNS: &str = "internal_key, kind, external_id, payload, \
     removed_from_source, created_at, updated_at";

/// One row of the `mirrored_records` table
#[derive(Debug, Clone)]
pub struct PostgreSQLRecord {
    pub internal_key: Uuid,
    pub kind: String,
    pub external_id: String,
    pub payload: Value,
    pub removed_from_source: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostgreSQLRecord {
    /// Read a row selected with [`RECORD_COLUMNS`]
    pub fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            internal_key: row
                .try_get("internal_key")
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            kind: row
                .try_get("kind")
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            external_id: row
                .try_get("external_id")
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            payload: row
                .try_get("payload")
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            removed_from_source: row
                .try_get("removed_from_source")
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            created_at: row
                .try_get("created_at")
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            updated_at: row
                .try_get("updated_at")
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
        })
    }

    /// Convert a stored row to the domain record
    pub fn to_domain(self) -> Result<MirroredRecord, StoreError> {
        let kind: EntityKind = self
            .kind
            .parse()
            .map_err(|e: crate::domain::SyncError| StoreError::Serialization(e.to_string()))?;
        let external_id = ExternalId::new(self.external_id).map_err(StoreError::Serialization)?;

        Ok(MirroredRecord {
            internal_key: InternalKey::from_uuid(self.internal_key),
            kind,
            external_id,
            payload: self.payload,
            removed_from_source: self.removed_from_source,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl From<&MirroredRecord> for PostgreSQLRecord {
    fn from(record: &MirroredRecord) -> Self {
        Self {
            internal_key: *record.internal_key.as_uuid(),
            kind: record.kind.short_name().to_string(),
            external_id: record.external_id.as_str().to_string(),
            payload: record.payload.clone(),
            removed_from_source: record.removed_from_source,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_domain_round_trip_keeps_flag() {
        let mut record = MirroredRecord::new(
            InternalKey::generate(),
            EntityKind::ResultContributors,
            ExternalId::new("1234").unwrap(),
            json!({"contributors": []}),
        );
        record.mark_removed();

        let row = PostgreSQLRecord::from(&record);
        assert_eq!(row.kind, "result-contributors");

        let back = row.to_domain().unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_unknown_kind_in_row_is_rejected() {
        let row = PostgreSQLRecord {
            internal_key: Uuid::new_v4(),
            kind: "fundings-old".to_string(),
            external_id: "1".to_string(),
            payload: json!({}),
            removed_from_source: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(row.to_domain(), Err(StoreError::Serialization(_))));
    }
}
