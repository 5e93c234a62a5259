//! Mirrored record domain model

use super::ids::{ExternalId, InternalKey};
use super::kind::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Local persisted representation of one external entity
///
/// # Examples
///
/// ```
/// use cristin_sync::domain::{EntityKind, ExternalId, InternalKey, MirroredRecord};
/// use serde_json::json;
///
/// let record = MirroredRecord::new(
///     InternalKey::generate(),
///     EntityKind::Persons,
///     ExternalId::new("42").unwrap(),
///     json!({"first_name": "Ada"}),
/// );
///
/// assert!(!record.removed_from_source);
/// assert_eq!(record.node_type(), "no.item.cristin:person");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirroredRecord {
    /// Handle assigned by the store, stable across updates
    pub internal_key: InternalKey,

    /// Collection the record belongs to
    pub kind: EntityKind,

    /// Source identifier, unique within the collection
    pub external_id: ExternalId,

    /// Last payload seen from the source
    pub payload: Value,

    /// Set once the source reports the entity as gone; never unset here
    #[serde(default)]
    pub removed_from_source: bool,

    /// When the record was first created
    pub created_at: DateTime<Utc>,

    /// When the record was last written
    pub updated_at: DateTime<Utc>,
}

impl MirroredRecord {
    /// Creates a fresh, not-removed record
    pub fn new(
        internal_key: InternalKey,
        kind: EntityKind,
        external_id: ExternalId,
        payload: Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            internal_key,
            kind,
            external_id,
            payload,
            removed_from_source: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Node type derived from the record's kind
    pub fn node_type(&self) -> &'static str {
        self.kind.node_type()
    }

    /// Replaces the payload wholesale
    ///
    /// Records already flagged as removed keep their last payload.
    pub fn replace_payload(&mut self, payload: Value) {
        if self.removed_from_source {
            return;
        }
        self.payload = payload;
        self.updated_at = Utc::now();
    }

    /// Flags the record as removed from the source
    ///
    /// The flag is monotonic: once set it stays set.
    pub fn mark_removed(&mut self) {
        if !self.removed_from_source {
            self.removed_from_source = true;
            self.updated_at = Utc::now();
        }
    }
}
