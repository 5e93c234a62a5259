//! Identifier types for mirrored records
//!
//! Newtype wrappers keep the source system's identifier and the store's
//! internal handle from being mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier assigned by the source system
///
/// Stable and immutable; used as the lookup key and as the record's local
/// name inside its collection.
///
/// # Examples
///
/// ```
/// use cristin_sync::domain::ids::ExternalId;
/// use std::str::FromStr;
///
/// let id = ExternalId::from_str("12345").unwrap();
/// assert_eq!(id.as_str(), "12345");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExternalId(String);

impl ExternalId {
    /// Creates a new ExternalId from a string
    ///
    /// Surrounding whitespace is trimmed; an empty id is rejected.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err("External ID cannot be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Builds an ExternalId from a JSON scalar
    ///
    /// The source returns ids as strings for some kinds and as numbers for
    /// others; both map to the same textual id.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, String> {
        match value {
            serde_json::Value::String(s) => Self::new(s.as_str()),
            serde_json::Value::Number(n) => Self::new(n.to_string()),
            other => Err(format!("External ID must be a string or number, got {other}")),
        }
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExternalId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ExternalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Opaque handle assigned by the keyed store
///
/// Identifies a stored record independently of its external id and stays
/// stable across updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InternalKey(Uuid);

impl InternalKey {
    /// Generates a fresh key
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for InternalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for InternalKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid internal key '{s}': {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_external_id_trims_and_rejects_empty() {
        assert_eq!(ExternalId::new("  42 ").unwrap().as_str(), "42");
        assert!(ExternalId::new("").is_err());
        assert!(ExternalId::new("   ").is_err());
    }

    #[test]
    fn test_external_id_from_json() {
        assert_eq!(ExternalId::from_json(&json!("abc")).unwrap().as_str(), "abc");
        assert_eq!(ExternalId::from_json(&json!(9001)).unwrap().as_str(), "9001");
        assert!(ExternalId::from_json(&json!(null)).is_err());
        assert!(ExternalId::from_json(&json!({"id": 1})).is_err());
    }

    #[test]
    fn test_internal_key_round_trips_through_text() {
        let key = InternalKey::generate();
        let parsed = InternalKey::from_str(&key.to_string()).unwrap();
        assert_eq!(key, parsed);
        assert!(InternalKey::from_str("not-a-uuid").is_err());
    }
}
