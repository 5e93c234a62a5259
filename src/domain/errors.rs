//! Domain error types
//!
//! This module defines the error hierarchy for cristin-sync.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main cristin-sync error type
///
/// This is the primary error type used throughout the application.
/// It wraps the source and store error types and provides context for
/// the run-level error policy.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Errors raised by the remote source
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Errors raised by the keyed store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A kind name that does not map to any mirrored collection
    #[error("Unknown entity kind \"{0}\"")]
    UnknownKind(String),

    /// Invalid identifiers or payloads
    #[error("Validation error: {0}")]
    Validation(String),

    /// Task runner and scheduler errors
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl SyncError {
    /// Returns true when the error means the source no longer has the entity
    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::Source(SourceError::NotFound(_)))
    }
}

/// Errors raised while talking to the remote source
///
/// `NotFound` is kept distinct from every other failure: it is the signal
/// for soft-deleting a mirrored record.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The entity does not exist upstream (HTTP 404)
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Failed to connect to the source
    #[error("Failed to connect to source: {0}")]
    ConnectionFailed(String),

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx other than 404)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Invalid response from source: {0}")]
    InvalidResponse(String),
}

impl SourceError {
    /// Returns true for the structured not-found condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound(_))
    }
}

/// Keyed store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with the same external id already exists in the collection
    #[error("Record already exists: {collection}/{external_id}")]
    AlreadyExists {
        collection: String,
        external_id: String,
    },

    /// No record stored under the given internal key
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// Failed to connect to the store
    #[error("Failed to connect to store: {0}")]
    ConnectionFailed(String),

    /// Failed to query records
    #[error("Failed to query records: {0}")]
    QueryFailed(String),

    /// Failed to write a record
    #[error("Failed to write record: {0}")]
    WriteFailed(String),

    /// Stored data could not be (de)serialized
    #[error("Failed to (de)serialize record: {0}")]
    Serialization(String),
}

/// Task runner and scheduler errors
#[derive(Debug, Error)]
pub enum TaskError {
    /// A run for the kind is already in flight
    #[error("A run for \"{0}\" is already in progress")]
    KindBusy(String),

    /// No scheduled job with the given name
    #[error("Scheduled job not found: {0}")]
    JobNotFound(String),

    /// A spawned run panicked or was aborted
    #[error("Task failed to complete: {0}")]
    Join(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::Configuration(format!("TOML parse error: {err}"))
    }
}
