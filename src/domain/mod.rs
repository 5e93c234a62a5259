//! Domain models and types for cristin-sync.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Entity kinds** ([`EntityKind`]) with their static collection mapping
//! - **Strongly-typed identifiers** ([`ExternalId`], [`InternalKey`])
//! - **The mirrored record** ([`MirroredRecord`])
//! - **Error types** ([`SyncError`], [`SourceError`], [`StoreError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! The source's identifier and the store's handle are distinct types:
//!
//! ```rust
//! use cristin_sync::domain::{ExternalId, InternalKey};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let external_id = ExternalId::new("12345")?;
//! let key = InternalKey::generate();
//!
//! // This won't compile - type safety prevents mixing ids
//! // let wrong: ExternalId = key;
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod ids;
pub mod kind;
pub mod record;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{SourceError, StoreError, SyncError, TaskError};
pub use ids::{ExternalId, InternalKey};
pub use kind::{EntityKind, COLLECTION_PREFIX, PLACEHOLDER_IDS};
pub use record::MirroredRecord;
pub use result::Result;
