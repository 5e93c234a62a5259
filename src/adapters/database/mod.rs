//! Keyed store abstraction layer
//!
//! This module provides a trait-based abstraction over the store holding
//! mirrored records, with PostgreSQL and in-memory backends.

pub mod factory;
pub mod memory;
pub mod traits;

pub use factory::create_store;
pub use memory::MemoryStore;
pub use traits::{KeyedStore, ListFilter, RecordEditor, StoreResult};
