//! PostgreSQL store integration
//!
//! This module provides the PostgreSQL backend of the keyed store.

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgreSQLStore;
pub use client::PostgreSQLClient;
pub use models::PostgreSQLRecord;
