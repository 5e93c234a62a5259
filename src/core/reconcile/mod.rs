//! Incremental reconciliation of stored records against the source

pub mod reconciler;

pub use reconciler::IncrementalReconciler;
