//! Source fetcher trait definition
//!
//! This module defines the `SourceFetcher` trait that abstracts the remote
//! source. Both engines read the source only through it, which keeps them
//! testable with scripted fetchers.

use crate::core::context::ExecutionContext;
use crate::domain::{EntityKind, SourceError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result type for source operations
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Extra query parameters for a list request
///
/// Kept as ordered pairs so requests are reproducible in logs and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    params: Vec<(String, String)>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one parameter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Query used by full imports: every field of every entry
    pub fn all_fields() -> Self {
        Self::new().with("fields", "all")
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// One page of a list response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Entries on this page
    pub data: Vec<Value>,

    /// Total number of entries across all pages, as reported by the source
    pub total: usize,
}

/// Read access to the remote source
///
/// # Errors
///
/// `fetch_one` must report a missing entity as [`SourceError::NotFound`] and
/// nothing else; the reconciler soft-deletes on that variant alone.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch one entity by its external id
    async fn fetch_one(
        &self,
        ctx: &ExecutionContext,
        kind: EntityKind,
        external_id: &str,
    ) -> SourceResult<Value>;

    /// Fetch one page of a kind's list resource
    ///
    /// Pages are numbered from 1.
    async fn fetch_page(
        &self,
        ctx: &ExecutionContext,
        kind: EntityKind,
        query: &ListQuery,
        page: usize,
        page_size: usize,
    ) -> SourceResult<Page>;

    /// Base URL of the source, for log lines
    fn base_url(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_keeps_order() {
        let query = ListQuery::all_fields().with("institution", "185");
        assert_eq!(
            query.params(),
            &[
                ("fields".to_string(), "all".to_string()),
                ("institution".to_string(), "185".to_string()),
            ]
        );
        assert!(ListQuery::new().is_empty());
    }
}
