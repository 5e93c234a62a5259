//! Cristin API integration
//!
//! This module provides the source side of the sync: the [`SourceFetcher`]
//! trait and its HTTP implementation [`CristinClient`].

pub mod client;
pub mod fetcher;
pub mod models;

pub use client::CristinClient;
pub use fetcher::{ListQuery, Page, SourceFetcher, SourceResult};
pub use models::parse_external_id;
