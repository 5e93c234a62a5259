//! Full imports
//!
//! - [`plan`] - where the list comes from and how entries become payloads
//! - [`pagination`] - the paginated full fetch
//! - [`importer`] - classification and writes

pub mod importer;
pub mod pagination;
pub mod plan;

pub use importer::{BulkImporter, ImportSettings};
pub use pagination::{fetch_all_pages, fetch_single_page};
pub use plan::{ImportPlan, ListSource};
