//! External system integrations for cristin-sync.
//!
//! - [`cristin`] - the Cristin REST API, behind the [`cristin::SourceFetcher`] trait
//! - [`database`] - the keyed store abstraction and its in-memory backend
//! - [`postgresql`] - the PostgreSQL backend of the keyed store
//!
//! Engines only see the traits, so tests run against scripted fetchers and
//! [`database::MemoryStore`].
//!
//! ```rust,no_run
//! use cristin_sync::adapters::cristin::{CristinClient, SourceFetcher};
//! use cristin_sync::config::CristinConfig;
//! use cristin_sync::core::context::ExecutionContext;
//! use cristin_sync::domain::EntityKind;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CristinClient::new(CristinConfig::default())?;
//! let person = client
//!     .fetch_one(&ExecutionContext::system(), EntityKind::Persons, "1234")
//!     .await?;
//! println!("{person}");
//! # Ok(())
//! # }
//! ```

pub mod cristin;
pub mod database;
pub mod postgresql;
