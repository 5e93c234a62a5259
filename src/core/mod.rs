//! Core business logic for cristin-sync.
//!
//! # Modules
//!
//! - [`compare`] - payload equality tolerant of index artifacts
//! - [`context`] - principal, branch and cancellation threaded into every call
//! - [`import`] - full paginated imports
//! - [`reconcile`] - incremental per-record reconciliation
//! - [`schedule`] - cron jobs and the scheduler loop
//! - [`tasks`] - background runs, one per kind
//! - [`engine`] - dispatch from a job to the right engine
//! - [`tally`], [`run`], [`progress`] - what a run reports
//!
//! # Example
//!
//! ```rust,no_run
//! use cristin_sync::adapters::cristin::CristinClient;
//! use cristin_sync::adapters::database::create_store;
//! use cristin_sync::config::load_config;
//! use cristin_sync::core::context::ExecutionContext;
//! use cristin_sync::core::engine::SyncEngine;
//! use cristin_sync::core::progress::LogProgress;
//! use cristin_sync::domain::EntityKind;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("cristin-sync.toml")?;
//! let fetcher = Arc::new(CristinClient::new(config.cristin.clone())?);
//! let store = create_store(&config).await?;
//!
//! let engine = SyncEngine::new(fetcher, store, Arc::new(LogProgress), config);
//! let report = engine
//!     .run_update(&ExecutionContext::system(), EntityKind::Persons)
//!     .await;
//!
//! report.log_summary();
//! # Ok(())
//! # }
//! ```

pub mod compare;
pub mod context;
pub mod engine;
pub mod import;
pub mod progress;
pub mod reconcile;
pub mod run;
pub mod schedule;
pub mod tally;
pub mod tasks;
