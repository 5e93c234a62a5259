// cristin-sync - Cristin mirror and reconciliation
// Copyright (c) 2025 Cristin Sync Contributors
// Licensed under the MIT License

//! # cristin-sync
//!
//! Mirrors records from the Cristin research-information API (persons,
//! results, projects, units, institutions, result contributors and funding
//! sources) into a local keyed store, and keeps them current.
//!
//! ## Overview
//!
//! Two engines write to the store:
//!
//! - **Full import** walks the paginated list endpoint of a kind and creates
//!   or updates one record per entry
//! - **Incremental reconciliation** re-fetches every stored record of a kind,
//!   rewrites the ones that drifted and flags the ones Cristin no longer has
//!
//! Reconciliation runs nightly per kind on a cron schedule. Each run reports a
//! tally of what it did.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Engines, scheduling and background runs
//! - [`adapters`] - Cristin API client and store backends
//! - [`domain`] - Entity kinds, mirrored records and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cristin_sync::adapters::cristin::CristinClient;
//! use cristin_sync::adapters::database::MemoryStore;
//! use cristin_sync::config::SyncConfig;
//! use cristin_sync::core::context::ExecutionContext;
//! use cristin_sync::core::engine::SyncEngine;
//! use cristin_sync::core::progress::LogProgress;
//! use cristin_sync::domain::EntityKind;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SyncConfig::default();
//!     let fetcher = Arc::new(CristinClient::new(config.cristin.clone())?);
//!     let engine = SyncEngine::new(fetcher, Arc::new(MemoryStore::new()), Arc::new(LogProgress), config);
//!
//!     let report = engine
//!         .run_import(&ExecutionContext::system(), EntityKind::Units, None)
//!         .await;
//!
//!     if let Some(tally) = report.sync_tally() {
//!         println!("created {}, modified {}", tally.created, tally.modified);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library calls return [`domain::Result`], built on [`domain::SyncError`].
//! Per-record problems never abort a run; they are counted in its tally.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
