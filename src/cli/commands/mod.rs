//! CLI command implementations
//!
//! Exit codes: 0 completed, 1 completed with errored or failed records,
//! 2 configuration error, 4 source or store connection failure, 5 fatal.

pub mod import;
pub mod import_all;
pub mod init;
pub mod jobs;
pub mod serve;
pub mod update;
pub mod validate;

use crate::adapters::cristin::CristinClient;
use crate::adapters::database::create_store;
use crate::config::{load_config, resolve_config_path, SyncConfig};
use crate::core::engine::SyncEngine;
use crate::core::progress::LogProgress;
use crate::core::run::RunReport;
use crate::domain::EntityKind;
use std::path::Path;
use std::sync::Arc;

pub const EXIT_OK: i32 = 0;
pub const EXIT_RECORD_ERRORS: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_CONNECTION: i32 = 4;
pub const EXIT_FATAL: i32 = 5;

/// Loads the configuration, printing the problem on failure
pub(crate) fn load(config_path: Option<&Path>) -> Result<SyncConfig, i32> {
    let path = resolve_config_path(config_path);
    load_config(&path).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Failed to load configuration");
        eprintln!("Failed to load configuration {}: {e}", path.display());
        EXIT_CONFIG
    })
}

/// Parses a kind given on the command line
pub(crate) fn parse_kind(raw: &str) -> Result<EntityKind, i32> {
    raw.parse().map_err(|e| {
        tracing::error!(kind = %raw, error = %e, "Unknown kind");
        eprintln!("{e}");
        EXIT_CONFIG
    })
}

/// Connects the source client and the store and checks the store is reachable
pub(crate) async fn connect(config: SyncConfig) -> Result<Arc<SyncEngine>, i32> {
    let fetcher = CristinClient::new(config.cristin.clone()).map_err(|e| {
        tracing::error!(error = %e, "Failed to create Cristin client");
        eprintln!("Failed to create Cristin client: {e}");
        EXIT_CONNECTION
    })?;

    let store = create_store(&config).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to create store");
        eprintln!("Failed to connect to store: {e}");
        EXIT_CONNECTION
    })?;

    if let Err(e) = store.test_connection().await {
        tracing::error!(error = %e, "Store connection test failed");
        eprintln!("Failed to connect to store: {e}");
        return Err(EXIT_CONNECTION);
    }

    Ok(Arc::new(SyncEngine::new(
        Arc::new(fetcher),
        store,
        Arc::new(LogProgress),
        config,
    )))
}

/// Maps a run report to a process exit code
pub fn exit_code(report: &RunReport) -> i32 {
    if !report.is_completed() {
        EXIT_CONNECTION
    } else if report.has_record_errors() {
        EXIT_RECORD_ERRORS
    } else {
        EXIT_OK
    }
}

/// Prints a short human summary of a run
pub(crate) fn print_report(report: &RunReport) {
    use crate::core::run::{RunOutcome, RunTally};

    println!();
    match (&report.outcome, &report.tally) {
        (RunOutcome::Failed { reason }, _) => {
            println!("❌ {} of \"{}\" failed: {reason}", report.mode, report.kind.collection());
        }
        (RunOutcome::Completed, Some(RunTally::Import(t))) => {
            println!("✅ Import to \"{}\" completed", report.kind.collection());
            println!("  Created:   {}", t.created);
            println!("  Modified:  {}", t.modified);
            println!("  Unchanged: {}", t.unchanged);
            println!("  Errors:    {}", t.errored);
        }
        (RunOutcome::Completed, Some(RunTally::Update(t))) => {
            println!("✅ Update of \"{}\" completed", report.kind.collection());
            println!("  Changed:   {}", t.changed);
            println!("  Unchanged: {}", t.unchanged);
            println!("  Removed:   {}", t.removed);
            println!("  Failed:    {}", t.failed);
        }
        (RunOutcome::Completed, None) => {
            println!("✅ {} of \"{}\" completed", report.mode, report.kind.collection());
        }
    }
    println!("  Duration:  {:.1}s", report.duration.as_secs_f64());
    if report.dry_run {
        println!("  (dry run, nothing was written)");
    }
    if report.interrupted {
        println!("⚠️  Interrupted before all records were processed");
    }
    println!();
}
