//! Update command implementation
//!
//! Reconciles the stored records of one kind in the foreground.

use super::{connect, exit_code, load, parse_kind, print_report};
use crate::core::context::ExecutionContext;
use clap::Args;
use std::path::Path;
use tokio::sync::watch;

/// Arguments for the update command
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Kind to reconcile
    #[arg(short, long)]
    pub kind: String,

    /// Classify records without writing to the store
    #[arg(long)]
    pub dry_run: bool,
}

impl UpdateArgs {
    /// Execute the update command
    pub async fn execute(
        &self,
        config_path: Option<&Path>,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let config = match load(config_path) {
            Ok(config) => config,
            Err(code) => return Ok(code),
        };
        let kind = match parse_kind(&self.kind) {
            Ok(kind) => kind,
            Err(code) => return Ok(code),
        };

        let dry_run = self.dry_run || config.application.dry_run;
        println!("🔄 Updating \"{}\" against Cristin", kind.collection());

        let engine = match connect(config).await {
            Ok(engine) => engine,
            Err(code) => return Ok(code),
        };

        let ctx = ExecutionContext::system()
            .with_dry_run(dry_run)
            .with_cancellation(shutdown_signal);
        let report = engine.run_update(&ctx, kind).await;

        report.log_summary();
        print_report(&report);
        Ok(exit_code(&report))
    }
}
