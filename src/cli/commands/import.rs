//! Import command implementation
//!
//! Runs one full paginated import in the foreground.

use super::{connect, exit_code, load, parse_kind, print_report, EXIT_CONFIG};
use crate::core::context::ExecutionContext;
use crate::core::import::ImportPlan;
use clap::Args;
use std::path::Path;
use tokio::sync::watch;

/// Arguments for the import command
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Kind to import (persons, results, projects, units, institutions, ...)
    #[arg(short, long)]
    pub kind: String,

    /// Institution filter; required for results and result-contributors unless `import.institution` is set
    #[arg(short, long)]
    pub institution: Option<String>,

    /// Classify records without writing to the store
    #[arg(long)]
    pub dry_run: bool,
}

impl ImportArgs {
    /// Execute the import command
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

        let plan = ImportPlan::for_kind(kind, &config.import);
        let institution = self
            .institution
            .clone()
            .or_else(|| config.import.institution.clone());
        if plan.requires_institution() && institution.is_none() {
            println!("❌ Importing {} requires an institution", kind.collection());
            println!("   Pass --institution or set import.institution");
            return Ok(EXIT_CONFIG);
        }

        let dry_run = self.dry_run || config.application.dry_run;
        tracing::info!(kind = %kind, dry_run, "Starting import");
        println!("📥 Importing \"{}\" from Cristin", kind.collection());

        let engine = match connect(config).await {
            Ok(engine) => engine,
            Err(code) => return Ok(code),
        };

        let ctx = ExecutionContext::system()
            .with_dry_run(dry_run)
            .with_cancellation(shutdown_signal);
        let report = engine.run_import(&ctx, kind, institution.as_deref()).await;

        report.log_summary();
        print_report(&report);
        Ok(exit_code(&report))
    }
}
