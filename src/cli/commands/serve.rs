//! Serve command implementation
//!
//! Ensures every collection exists, registers the nightly jobs and runs the
//! scheduler until a shutdown signal arrives.

use super::{connect, load, EXIT_CONFIG, EXIT_CONNECTION};
use crate::core::context::ExecutionContext;
use crate::core::schedule::{jobs_from_config, upsert_scheduled_job, JobStore, MemoryJobStore, Scheduler};
use crate::core::tasks::TaskRunner;
use clap::Args;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Ensure collections and register jobs, then exit
    #[arg(long)]
    pub once: bool,
}

impl ServeArgs {
    /// Execute the serve command
    pub async fn execute(
        &self,
        config_path: Option<&Path>,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let config = match load(config_path) {
            Ok(config) => config,
            Err(code) => return Ok(code),
        };
        let requests = match jobs_from_config(&config.schedule) {
            Ok(requests) => requests,
            Err(e) => {
                println!("❌ Invalid schedule: {e}");
                return Ok(EXIT_CONFIG);
            }
        };
        let scheduling = config.schedule.enabled;

        let engine = match connect(config).await {
            Ok(engine) => engine,
            Err(code) => return Ok(code),
        };

        if let Err(e) = engine.ensure_collections(&ExecutionContext::system()).await {
            tracing::error!(error = %e, "Failed to ensure collections");
            println!("❌ Failed to ensure collections: {e}");
            return Ok(EXIT_CONNECTION);
        }

        let jobs: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());
        for request in requests {
            upsert_scheduled_job(jobs.as_ref(), request).await?;
        }
        println!("✅ Collections ready, {} jobs registered", jobs.list().await?.len());

        if self.once {
            return Ok(0);
        }
        if !scheduling {
            tracing::info!("Scheduling disabled, not starting the scheduler");
            println!("   Scheduling is disabled (schedule.enabled = false)");
            return Ok(0);
        }

        let runner = Arc::new(TaskRunner::new(engine).with_cancellation(shutdown_signal.clone()));
        let scheduler = Scheduler::new(jobs, runner);
        scheduler.run(shutdown_signal).await?;

        println!("👋 Scheduler stopped");
        Ok(0)
    }
}
