//! Jobs command implementation
//!
//! Prints the effective job schedule: defaults merged with `[[schedule.jobs]]`,
//! each with its next firing.

use super::{load, EXIT_CONFIG};
use crate::core::schedule::{jobs_from_config, upsert_scheduled_job, JobStore, MemoryJobStore, Scheduler};
use chrono::Utc;
use clap::Args;
use std::path::Path;

/// Arguments for the jobs command
#[derive(Args, Debug)]
pub struct JobsArgs {
    /// Print the jobs as JSON
    #[arg(long)]
    pub json: bool,
}

impl JobsArgs {
    /// Execute the jobs command
    pub async fn execute(&self, config_path: Option<&Path>) -> anyhow::Result<i32> {
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

        let store = MemoryJobStore::new();
        for request in requests {
            upsert_scheduled_job(&store, request).await?;
        }
        let jobs = store.list().await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&jobs)?);
            return Ok(0);
        }

        println!("🗓️  Scheduled jobs (time zone {})", config.schedule.time_zone);
        if !config.schedule.enabled {
            println!("   Scheduling is disabled; serve will not fire these jobs");
        }
        println!();

        let now = Utc::now();
        for job in &jobs {
            let next = Scheduler::next_firing(job, now)
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {:<24} {:<12} {:<8} {:<7} next: {}",
                job.name,
                job.cron,
                job.config.mode(),
                if job.enabled { "enabled" } else { "off" },
                next
            );
            println!("  {:<24} {} (as {})", "", job.description, job.run_as);
        }
        println!();

        Ok(0)
    }
}
