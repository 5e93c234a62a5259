//! Cron loop
//!
//! Sleeps until the next enabled job is due, submits it to the task runner
//! and repeats until shutdown. Jobs are re-read from the store on every
//! wake-up, so upserts made while the loop runs take effect at the next one.

use crate::core::schedule::cron::{parse_time_zone, CronSchedule};
use crate::core::schedule::job::{JobStore, ScheduledJob};
use crate::core::tasks::TaskRunner;
use crate::domain::{Result, SyncError, TaskError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;

/// Runs scheduled jobs on their cron cadence
pub struct Scheduler {
    jobs: Arc<dyn JobStore>,
    runner: Arc<TaskRunner>,
}

impl Scheduler {
    pub fn new(jobs: Arc<dyn JobStore>, runner: Arc<TaskRunner>) -> Self {
        Self { jobs, runner }
    }

    /// Next firing of a job, or `None` when it is disabled or unparsable
    pub fn next_firing(job: &ScheduledJob, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if !job.enabled {
            return None;
        }

        let schedule = match CronSchedule::parse(&job.cron) {
            Ok(schedule) => schedule,
            Err(e) => {
                tracing::warn!(job = %job.name, error = %e, "Skipping job with invalid cron");
                return None;
            }
        };
        let tz = match parse_time_zone(&job.time_zone) {
            Ok(tz) => tz,
            Err(e) => {
                tracing::warn!(job = %job.name, error = %e, "Skipping job with invalid time zone");
                return None;
            }
        };

        schedule.next_after(after, &tz)
    }

    /// Jobs due at the earliest upcoming firing, with that instant
    pub fn next_due(
        jobs: &[ScheduledJob],
        after: DateTime<Utc>,
    ) -> Option<(DateTime<Utc>, Vec<ScheduledJob>)> {
        let firings: Vec<(DateTime<Utc>, &ScheduledJob)> = jobs
            .iter()
            .filter_map(|job| Self::next_firing(job, after).map(|at| (at, job)))
            .collect();

        let earliest = firings.iter().map(|(at, _)| *at).min()?;
        let due = firings
            .into_iter()
            .filter(|(at, _)| *at == earliest)
            .map(|(_, job)| job.clone())
            .collect();

        Some((earliest, due))
    }

    /// Runs until `true` is sent on `shutdown` or its sender is dropped
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        tracing::info!("Scheduler started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let jobs = self.jobs.list().await?;
            let now = Utc::now();

            let Some((at, due)) = Self::next_due(&jobs, now) else {
                tracing::info!("No enabled jobs, waiting for shutdown");
                let _ = shutdown.changed().await;
                break;
            };

            let wait = (at - now).to_std().unwrap_or_default();
            tracing::debug!(
                next_run = %at,
                jobs = due.len(),
                wait_secs = wait.as_secs(),
                "Sleeping until next job"
            );

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    for job in &due {
                        self.fire(job);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Scheduler stopped");
        Ok(())
    }

    /// Submits one job; the run proceeds in the background
    fn fire(&self, job: &ScheduledJob) {
        match self.runner.submit(job.config.clone(), job.run_as.clone()) {
            Ok(task) => {
                tracing::info!(
                    job = %job.name,
                    task_id = %task.ack.task_id,
                    kind = %task.ack.kind,
                    "Started scheduled job"
                );
            }
            Err(SyncError::Task(TaskError::KindBusy(kind))) => {
                tracing::warn!(job = %job.name, kind = %kind, "Previous run still in progress, skipping");
            }
            Err(e) => {
                tracing::error!(job = %job.name, error = %e, "Failed to start scheduled job");
            }
        }
    }
}
