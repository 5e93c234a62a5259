//! Job scheduling
//!
//! - [`cron`] - cron expressions and job time zones
//! - [`job`] - scheduled jobs, their store and the upsert operation
//! - [`scheduler`] - the loop that fires due jobs

pub mod cron;
pub mod job;
pub mod scheduler;

pub use cron::{parse_time_zone, CronSchedule, JobTimeZone};
pub use job::{
    default_jobs, jobs_from_config, upsert_scheduled_job, JobConfig, JobRequest, JobStore,
    MemoryJobStore, ScheduledJob,
};
pub use scheduler::Scheduler;
