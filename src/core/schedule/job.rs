//! Scheduled jobs and their store

use crate::config::{JobSpec, JobType, ScheduleConfig};
use crate::core::context::Principal;
use crate::core::run::RunMode;
use crate::core::schedule::cron::CronSchedule;
use crate::domain::{EntityKind, Result, SyncError, TaskError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Descriptor of the incremental reconciliation task
pub const DESCRIPTOR_UPDATE: &str = "no.item.cristin:update-cristin-repo";

/// Descriptor of the full import task
pub const DESCRIPTOR_IMPORT: &str = "no.item.cristin:import-cristin-repo";

/// What a job runs
///
/// The kind is kept as text; it is resolved when the job fires, and an
/// unknown name fails that run with [`SyncError::UnknownKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JobConfig {
    Update {
        kind: String,
    },
    Import {
        kind: String,
        #[serde(default)]
        institution: Option<String>,
    },
}

impl JobConfig {
    pub fn update(kind: EntityKind) -> Self {
        JobConfig::Update {
            kind: kind.short_name().to_string(),
        }
    }

    pub fn import(kind: EntityKind, institution: Option<String>) -> Self {
        JobConfig::Import {
            kind: kind.short_name().to_string(),
            institution,
        }
    }

    pub fn kind_name(&self) -> &str {
        match self {
            JobConfig::Update { kind } | JobConfig::Import { kind, .. } => kind,
        }
    }

    /// Resolves the kind name
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::UnknownKind`] for a name that maps to no collection.
    pub fn entity_kind(&self) -> Result<EntityKind> {
        self.kind_name().parse()
    }

    pub fn mode(&self) -> RunMode {
        match self {
            JobConfig::Update { .. } => RunMode::Update,
            JobConfig::Import { .. } => RunMode::Import,
        }
    }

    pub fn institution(&self) -> Option<&str> {
        match self {
            JobConfig::Update { .. } => None,
            JobConfig::Import { institution, .. } => institution.as_deref(),
        }
    }
}

/// A named job on a daily cron cadence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub name: String,
    pub description: String,
    pub descriptor: String,
    pub cron: String,
    pub time_zone: String,
    pub enabled: bool,
    pub run_as: Principal,
    pub config: JobConfig,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Parameters of [`upsert_scheduled_job`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub name: String,
    pub description: String,
    pub descriptor: String,
    pub cron: String,
    pub time_zone: String,
    pub enabled: bool,
    /// `None` keeps the stored principal, or uses the system user on create
    pub run_as: Option<Principal>,
    pub config: JobConfig,
}

impl JobRequest {
    /// Reconciliation job for `kind` with the standard description
    pub fn update(name: impl Into<String>, kind: EntityKind, cron: &str, time_zone: &str) -> Self {
        Self {
            name: name.into(),
            description: format!("Update Cristin Repo \"{}\"", kind.collection()),
            descriptor: DESCRIPTOR_UPDATE.to_string(),
            cron: cron.to_string(),
            time_zone: time_zone.to_string(),
            enabled: true,
            run_as: None,
            config: JobConfig::update(kind),
        }
    }

    /// Builds a request from a `[[schedule.jobs]]` entry
    pub fn from_spec(spec: &JobSpec, time_zone: &str) -> Result<Self> {
        let collection = spec
            .kind
            .parse::<EntityKind>()
            .map(|kind| kind.collection().to_string())
            .unwrap_or_else(|_| spec.kind.clone());

        let (config, descriptor, default_description) = match spec.job_type {
            JobType::Update => (
                JobConfig::Update {
                    kind: spec.kind.clone(),
                },
                DESCRIPTOR_UPDATE,
                format!("Update Cristin Repo \"{collection}\""),
            ),
            JobType::Import => (
                JobConfig::Import {
                    kind: spec.kind.clone(),
                    institution: spec.institution.clone(),
                },
                DESCRIPTOR_IMPORT,
                format!("Import Cristin Repo \"{collection}\""),
            ),
        };

        let run_as = spec
            .run_as
            .as_deref()
            .map(str::parse::<Principal>)
            .transpose()
            .map_err(|e| SyncError::Configuration(format!("schedule.jobs '{}': {}", spec.name, e)))?;

        Ok(Self {
            name: spec.name.clone(),
            description: spec.description.clone().unwrap_or(default_description),
            descriptor: descriptor.to_string(),
            cron: spec.cron.clone(),
            time_zone: time_zone.to_string(),
            enabled: spec.enabled,
            run_as,
            config,
        })
    }
}

/// The nightly reconciliation jobs
pub fn default_jobs(time_zone: &str) -> Vec<JobRequest> {
    vec![
        JobRequest::update("import-persons", EntityKind::Persons, "30 0 * * *", time_zone),
        JobRequest::update("import-institutions", EntityKind::Institutions, "0 1 * * *", time_zone),
        JobRequest::update("import-projects", EntityKind::Projects, "30 1 * * *", time_zone),
        JobRequest::update("import-units", EntityKind::Units, "0 2 * * *", time_zone),
        JobRequest::update("import-results", EntityKind::Results, "30 2 * * *", time_zone),
    ]
}

/// Effective job list: the defaults, then configured jobs replacing or
/// extending them by name
pub fn jobs_from_config(config: &ScheduleConfig) -> Result<Vec<JobRequest>> {
    let mut jobs = if config.include_defaults {
        default_jobs(&config.time_zone)
    } else {
        Vec::new()
    };

    for spec in &config.jobs {
        let request = JobRequest::from_spec(spec, &config.time_zone)?;
        match jobs.iter_mut().find(|job| job.name == request.name) {
            Some(existing) => *existing = request,
            None => jobs.push(request),
        }
    }

    Ok(jobs)
}

/// Edits a stored job in place
pub type JobEditor = Box<dyn FnOnce(ScheduledJob) -> ScheduledJob + Send>;

/// Persistence of scheduled jobs
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<ScheduledJob>>;

    async fn create(&self, job: ScheduledJob) -> Result<ScheduledJob>;

    /// # Errors
    ///
    /// Returns [`TaskError::JobNotFound`] when no job has the name.
    async fn modify(&self, name: &str, editor: JobEditor) -> Result<ScheduledJob>;

    /// Every job, ordered by name
    async fn list(&self) -> Result<Vec<ScheduledJob>>;
}

/// Process-local job store
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: Mutex<BTreeMap<String, ScheduledJob>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, ScheduledJob>>> {
        self.jobs
            .lock()
            .map_err(|_| SyncError::Other("job store lock poisoned".to_string()))
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn get(&self, name: &str) -> Result<Option<ScheduledJob>> {
        Ok(self.lock()?.get(name).cloned())
    }

    async fn create(&self, job: ScheduledJob) -> Result<ScheduledJob> {
        self.lock()?.insert(job.name.clone(), job.clone());
        Ok(job)
    }

    async fn modify(&self, name: &str, editor: JobEditor) -> Result<ScheduledJob> {
        let mut jobs = self.lock()?;
        let current = jobs
            .remove(name)
            .ok_or_else(|| TaskError::JobNotFound(name.to_string()))?;
        let mut edited = editor(current);
        // Jobs are keyed by name; an editor cannot rename one
        edited.name = name.to_string();
        jobs.insert(name.to_string(), edited.clone());
        Ok(edited)
    }

    async fn list(&self) -> Result<Vec<ScheduledJob>> {
        Ok(self.lock()?.values().cloned().collect())
    }
}

/// Creates the job, or updates the stored one
///
/// An update replaces description, descriptor, schedule and the enabled
/// flag. The stored principal is kept unless the request names one; the
/// job's config is left as stored.
///
/// # Errors
///
/// Returns a configuration error for an unparsable cron expression.
pub async fn upsert_scheduled_job(store: &dyn JobStore, request: JobRequest) -> Result<ScheduledJob> {
    let schedule = CronSchedule::parse(&request.cron)
        .map_err(|e| SyncError::Configuration(format!("Job '{}': {}", request.name, e)))?;

    let job = match store.get(&request.name).await? {
        None => {
            let now = Utc::now();
            store
                .create(ScheduledJob {
                    name: request.name,
                    description: request.description,
                    descriptor: request.descriptor,
                    cron: schedule.expression().to_string(),
                    time_zone: request.time_zone,
                    enabled: request.enabled,
                    run_as: request.run_as.unwrap_or_else(Principal::system_su),
                    config: request.config,
                    created_at: now,
                    modified_at: now,
                })
                .await?
        }
        Some(_) => {
            let name = request.name.clone();
            let cron = schedule.expression().to_string();
            store
                .modify(
                    &name,
                    Box::new(move |stored: ScheduledJob| ScheduledJob {
                        description: request.description,
                        descriptor: request.descriptor,
                        cron,
                        time_zone: request.time_zone,
                        enabled: request.enabled,
                        run_as: request.run_as.unwrap_or(stored.run_as),
                        modified_at: Utc::now(),
                        ..stored
                    }),
                )
                .await?
        }
    };

    if job.enabled {
        tracing::info!(
            job = %job.name,
            cron = %job.cron,
            "Scheduled job at {} named \"{}\"",
            schedule.time_label(),
            job.name
        );
    } else {
        tracing::info!(job = %job.name, "Disabled scheduled job \"{}\"", job.name);
    }

    Ok(job)
}
