//! Background task runner
//!
//! Runs are spawned on the tokio runtime. At most one run per kind is in
//! flight; a second submission for a busy kind is refused.

use crate::core::context::{ExecutionContext, Principal};
use crate::core::engine::SyncEngine;
use crate::core::run::RunReport;
use crate::core::schedule::JobConfig;
use crate::domain::{EntityKind, Result, TaskError};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Message returned when an out-of-band import is started
pub const IMPORT_STARTED_MESSAGE: &str = "Started tasks to import from Cristin...";

/// Acknowledgement of a submitted run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskAck {
    pub task_id: Uuid,
    pub kind: EntityKind,
    pub message: String,
}

/// A spawned run
pub struct SubmittedTask {
    pub ack: TaskAck,
    handle: JoinHandle<Option<RunReport>>,
}

impl SubmittedTask {
    /// Waits for the run to finish
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Join`] if the run panicked or was aborted.
    pub async fn wait(self) -> Result<Option<RunReport>> {
        self.handle
            .await
            .map_err(|e| TaskError::Join(e.to_string()).into())
    }
}

type InFlight = Arc<Mutex<HashSet<EntityKind>>>;

/// Releases a kind when its run ends, however it ends
struct KindGuard {
    kind: EntityKind,
    in_flight: InFlight,
}

impl Drop for KindGuard {
    fn drop(&mut self) {
        if let Ok(mut kinds) = self.in_flight.lock() {
            kinds.remove(&self.kind);
        }
    }
}

/// Spawns runs, one per kind at a time
pub struct TaskRunner {
    engine: Arc<SyncEngine>,
    in_flight: InFlight,
    cancel: Option<watch::Receiver<bool>>,
    dry_run: bool,
}

impl TaskRunner {
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        let dry_run = engine.config().application.dry_run;
        Self {
            engine,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            cancel: None,
            dry_run,
        }
    }

    /// Runs stop between records once `true` is sent on the channel
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    /// Kinds with a run in flight
    pub fn busy_kinds(&self) -> Vec<EntityKind> {
        let mut kinds: Vec<_> = self
            .in_flight
            .lock()
            .map(|k| k.iter().copied().collect())
            .unwrap_or_default();
        kinds.sort();
        kinds
    }

    fn context(&self, principal: Principal) -> ExecutionContext {
        let ctx = ExecutionContext::new(principal).with_dry_run(self.dry_run);
        match &self.cancel {
            Some(cancel) => ctx.with_cancellation(cancel.clone()),
            None => ctx,
        }
    }

    fn claim(&self, kind: EntityKind) -> Result<KindGuard> {
        let mut kinds = self
            .in_flight
            .lock()
            .map_err(|_| TaskError::Join("task registry lock poisoned".to_string()))?;
        if !kinds.insert(kind) {
            return Err(TaskError::KindBusy(kind.short_name().to_string()).into());
        }
        Ok(KindGuard {
            kind,
            in_flight: self.in_flight.clone(),
        })
    }

    /// Starts a run in the background
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::SyncError::UnknownKind`] for an unknown kind
    /// and [`TaskError::KindBusy`] when the kind already has a run in flight.
    pub fn submit(&self, job: JobConfig, principal: Principal) -> Result<SubmittedTask> {
        let kind = job.entity_kind()?;
        let guard = self.claim(kind)?;
        let task_id = Uuid::new_v4();
        let ctx = self.context(principal);
        let engine = self.engine.clone();

        tracing::info!(
            task_id = %task_id,
            kind = %kind,
            mode = %job.mode(),
            principal = %ctx.principal(),
            "Submitting task"
        );

        let handle = tokio::spawn(async move {
            let _guard = guard;
            match engine.run_job(&ctx, &job).await {
                Ok(report) => {
                    report.log_summary();
                    Some(report)
                }
                Err(e) => {
                    tracing::error!(task_id = %task_id, error = %e, "Task failed");
                    None
                }
            }
        });

        Ok(SubmittedTask {
            ack: TaskAck {
                task_id,
                kind,
                message: IMPORT_STARTED_MESSAGE.to_string(),
            },
            handle,
        })
    }

    /// Starts an out-of-band reconciliation of `kind` as the system user
    pub fn import_all(&self, kind: EntityKind) -> Result<SubmittedTask> {
        self.submit(JobConfig::update(kind), Principal::system_su())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cristin::{ListQuery, Page, SourceFetcher, SourceResult};
    use crate::adapters::database::MemoryStore;
    use crate::config::SyncConfig;
    use crate::core::progress::NoopProgress;
    use crate::domain::SyncError;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::time::Duration;

    /// Holds every page request until released
    struct SlowFetcher(Duration);

    #[async_trait]
    impl SourceFetcher for SlowFetcher {
        async fn fetch_one(
            &self,
            _ctx: &ExecutionContext,
            _kind: EntityKind,
            _external_id: &str,
        ) -> SourceResult<Value> {
            Ok(Value::Null)
        }

        async fn fetch_page(
            &self,
            _ctx: &ExecutionContext,
            _kind: EntityKind,
            _query: &ListQuery,
            _page: usize,
            _page_size: usize,
        ) -> SourceResult<Page> {
            tokio::time::sleep(self.0).await;
            Ok(Page::default())
        }

        fn base_url(&self) -> &str {
            "slow://"
        }
    }

    fn runner(delay: Duration) -> TaskRunner {
        let engine = SyncEngine::new(
            Arc::new(SlowFetcher(delay)),
            Arc::new(MemoryStore::new()),
            Arc::new(NoopProgress),
            SyncConfig::default(),
        );
        TaskRunner::new(Arc::new(engine))
    }

    #[tokio::test]
    async fn test_import_all_acknowledges() {
        let runner = runner(Duration::ZERO);
        let task = runner.import_all(EntityKind::Persons).unwrap();

        assert_eq!(task.ack.kind, EntityKind::Persons);
        assert_eq!(task.ack.message, "Started tasks to import from Cristin...");

        let report = task.wait().await.unwrap().unwrap();
        assert!(report.is_completed());
        assert!(runner.busy_kinds().is_empty());
    }

    #[tokio::test]
    async fn test_second_run_for_busy_kind_is_refused() {
        let runner = runner(Duration::from_millis(200));
        let first = runner
            .submit(JobConfig::import(EntityKind::Units, None), Principal::system_su())
            .unwrap();

        let second = runner.submit(JobConfig::update(EntityKind::Units), Principal::system_su());
        assert!(matches!(second, Err(SyncError::Task(TaskError::KindBusy(_)))));

        // Other kinds are not blocked
        let other = runner
            .submit(JobConfig::update(EntityKind::Persons), Principal::system_su())
            .unwrap();

        first.wait().await.unwrap();
        other.wait().await.unwrap();
        assert!(runner.busy_kinds().is_empty());
    }

    #[test]
    fn test_unknown_kind_is_rejected_before_spawning() {
        let runner = runner(Duration::ZERO);
        let job = JobConfig::Update {
            kind: "no.item.cristin.foo".to_string(),
        };
        let result = runner.submit(job, Principal::system_su());
        assert!(matches!(result, Err(SyncError::UnknownKind(_))));
    }
}
