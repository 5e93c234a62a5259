//! Run dispatch
//!
//! [`SyncEngine`] owns the source, the store and the settings both engines
//! share, and turns a job description into a run.

use crate::adapters::cristin::SourceFetcher;
use crate::adapters::database::KeyedStore;
use crate::config::SyncConfig;
use crate::core::context::ExecutionContext;
use crate::core::import::{BulkImporter, ImportPlan, ImportSettings};
use crate::core::progress::ProgressReporter;
use crate::core::reconcile::IncrementalReconciler;
use crate::core::run::RunReport;
use crate::core::schedule::JobConfig;
use crate::domain::{EntityKind, Result};
use std::sync::Arc;

pub struct SyncEngine {
    importer: BulkImporter,
    reconciler: IncrementalReconciler,
    store: Arc<dyn KeyedStore>,
    config: SyncConfig,
}

impl SyncEngine {
    pub fn new(
        fetcher: Arc<dyn SourceFetcher>,
        store: Arc<dyn KeyedStore>,
        progress: Arc<dyn ProgressReporter>,
        config: SyncConfig,
    ) -> Self {
        let importer = BulkImporter::new(
            fetcher.clone(),
            store.clone(),
            progress.clone(),
            ImportSettings::from_config(&config),
        );
        let reconciler = IncrementalReconciler::new(fetcher, store.clone(), progress)
            .with_payload_diagnostics(config.diagnostics.log_payload_changes);

        Self {
            importer,
            reconciler,
            store,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn KeyedStore> {
        &self.store
    }

    /// Creates the collection of every kind that is missing one
    pub async fn ensure_collections(&self, ctx: &ExecutionContext) -> Result<()> {
        for kind in EntityKind::ALL {
            self.store.ensure_collection(ctx, kind).await?;
        }
        tracing::info!(backend = self.store.backend_name(), "Collections ready");
        Ok(())
    }

    /// Runs a job
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::SyncError::UnknownKind`] when the job names
    /// a kind that does not exist. Every other problem ends up in the report.
    pub async fn run_job(&self, ctx: &ExecutionContext, job: &JobConfig) -> Result<RunReport> {
        let kind = job.entity_kind()?;
        let report = match job {
            JobConfig::Update { .. } => self.run_update(ctx, kind).await,
            JobConfig::Import { institution, .. } => {
                self.run_import(ctx, kind, institution.as_deref()).await
            }
        };
        Ok(report)
    }

    /// Full import of one kind
    ///
    /// Kinds that require an institution filter fall back to
    /// `import.institution` when none is given.
    pub async fn run_import(
        &self,
        ctx: &ExecutionContext,
        kind: EntityKind,
        institution: Option<&str>,
    ) -> RunReport {
        let mut plan = ImportPlan::for_kind(kind, &self.config.import);
        let fallback = if plan.requires_institution() {
            self.config.import.institution.as_deref()
        } else {
            None
        };
        if let Some(institution) = institution.or(fallback) {
            plan = plan.with_institution(institution);
        }
        self.importer.run(ctx, &plan).await
    }

    /// Incremental reconciliation of one kind
    pub async fn run_update(&self, ctx: &ExecutionContext, kind: EntityKind) -> RunReport {
        self.reconciler.run(ctx, kind).await
    }
}
