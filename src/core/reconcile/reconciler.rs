//! Incremental reconciler
//!
//! Re-fetches every active stored record of a kind by its external id and
//! brings the store in line: drifted payloads are replaced, records the
//! source no longer has are flagged, transient failures are left alone.

use crate::adapters::cristin::SourceFetcher;
use crate::adapters::database::{KeyedStore, ListFilter};
use crate::core::compare::has_drift;
use crate::core::context::ExecutionContext;
use crate::core::progress::{Progress, ProgressReporter};
use crate::core::run::{RunMode, RunReport, RunTally};
use crate::core::tally::{ReconcileOutcome, UpdateTally};
use crate::domain::{EntityKind, MirroredRecord, SourceError};
use std::sync::Arc;
use std::time::Instant;

/// Per-record reconciliation engine
pub struct IncrementalReconciler {
    fetcher: Arc<dyn SourceFetcher>,
    store: Arc<dyn KeyedStore>,
    progress: Arc<dyn ProgressReporter>,
    log_payload_changes: bool,
}

impl IncrementalReconciler {
    pub fn new(
        fetcher: Arc<dyn SourceFetcher>,
        store: Arc<dyn KeyedStore>,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            fetcher,
            store,
            progress,
            log_payload_changes: false,
        }
    }

    /// Dump before/after payloads of changed records at debug level
    pub fn with_payload_diagnostics(mut self, enabled: bool) -> Self {
        self.log_payload_changes = enabled;
        self
    }

    /// Reconcile every active record of `kind`
    ///
    /// A failure to enumerate the store fails the run without a tally;
    /// everything after that is handled per record.
    pub async fn run(&self, ctx: &ExecutionContext, kind: EntityKind) -> RunReport {
        let start = Instant::now();
        crate::log_run_start!(RunMode::Update.as_str(), kind);
        tracing::info!(kind = %kind, "Start updating repo \"{}\"", kind.collection());

        let records = match self
            .store
            .list_all(ctx, kind, &ListFilter::active_records())
            .await
        {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(
                    kind = %kind,
                    collection = kind.collection(),
                    error = %e,
                    "Failed to enumerate stored records"
                );
                return RunReport::failed(kind, RunMode::Update, e.to_string())
                    .with_dry_run(ctx.is_dry_run())
                    .with_duration(start.elapsed());
            }
        };

        let total = records.len();
        let mut tally = UpdateTally::default();
        let mut interrupted = false;

        for (index, record) in records.into_iter().enumerate() {
            if ctx.is_cancelled() {
                tracing::info!(
                    kind = %kind,
                    processed = index,
                    total,
                    "Cancellation requested, stopping update"
                );
                interrupted = true;
                break;
            }

            let outcome = self.reconcile_record(ctx, record).await;
            tally.record(outcome);

            let current = index + 1;
            self.progress.report(Progress::new(
                current,
                total,
                format!(
                    "Updated {} of {} entries in \"{}\"",
                    current,
                    total,
                    kind.collection()
                ),
            ));
        }

        if ctx.is_dry_run() {
            tracing::info!(kind = %kind, "Dry run: skipping reindex");
        } else if let Err(e) = self.store.reindex_all(ctx, kind).await {
            tracing::warn!(kind = %kind, error = %e, "Failed to refresh indexes after update");
        }

        tracing::info!(
            kind = %kind,
            changed = tally.changed,
            unchanged = tally.unchanged,
            removed = tally.removed,
            failed = tally.failed,
            "Updated repo \"{}\" with {} changes and {} unchanged",
            kind.collection(),
            tally.changed,
            tally.unchanged
        );

        let duration = start.elapsed();
        crate::log_run_complete!(RunMode::Update.as_str(), kind, duration);

        RunReport::completed(kind, RunMode::Update, RunTally::Update(tally))
            .with_interrupted(interrupted)
            .with_dry_run(ctx.is_dry_run())
            .with_duration(duration)
    }

    async fn reconcile_record(
        &self,
        ctx: &ExecutionContext,
        record: MirroredRecord,
    ) -> ReconcileOutcome {
        let kind = record.kind;
        let external_id = record.external_id.clone();

        let fresh = match self.fetcher.fetch_one(ctx, kind, external_id.as_str()).await {
            Ok(fresh) => fresh,
            Err(SourceError::NotFound(_)) => return self.mark_removed(ctx, &record).await,
            Err(e) => {
                tracing::warn!(
                    kind = %kind,
                    external_id = %external_id,
                    error = %e,
                    "Failed to fetch record, leaving it untouched"
                );
                return ReconcileOutcome::Failed;
            }
        };

        if !has_drift(&record.payload, Some(&fresh)) {
            return ReconcileOutcome::Unchanged;
        }

        if self.log_payload_changes {
            tracing::debug!(
                kind = %kind,
                external_id = %external_id,
                before = %record.payload,
                after = %fresh,
                "Payload changed"
            );
        }

        if ctx.is_dry_run() {
            tracing::debug!(kind = %kind, external_id = %external_id, "Dry run: would update record");
            return ReconcileOutcome::Changed;
        }

        let result = self
            .store
            .update(
                ctx,
                kind,
                record.internal_key,
                Box::new(move |stored: &mut MirroredRecord| stored.replace_payload(fresh)),
            )
            .await;

        match result {
            Ok(_) => ReconcileOutcome::Changed,
            Err(e) => {
                tracing::warn!(
                    kind = %kind,
                    external_id = %external_id,
                    error = %e,
                    "Failed to write updated record"
                );
                ReconcileOutcome::Failed
            }
        }
    }

    async fn mark_removed(&self, ctx: &ExecutionContext, record: &MirroredRecord) -> ReconcileOutcome {
        let kind = record.kind;
        tracing::info!(
            kind = %kind,
            external_id = %record.external_id,
            "Record removed from source, flagging it"
        );

        if ctx.is_dry_run() {
            return ReconcileOutcome::Removed;
        }

        let result = self
            .store
            .update(
                ctx,
                kind,
                record.internal_key,
                Box::new(|stored: &mut MirroredRecord| stored.mark_removed()),
            )
            .await;

        match result {
            Ok(_) => ReconcileOutcome::Removed,
            Err(e) => {
                tracing::warn!(
                    kind = %kind,
                    external_id = %record.external_id,
                    error = %e,
                    "Failed to flag removed record"
                );
                ReconcileOutcome::Failed
            }
        }
    }
}
