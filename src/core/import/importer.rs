//! Bulk importer
//!
//! Drives a full sync of one kind: fetch the complete list, classify every
//! entry against the store and write the outcome. Each record goes through
//! a single step (created, modified, unchanged or errored) without retries.

use crate::adapters::cristin::{parse_external_id, SourceFetcher};
use crate::adapters::database::KeyedStore;
use crate::config::SyncConfig;
use crate::core::compare::has_drift;
use crate::core::context::ExecutionContext;
use crate::core::import::pagination::{fetch_all_pages, fetch_single_page};
use crate::core::import::plan::{ImportPlan, ListSource};
use crate::core::progress::{Progress, ProgressReporter};
use crate::core::run::{RunMode, RunReport, RunTally};
use crate::core::tally::{SyncTally, UpsertOutcome};
use crate::domain::{EntityKind, ExternalId, MirroredRecord, Result, StoreError, SyncError};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Tuning knobs of the importer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSettings {
    /// Report progress every N records
    pub progress_every: usize,
    /// Detail fetches kept in flight ahead of the writer
    pub fetch_ahead: usize,
    /// Dump before/after payloads of modified records
    pub log_payload_changes: bool,
}

impl ImportSettings {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            progress_every: config.import.progress_every,
            fetch_ahead: config.import.fetch_ahead,
            log_payload_changes: config.diagnostics.log_payload_changes,
        }
    }
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            progress_every: 10,
            fetch_ahead: 1,
            log_payload_changes: false,
        }
    }
}

/// Full-sync engine
pub struct BulkImporter {
    fetcher: Arc<dyn SourceFetcher>,
    store: Arc<dyn KeyedStore>,
    progress: Arc<dyn ProgressReporter>,
    settings: ImportSettings,
}

impl BulkImporter {
    pub fn new(
        fetcher: Arc<dyn SourceFetcher>,
        store: Arc<dyn KeyedStore>,
        progress: Arc<dyn ProgressReporter>,
        settings: ImportSettings,
    ) -> Self {
        Self {
            fetcher,
            store,
            progress,
            settings,
        }
    }

    /// Run a full import
    ///
    /// Never returns an error: a failed list fetch (or a missing institution
    /// filter on a result import) yields a failed report without a tally,
    /// and per-record problems are counted as errored.
    pub async fn run(&self, ctx: &ExecutionContext, plan: &ImportPlan) -> RunReport {
        let start = Instant::now();
        let kind = plan.kind;
        crate::log_run_start!(RunMode::Import.as_str(), kind);

        if plan.requires_institution() && !plan.has_institution() {
            tracing::error!(
                kind = %kind,
                collection = kind.collection(),
                "No institution specified for a listing through results"
            );
            return RunReport::failed(kind, RunMode::Import, "No institution specified")
                .with_dry_run(ctx.is_dry_run())
                .with_duration(start.elapsed());
        }

        let entries = match self.fetch_list(ctx, plan).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(
                    kind = %kind,
                    collection = kind.collection(),
                    error = %e,
                    "Failed to fetch list from source"
                );
                return RunReport::failed(kind, RunMode::Import, e.to_string())
                    .with_dry_run(ctx.is_dry_run())
                    .with_duration(start.elapsed());
            }
        };

        let (tally, interrupted) = self.import_entries(ctx, plan, entries).await;

        tracing::info!(
            kind = %kind,
            created = tally.created,
            modified = tally.modified,
            unchanged = tally.unchanged,
            errored = tally.errored,
            "Import to \"{}\" completed with [created={}, modified={}, unchanged={}, errors={}]",
            kind.collection(),
            tally.created,
            tally.modified,
            tally.unchanged,
            tally.errored
        );

        if ctx.is_dry_run() {
            tracing::info!(kind = %kind, "Dry run: skipping reindex");
        } else if let Err(e) = self.store.reindex_all(ctx, kind).await {
            tracing::warn!(kind = %kind, error = %e, "Failed to refresh indexes after import");
        }

        let duration = start.elapsed();
        crate::log_run_complete!(RunMode::Import.as_str(), kind, duration);

        RunReport::completed(kind, RunMode::Import, RunTally::Import(tally))
            .with_interrupted(interrupted)
            .with_dry_run(ctx.is_dry_run())
            .with_duration(duration)
    }

    async fn fetch_list(
        &self,
        ctx: &ExecutionContext,
        plan: &ImportPlan,
    ) -> Result<Vec<Value>> {
        let entries = match plan.source {
            ListSource::SinglePage { page_size } => {
                fetch_single_page(
                    self.fetcher.as_ref(),
                    ctx,
                    plan.kind,
                    &plan.query,
                    page_size,
                    self.progress.as_ref(),
                )
                .await?
            }
            ListSource::Paginated {
                page_size,
                max_pages,
            } => {
                fetch_all_pages(
                    self.fetcher.as_ref(),
                    ctx,
                    plan.kind,
                    &plan.query,
                    page_size,
                    max_pages,
                    self.progress.as_ref(),
                )
                .await?
            }
        };

        tracing::info!(kind = %plan.kind, count = entries.len(), "Fetched list from source");
        Ok(entries)
    }

    /// Classifies and writes every entry in list order
    ///
    /// Returns the tally and whether cancellation cut the run short.
    async fn import_entries(
        &self,
        ctx: &ExecutionContext,
        plan: &ImportPlan,
        entries: Vec<Value>,
    ) -> (SyncTally, bool) {
        let kind = plan.kind;
        let total = entries.len();
        let mut tally = SyncTally::default();

        // Detail fetches may run ahead; writes stay sequential and ordered
        let pending = stream::iter(entries)
            .map(|entry| self.prepare(ctx, kind, plan.detail_fetch, entry))
            .buffered(self.settings.fetch_ahead.max(1));
        futures::pin_mut!(pending);

        let mut index = 0;
        while let Some(prepared) = pending.next().await {
            if ctx.is_cancelled() {
                tracing::info!(
                    kind = %kind,
                    processed = index,
                    total,
                    "Cancellation requested, stopping import"
                );
                return (tally, true);
            }

            if index % self.settings.progress_every.max(1) == 0 {
                self.progress.report(Progress::new(
                    index + 1,
                    total,
                    format!("Imported {} of {} entries", index + 1, total),
                ));
            }

            let outcome = match prepared {
                Ok((external_id, payload)) => {
                    match self.upsert(ctx, kind, &external_id, payload).await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            tracing::warn!(
                                kind = %kind,
                                external_id = %external_id,
                                error = %e,
                                "Failed to import record"
                            );
                            UpsertOutcome::Errored
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(kind = %kind, index, error = %e, "Failed to prepare record");
                    UpsertOutcome::Errored
                }
            };

            tally.record(outcome);
            index += 1;
        }

        (tally, false)
    }

    /// Derives the external id and the payload to store for one entry
    async fn prepare(
        &self,
        ctx: &ExecutionContext,
        kind: EntityKind,
        detail_fetch: bool,
        entry: Value,
    ) -> Result<(ExternalId, Value)> {
        let external_id = parse_external_id(kind, &entry).map_err(SyncError::Validation)?;

        if !detail_fetch {
            return Ok((external_id, entry));
        }

        let payload = self
            .fetcher
            .fetch_one(ctx, kind, external_id.as_str())
            .await?;
        Ok((external_id, payload))
    }

    /// Creates, replaces or leaves one record
    async fn upsert(
        &self,
        ctx: &ExecutionContext,
        kind: EntityKind,
        external_id: &ExternalId,
        payload: Value,
    ) -> Result<UpsertOutcome> {
        let Some(key) = self.store.find_by_external_id(ctx, kind, external_id).await? else {
            if ctx.is_dry_run() {
                tracing::debug!(kind = %kind, external_id = %external_id, "Dry run: would create record");
            } else {
                self.store.create(ctx, kind, external_id, payload).await?;
            }
            return Ok(UpsertOutcome::Created);
        };

        let stored = self
            .store
            .get(ctx, kind, key)
            .await?
            .ok_or_else(|| StoreError::RecordNotFound(format!("{}/{}", kind.collection(), key)))?;

        // Records flagged as removed keep their last payload
        if stored.removed_from_source {
            return Ok(UpsertOutcome::Unchanged);
        }

        if !has_drift(&stored.payload, Some(&payload)) {
            return Ok(UpsertOutcome::Unchanged);
        }

        if self.settings.log_payload_changes {
            tracing::debug!(
                kind = %kind,
                external_id = %external_id,
                before = %stored.payload,
                after = %payload,
                "Payload changed"
            );
        }

        if ctx.is_dry_run() {
            tracing::debug!(kind = %kind, external_id = %external_id, "Dry run: would update record");
        } else {
            self.store
                .update(
                    ctx,
                    kind,
                    key,
                    Box::new(move |record: &mut MirroredRecord| {
                        record.replace_payload(payload)
                    }),
                )
                .await?;
        }

        Ok(UpsertOutcome::Modified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cristin::{ListQuery, Page, SourceResult};
    use crate::adapters::database::MemoryStore;
    use crate::core::progress::{NoopProgress, RecordingProgress};
    use crate::domain::SourceError;
    use async_trait::async_trait;
    use serde_json::json;

    /// Serves a fixed list as one page
    struct FixedList(Vec<Value>);

    #[async_trait]
    impl SourceFetcher for FixedList {
        async fn fetch_one(
            &self,
            _ctx: &ExecutionContext,
            _kind: EntityKind,
            external_id: &str,
        ) -> SourceResult<Value> {
            Err(SourceError::NotFound(external_id.to_string()))
        }

        async fn fetch_page(
            &self,
            _ctx: &ExecutionContext,
            _kind: EntityKind,
            _query: &ListQuery,
            page: usize,
            _page_size: usize,
        ) -> SourceResult<Page> {
            let data = if page == 1 { self.0.clone() } else { Vec::new() };
            Ok(Page {
                total: self.0.len(),
                data,
            })
        }

        fn base_url(&self) -> &str {
            "fixed://"
        }
    }

    fn importer(entries: Vec<Value>, store: Arc<MemoryStore>) -> BulkImporter {
        BulkImporter::new(
            Arc::new(FixedList(entries)),
            store,
            Arc::new(NoopProgress),
            ImportSettings::default(),
        )
    }

    fn plan(kind: EntityKind) -> ImportPlan {
        ImportPlan::for_kind(kind, &Default::default())
    }

    #[tokio::test]
    async fn test_import_into_empty_store() {
        let store = Arc::new(MemoryStore::new());
        let entries = vec![
            json!({"cristin_person_id": "1", "name": "A"}),
            json!({"cristin_person_id": "2", "name": "B"}),
        ];

        let report = importer(entries, store.clone())
            .run(&ExecutionContext::system(), &plan(EntityKind::Persons))
            .await;

        assert!(report.is_completed());
        assert_eq!(
            report.sync_tally(),
            Some(SyncTally {
                created: 2,
                ..Default::default()
            })
        );
        assert_eq!(store.len(EntityKind::Persons), 2);
    }

    #[tokio::test]
    async fn test_missing_id_is_errored_and_run_continues() {
        let store = Arc::new(MemoryStore::new());
        let entries = vec![
            json!({"name": "no id"}),
            json!({"cristin_person_id": 7, "name": "B"}),
        ];

        let report = importer(entries, store.clone())
            .run(&ExecutionContext::system(), &plan(EntityKind::Persons))
            .await;

        let tally = report.sync_tally().unwrap();
        assert_eq!(tally.errored, 1);
        assert_eq!(tally.created, 1);
        assert!(store.record_by_external_id(EntityKind::Persons, "7").is_some());
    }

    #[tokio::test]
    async fn test_result_import_without_institution_fails() {
        let store = Arc::new(MemoryStore::new());
        let entries = vec![json!({"cristin_result_id": "1"})];

        let report = importer(entries, store.clone())
            .run(&ExecutionContext::system(), &plan(EntityKind::Results))
            .await;

        assert!(!report.is_completed());
        assert!(store.is_empty(EntityKind::Results));
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let entries = vec![json!({"cristin_unit_id": "185.1", "name": "Unit"})];

        let ctx = ExecutionContext::system().with_dry_run(true);
        let report = importer(entries, store.clone())
            .run(&ctx, &plan(EntityKind::Units))
            .await;

        assert_eq!(report.sync_tally().unwrap().created, 1);
        assert!(report.dry_run);
        assert!(store.is_empty(EntityKind::Units));
    }

    #[tokio::test]
    async fn test_progress_every_tenth_record() {
        let store = Arc::new(MemoryStore::new());
        let entries: Vec<Value> = (1..=21)
            .map(|i| json!({"cristin_project_id": i.to_string()}))
            .collect();
        let progress = Arc::new(RecordingProgress::new());

        let importer = BulkImporter::new(
            Arc::new(FixedList(entries)),
            store,
            progress.clone(),
            ImportSettings::default(),
        );
        importer
            .run(&ExecutionContext::system(), &plan(EntityKind::Projects))
            .await;

        let imported: Vec<_> = progress
            .updates()
            .into_iter()
            .filter(|p| p.message.starts_with("Imported"))
            .collect();
        let currents: Vec<_> = imported.iter().map(|p| p.current).collect();
        assert_eq!(currents, vec![1, 11, 21]);
        assert_eq!(imported[1].message, "Imported 11 of 21 entries");
        assert!(imported.iter().all(|p| p.total == 21));
    }
}
