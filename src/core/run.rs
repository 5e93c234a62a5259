//! Run reports
//!
//! Every import or reconciliation run ends in a [`RunReport`]. Per-record
//! problems live in its tallies; only a failure of the run as a whole turns
//! into [`RunOutcome::Failed`].

use crate::core::tally::{SyncTally, UpdateTally};
use crate::domain::EntityKind;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Which engine produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Full paginated import
    Import,
    /// Incremental per-record reconciliation
    Update,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Import => "import",
            RunMode::Update => "update",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the run got as far as producing a tally
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunOutcome {
    Completed,
    Failed { reason: String },
}

/// Tally of a run, shaped by its mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RunTally {
    Import(SyncTally),
    Update(UpdateTally),
}

/// Result of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub kind: EntityKind,
    pub mode: RunMode,
    pub outcome: RunOutcome,
    /// Absent when the run failed before processing records
    pub tally: Option<RunTally>,
    /// Cancellation stopped the run before every record was seen
    pub interrupted: bool,
    pub dry_run: bool,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl RunReport {
    pub fn completed(kind: EntityKind, mode: RunMode, tally: RunTally) -> Self {
        Self {
            kind,
            mode,
            outcome: RunOutcome::Completed,
            tally: Some(tally),
            interrupted: false,
            dry_run: false,
            duration: Duration::ZERO,
        }
    }

    pub fn failed(kind: EntityKind, mode: RunMode, reason: impl Into<String>) -> Self {
        Self {
            kind,
            mode,
            outcome: RunOutcome::Failed {
                reason: reason.into(),
            },
            tally: None,
            interrupted: false,
            dry_run: false,
            duration: Duration::ZERO,
        }
    }

    pub fn with_interrupted(mut self, interrupted: bool) -> Self {
        self.interrupted = interrupted;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, RunOutcome::Completed)
    }

    pub fn sync_tally(&self) -> Option<SyncTally> {
        match self.tally {
            Some(RunTally::Import(tally)) => Some(tally),
            _ => None,
        }
    }

    pub fn update_tally(&self) -> Option<UpdateTally> {
        match self.tally {
            Some(RunTally::Update(tally)) => Some(tally),
            _ => None,
        }
    }

    /// True when some records errored or failed
    pub fn has_record_errors(&self) -> bool {
        match self.tally {
            Some(RunTally::Import(tally)) => tally.errored > 0,
            Some(RunTally::Update(tally)) => tally.failed > 0,
            None => false,
        }
    }

    /// Log the report
    pub fn log_summary(&self) {
        match (&self.outcome, &self.tally) {
            (RunOutcome::Failed { reason }, _) => {
                tracing::error!(
                    mode = %self.mode,
                    kind = %self.kind,
                    reason = %reason,
                    duration_ms = self.duration.as_millis() as u64,
                    "Run failed"
                );
            }
            (RunOutcome::Completed, Some(RunTally::Import(tally))) => {
                tracing::info!(
                    mode = %self.mode,
                    kind = %self.kind,
                    created = tally.created,
                    modified = tally.modified,
                    unchanged = tally.unchanged,
                    errored = tally.errored,
                    interrupted = self.interrupted,
                    dry_run = self.dry_run,
                    duration_ms = self.duration.as_millis() as u64,
                    "Run completed"
                );
            }
            (RunOutcome::Completed, Some(RunTally::Update(tally))) => {
                tracing::info!(
                    mode = %self.mode,
                    kind = %self.kind,
                    changed = tally.changed,
                    unchanged = tally.unchanged,
                    removed = tally.removed,
                    failed = tally.failed,
                    interrupted = self.interrupted,
                    dry_run = self.dry_run,
                    duration_ms = self.duration.as_millis() as u64,
                    "Run completed"
                );
            }
            (RunOutcome::Completed, None) => {
                tracing::info!(mode = %self.mode, kind = %self.kind, "Run completed");
            }
        }

        if self.interrupted {
            tracing::warn!(kind = %self.kind, "Run was interrupted; tally is partial");
        }
    }
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tally::UpsertOutcome;

    #[test]
    fn test_failed_report_has_no_tally() {
        let report = RunReport::failed(EntityKind::Results, RunMode::Import, "list fetch failed");
        assert!(!report.is_completed());
        assert!(report.tally.is_none());
        assert!(!report.has_record_errors());
    }

    #[test]
    fn test_record_errors() {
        let tally = SyncTally::of(UpsertOutcome::Errored);
        let report = RunReport::completed(EntityKind::Persons, RunMode::Import, RunTally::Import(tally));
        assert!(report.has_record_errors());
        assert_eq!(report.sync_tally(), Some(tally));
        assert_eq!(report.update_tally(), None);
    }

    #[test]
    fn test_report_serializes() {
        let report = RunReport::completed(
            EntityKind::Units,
            RunMode::Update,
            RunTally::Update(UpdateTally::default()),
        )
        .with_duration(Duration::from_millis(1500));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kind"], "units");
        assert_eq!(json["mode"], "update");
        assert_eq!(json["outcome"]["status"], "completed");
        assert_eq!(json["duration"], 1500);
        assert_eq!(json["tally"]["changed"], 0);
    }
}
