//! Outcome tallies for import and reconciliation runs
//!
//! Tallies are plain counters with an associative, commutative `combine`,
//! so per-record outcomes can be folded in any order.

use serde::Serialize;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Terminal state of one record during a full import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Modified,
    Unchanged,
    Errored,
}

/// Four-way tally of a full import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncTally {
    pub created: usize,
    pub modified: usize,
    pub unchanged: usize,
    pub errored: usize,
}

impl SyncTally {
    /// Tally holding a single outcome
    pub fn of(outcome: UpsertOutcome) -> Self {
        let mut tally = Self::default();
        tally.record(outcome);
        tally
    }

    /// Counts one outcome
    pub fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.created += 1,
            UpsertOutcome::Modified => self.modified += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
            UpsertOutcome::Errored => self.errored += 1,
        }
    }

    /// Field-wise sum of two tallies
    pub fn combine(self, other: Self) -> Self {
        Self {
            created: self.created + other.created,
            modified: self.modified + other.modified,
            unchanged: self.unchanged + other.unchanged,
            errored: self.errored + other.errored,
        }
    }

    /// Number of records accounted for
    pub fn total(&self) -> usize {
        self.created + self.modified + self.unchanged + self.errored
    }

    /// True when nothing had to be written and nothing failed
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.modified == 0 && self.errored == 0
    }
}

impl Add for SyncTally {
    type Output = SyncTally;

    fn add(self, rhs: Self) -> Self::Output {
        self.combine(rhs)
    }
}

impl AddAssign for SyncTally {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.combine(rhs);
    }
}

impl Sum for SyncTally {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Self::combine)
    }
}

/// Terminal state of one record during reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Changed,
    Unchanged,
    /// Source reported the entity gone; the record was flagged
    Removed,
    /// Transient fetch or write failure; the record was left untouched
    Failed,
}

/// Tally of an incremental reconciliation run
///
/// `changed` and `unchanged` form the run's two-counter tally. Soft-deleted
/// and failed records are tracked beside it and never folded into it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateTally {
    pub changed: usize,
    pub unchanged: usize,
    pub removed: usize,
    pub failed: usize,
}

impl UpdateTally {
    /// Counts one outcome
    pub fn record(&mut self, outcome: ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Changed => self.changed += 1,
            ReconcileOutcome::Unchanged => self.unchanged += 1,
            ReconcileOutcome::Removed => self.removed += 1,
            ReconcileOutcome::Failed => self.failed += 1,
        }
    }

    /// Field-wise sum of two tallies
    pub fn combine(self, other: Self) -> Self {
        Self {
            changed: self.changed + other.changed,
            unchanged: self.unchanged + other.unchanged,
            removed: self.removed + other.removed,
            failed: self.failed + other.failed,
        }
    }

    /// Number of records accounted for across all four outcomes
    pub fn processed(&self) -> usize {
        self.changed + self.unchanged + self.removed + self.failed
    }
}

impl Add for UpdateTally {
    type Output = UpdateTally;

    fn add(self, rhs: Self) -> Self::Output {
        self.combine(rhs)
    }
}

impl Sum for UpdateTally {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Self::combine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_outcomes() {
        let mut tally = SyncTally::default();
        tally.record(UpsertOutcome::Created);
        tally.record(UpsertOutcome::Created);
        tally.record(UpsertOutcome::Errored);

        assert_eq!(tally.created, 2);
        assert_eq!(tally.errored, 1);
        assert_eq!(tally.total(), 3);
        assert!(!tally.is_noop());
    }

    #[test]
    fn test_combine_is_order_independent() {
        let outcomes = [
            UpsertOutcome::Created,
            UpsertOutcome::Modified,
            UpsertOutcome::Unchanged,
            UpsertOutcome::Errored,
            UpsertOutcome::Unchanged,
        ];

        let forward: SyncTally = outcomes.iter().map(|o| SyncTally::of(*o)).sum();
        let backward: SyncTally = outcomes.iter().rev().map(|o| SyncTally::of(*o)).sum();
        assert_eq!(forward, backward);

        let a = SyncTally::of(UpsertOutcome::Created);
        let b = SyncTally::of(UpsertOutcome::Modified);
        let c = SyncTally::of(UpsertOutcome::Errored);
        assert_eq!((a + b) + c, a + (b + c));
        assert_eq!(a + SyncTally::default(), a);
    }

    #[test]
    fn test_update_tally_keeps_removed_apart() {
        let mut tally = UpdateTally::default();
        tally.record(ReconcileOutcome::Changed);
        tally.record(ReconcileOutcome::Removed);
        tally.record(ReconcileOutcome::Failed);
        tally.record(ReconcileOutcome::Unchanged);

        assert_eq!(tally.changed + tally.unchanged, 2);
        assert_eq!(tally.removed, 1);
        assert_eq!(tally.failed, 1);
        assert_eq!(tally.processed(), 4);
    }
}
