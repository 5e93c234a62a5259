//! Progress reporting for long-running runs
//!
//! Progress is advisory. Reporters never block the run and never fail it;
//! a lost update is not an error.

use serde::Serialize;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// One progress update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    pub message: String,
}

impl Progress {
    pub fn new(current: usize, total: usize, message: impl Into<String>) -> Self {
        Self {
            current,
            total,
            message: message.into(),
        }
    }
}

/// Receiver of progress updates
pub trait ProgressReporter: Send + Sync {
    /// Fire-and-forget delivery of one update
    fn report(&self, progress: Progress);
}

/// Discards every update
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _progress: Progress) {}
}

/// Emits updates as debug-level log lines
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&self, progress: Progress) {
        crate::log_progress!(progress.current, progress.total, &progress.message);
    }
}

/// Forwards updates to a bounded channel
///
/// Uses `try_send`: when the consumer lags or is gone, the update is
/// dropped instead of stalling the run.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    sender: mpsc::Sender<Progress>,
}

impl ChannelProgress {
    /// Creates a reporter and the receiving end of its channel
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Progress>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl ProgressReporter for ChannelProgress {
    fn report(&self, progress: Progress) {
        if let Err(e) = self.sender.try_send(progress) {
            tracing::trace!(error = %e, "Dropped progress update");
        }
    }
}

/// Keeps every update in memory; handy for inspecting a run afterwards
#[derive(Debug, Default)]
pub struct RecordingProgress {
    updates: Mutex<Vec<Progress>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the updates received so far
    pub fn updates(&self) -> Vec<Progress> {
        self.updates
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, progress: Progress) {
        if let Ok(mut guard) = self.updates.lock() {
            guard.push(progress);
        }
    }
}
