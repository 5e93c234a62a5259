//! Logging and observability
//!
//! Structured logging through `tracing`, with a console layer and an
//! optional rotated JSON file layer. The macros below keep the field names
//! of run-level log lines consistent across the import and reconcile paths.

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of a run
///
/// # Example
///
/// ```no_run
/// use cristin_sync::log_run_start;
/// use cristin_sync::domain::EntityKind;
///
/// log_run_start!("import", EntityKind::Persons);
/// ```
#[macro_export]
macro_rules! log_run_start {
    ($mode:expr, $kind:expr) => {
        tracing::info!(
            mode = $mode,
            kind = %$kind,
            collection = $kind.collection(),
            "Starting run"
        );
    };
}

/// Log the end of a run with its elapsed time
///
/// # Example
///
/// ```no_run
/// use cristin_sync::log_run_complete;
/// use cristin_sync::domain::EntityKind;
/// use std::time::Duration;
///
/// log_run_complete!("update", EntityKind::Units, Duration::from_secs(12));
/// ```
#[macro_export]
macro_rules! log_run_complete {
    ($mode:expr, $kind:expr, $duration:expr) => {
        tracing::info!(
            mode = $mode,
            kind = %$kind,
            duration_ms = $duration.as_millis() as u64,
            "Run finished"
        );
    };
}

/// Log a progress update
///
/// # Example
///
/// ```no_run
/// use cristin_sync::log_progress;
///
/// log_progress!(11, 250, "Imported 11 of 250 entries");
/// ```
#[macro_export]
macro_rules! log_progress {
    ($current:expr, $total:expr, $message:expr) => {
        tracing::debug!(
            current = $current,
            total = $total,
            "{}",
            $message
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::domain::EntityKind;
    use std::time::Duration;

    #[test]
    fn test_macros_expand() {
        crate::log_run_start!("import", EntityKind::Persons);
        crate::log_run_complete!("import", EntityKind::Persons, Duration::from_millis(5));
        crate::log_progress!(1usize, 10usize, "Imported 1 of 10 entries");
    }
}
