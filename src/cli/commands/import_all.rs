//! Import-all command implementation
//!
//! Starts a reconciliation of `import.default_kind` through the task runner,
//! prints the acknowledgement and waits for the run unless `--detach` is given.

use super::{connect, exit_code, load, parse_kind, print_report, EXIT_FATAL};
use crate::core::tasks::TaskRunner;
use clap::Args;
use std::path::Path;
use tokio::sync::watch;

/// Arguments for the import-all command
#[derive(Args, Debug)]
pub struct ImportAllArgs {
    /// Print the acknowledgement and exit without waiting for the run
    #[arg(long)]
    pub detach: bool,

    /// Print the acknowledgement as JSON
    #[arg(long)]
    pub json: bool,
}

impl ImportAllArgs {
    /// Execute the import-all command
    pub async fn execute(
        &self,
        config_path: Option<&Path>,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let config = match load(config_path) {
            Ok(config) => config,
            Err(code) => return Ok(code),
        };
        let kind = match parse_kind(&config.import.default_kind) {
            Ok(kind) => kind,
            Err(code) => return Ok(code),
        };

        let engine = match connect(config).await {
            Ok(engine) => engine,
            Err(code) => return Ok(code),
        };
        let runner = TaskRunner::new(engine).with_cancellation(shutdown_signal);

        let task = runner.import_all(kind)?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&task.ack)?);
        } else {
            println!("{}", task.ack.message);
            println!("  Task: {}", task.ack.task_id);
            println!("  Kind: {}", task.ack.kind);
        }

        if self.detach {
            return Ok(0);
        }

        match task.wait().await? {
            Some(report) => {
                print_report(&report);
                Ok(exit_code(&report))
            }
            None => Ok(EXIT_FATAL),
        }
    }
}
