//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for cristin-sync using clap.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cristin-sync - Cristin mirror and reconciliation
#[derive(Parser, Debug)]
#[command(name = "cristin-sync")]
#[command(version, about, long_about = None)]
#[command(author = "Cristin Sync Contributors")]
pub struct Cli {
    /// Path to configuration file (defaults to $CRISTIN_SYNC_CONFIG, then cristin-sync.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CRISTIN_SYNC_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a full import of one kind
    Import(commands::import::ImportArgs),

    /// Reconcile stored records of one kind against the source
    Update(commands::update::UpdateArgs),

    /// Start an out-of-band reconciliation of the default kind
    ImportAll(commands::import_all::ImportAllArgs),

    /// Ensure collections, register jobs and run the scheduler
    Serve(commands::serve::ServeArgs),

    /// Print the effective job schedule
    Jobs(commands::jobs::JobsArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_import() {
        let cli = Cli::parse_from(["cristin-sync", "import", "--kind", "results", "--institution", "185"]);
        assert!(cli.config.is_none());
        match cli.command {
            Commands::Import(args) => {
                assert_eq!(args.kind, "results");
                assert_eq!(args.institution.as_deref(), Some("185"));
                assert!(!args.dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["cristin-sync", "--config", "custom.toml", "jobs"]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(cli.command, Commands::Jobs(_)));
    }

    #[test]
    fn test_cli_parse_update_dry_run() {
        let cli = Cli::parse_from(["cristin-sync", "update", "--kind", "persons", "--dry-run"]);
        match cli.command {
            Commands::Update(args) => {
                assert_eq!(args.kind, "persons");
                assert!(args.dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["cristin-sync", "--log-level", "debug", "serve"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::Serve(_)));
    }

    #[test]
    fn test_cli_parse_import_all_and_validate() {
        let cli = Cli::parse_from(["cristin-sync", "import-all"]);
        assert!(matches!(cli.command, Commands::ImportAll(_)));

        let cli = Cli::parse_from(["cristin-sync", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["cristin-sync", "init", "--output", "test.toml"]);
        match cli.command {
            Commands::Init(args) => assert_eq!(args.output, "test.toml"),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
