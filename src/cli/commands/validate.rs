//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the cristin-sync configuration file.

use crate::config::{load_config, resolve_config_path, StoreTarget};
use crate::core::schedule::jobs_from_config;
use clap::Args;
use std::path::Path;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: Option<&Path>) -> anyhow::Result<i32> {
        let path = resolve_config_path(config_path);
        tracing::info!(config_path = %path.display(), "Validating configuration");

        println!("🔍 Validating configuration file: {}", path.display());
        println!();

        // Loading also validates
        let config = match load_config(&path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let jobs = match jobs_from_config(&config.schedule) {
            Ok(jobs) => jobs,
            Err(e) => {
                println!("❌ Invalid schedule");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        println!("  Cristin API: {}", config.cristin.base_url);
        println!("  Languages: {}", config.cristin.lang);

        match config.store_target {
            StoreTarget::PostgreSQL => {
                if let Some(ref pg_config) = config.postgresql {
                    use secrecy::ExposeSecret;
                    println!("  Store Target: PostgreSQL");
                    let conn: &str = pg_config.connection_string.expose_secret().as_ref();
                    println!(
                        "  PostgreSQL Connection: {}",
                        conn.split('@').next_back().unwrap_or("***")
                    );
                    println!("  Max Connections: {}", pg_config.max_connections);
                }
            }
            StoreTarget::Memory => {
                println!("  Store Target: memory (records are lost on exit)");
            }
        }

        println!("  Page Size: {}", config.import.page_size);
        println!("  Max Pages: {}", config.import.max_pages);
        println!("  Fetch Ahead: {}", config.import.fetch_ahead);
        println!(
            "  Institution: {}",
            config.import.institution.as_deref().unwrap_or("(none)")
        );
        println!("  Default Kind: {}", config.import.default_kind);
        println!(
            "  Schedule: {} jobs in {}{}",
            jobs.len(),
            config.schedule.time_zone,
            if config.schedule.enabled { "" } else { " (disabled)" }
        );
        println!();

        Ok(0)
    }
}
