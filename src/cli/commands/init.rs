//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "cristin-sync.toml")]
    pub output: String,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing cristin-sync configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Set CRISTIN_SYNC_DATABASE_URL in your environment or a .env file");
                println!("  3. Validate configuration: cristin-sync validate-config");
                println!("  4. Run an import: cristin-sync import --kind persons");
                println!("  5. Start the nightly schedule: cristin-sync serve");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# cristin-sync configuration

environment = "development"
store_target = "postgresql"

[application]
log_level = "info"
dry_run = false

[cristin]
base_url = "https://api.cristin.no/v2"
lang = "en,nb"

[import]
page_size = 1000
# institution = "185"

[postgresql]
connection_string = "${CRISTIN_SYNC_DATABASE_URL}"

[schedule]
enabled = true
time_zone = "GMT+1:00"

[logging]
local_enabled = true
local_path = "/var/log/cristin-sync"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# cristin-sync configuration
#
# Mirrors records from the Cristin research registry into a local store,
# either as full paginated imports or as nightly per-record reconciliation.

# ============================================================================
# Environment
# ============================================================================
# development | staging | production
# Production requires https for the Cristin API and forbids the memory store.
environment = "development"

# Store target: postgresql | memory
store_target = "postgresql"

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# Dry run mode (classify records without writing)
dry_run = false

# ============================================================================
# Cristin API
# ============================================================================
[cristin]
# API root
base_url = "https://api.cristin.no/v2"

# Per-request timeout in seconds
timeout_seconds = 30

# Languages requested for every call
lang = "en,nb"

# ============================================================================
# Import Settings
# ============================================================================
[import]
# Entries per list page (1-1000)
page_size = 1000

# Upper bound on pages fetched by one full import
max_pages = 19

# Progress is reported every N records
progress_every = 10

# Detail fetches kept in flight ahead of the writer (1-32, 1 = sequential)
fetch_ahead = 1

# Institution filter; full result imports require one
# institution = "185"

# Kind reconciled by `cristin-sync import-all`
default_kind = "persons"

# ============================================================================
# PostgreSQL Store
# ============================================================================
[postgresql]
# Connection string format: postgresql://[user[:password]@][host][:port][/dbname]
connection_string = "${CRISTIN_SYNC_DATABASE_URL}"

# Connection pool settings
max_connections = 10
connection_timeout_seconds = 30
statement_timeout_seconds = 60

# ============================================================================
# Schedule
# ============================================================================
[schedule]
# Fire jobs in `cristin-sync serve`
enabled = true

# Time zone cron expressions are evaluated in (IANA name or fixed offset)
time_zone = "GMT+1:00"

# Register the nightly reconciliation of persons, institutions, projects,
# units and results
include_defaults = true

# Extra jobs, or overrides of a default job with the same name
# [[schedule.jobs]]
# name = "import-fundings"
# cron = "0 3 * * *"
# kind = "fundings"
# type = "update"          # update | import
# institution = "185"      # import jobs only
# run_as = "user:cristin:importer"
# enabled = true

# ============================================================================
# Diagnostics
# ============================================================================
[diagnostics]
# Log before/after payloads of changed records at debug level
log_payload_changes = false

# ============================================================================
# Logging
# ============================================================================
[logging]
# Enable local JSON file logging
local_enabled = true

# Directory for log files
local_path = "/var/log/cristin-sync"

# Rotation: daily | hourly | never
local_rotation = "daily"
"#
        .to_string()
    }
}
