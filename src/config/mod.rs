//! Configuration management for cristin-sync.
//!
//! Configuration is read from a TOML file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Per-key overrides through `CRISTIN_SYNC_<SECTION>_<KEY>` variables
//! - Defaults for every setting
//! - Validation before anything runs
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cristin_sync::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("cristin-sync.toml")?;
//! println!("Cristin API: {}", config.cristin.base_url);
//! println!("Page size: {}", config.import.page_size);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "production"
//! store_target = "postgresql"
//!
//! [application]
//! log_level = "info"
//!
//! [cristin]
//! base_url = "https://api.cristin.no/v2"
//! lang = "en,nb"
//!
//! [import]
//! institution = "185"
//!
//! [postgresql]
//! connection_string = "${CRISTIN_SYNC_DATABASE_URL}"
//!
//! [schedule]
//! time_zone = "GMT+1:00"
//!
//! [[schedule.jobs]]
//! name = "import-fundings"
//! cron = "0 3 * * *"
//! kind = "fundings"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{
    load_config, parse_config, resolve_config_path, CONFIG_PATH_ENV, DEFAULT_CONFIG_FILE,
};
pub use schema::{
    ApplicationConfig, CristinConfig, DiagnosticsConfig, Environment, ImportConfig, JobSpec,
    JobType, LoggingConfig, PostgreSQLConfig, ScheduleConfig, StoreTarget, SyncConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
