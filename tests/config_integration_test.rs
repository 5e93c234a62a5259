//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables hold ENV_MUTEX to avoid
//! interference between tests.

use cristin_sync::config::{
    load_config, resolve_config_path, Environment, JobType, StoreTarget, CONFIG_PATH_ENV,
};
use secrecy::ExposeSecret;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn cleanup_env_vars() {
    std::env::remove_var("CRISTIN_SYNC_APPLICATION_LOG_LEVEL");
    std::env::remove_var("CRISTIN_SYNC_IMPORT_PAGE_SIZE");
    std::env::remove_var("CRISTIN_SYNC_IMPORT_INSTITUTION");
    std::env::remove_var("CRISTIN_SYNC_STORE_TARGET");
    std::env::remove_var("CRISTIN_SYNC_POSTGRESQL_CONNECTION_STRING");
    std::env::remove_var("TEST_CS_DATABASE_URL");
    std::env::remove_var(CONFIG_PATH_ENV);
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(contents.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(
        r#"
environment = "staging"
store_target = "postgresql"

[application]
log_level = "debug"
dry_run = true

[cristin]
base_url = "https://api.cristin.no/v2/"
timeout_seconds = 10
lang = "nb"

[import]
page_size = 500
max_pages = 40
progress_every = 25
fetch_ahead = 4
institution = "185"
default_kind = "units"

[postgresql]
connection_string = "postgresql://sync:secret@db:5432/cristin"
max_connections = 5

[schedule]
time_zone = "UTC"
include_defaults = false

[[schedule.jobs]]
name = "import-results-185"
cron = "15 3 * * *"
kind = "results"
type = "import"
institution = "185"
run_as = "user:cristin:importer"

[diagnostics]
log_payload_changes = true

[logging]
local_enabled = false
local_path = "/tmp/cristin-sync"
local_rotation = "hourly"
"#,
    );

    let config = load_config(file.path()).expect("Failed to load config");

    assert_eq!(config.environment, Environment::Staging);
    assert_eq!(config.application.log_level, "debug");
    assert!(config.application.dry_run);

    assert_eq!(config.cristin.base_url, "https://api.cristin.no/v2/");
    assert_eq!(config.cristin.timeout_seconds, 10);
    assert_eq!(config.cristin.lang, "nb");

    assert_eq!(config.import.page_size, 500);
    assert_eq!(config.import.max_pages, 40);
    assert_eq!(config.import.progress_every, 25);
    assert_eq!(config.import.fetch_ahead, 4);
    assert_eq!(config.import.institution.as_deref(), Some("185"));
    assert_eq!(config.import.default_kind, "units");

    assert_eq!(config.store_target, StoreTarget::PostgreSQL);
    let pg = config.postgresql.as_ref().unwrap();
    assert_eq!(pg.max_connections, 5);

    assert_eq!(config.schedule.time_zone, "UTC");
    assert!(!config.schedule.include_defaults);
    assert_eq!(config.schedule.jobs.len(), 1);
    assert_eq!(config.schedule.jobs[0].job_type, JobType::Import);
    assert_eq!(config.schedule.jobs[0].run_as.as_deref(), Some("user:cristin:importer"));

    assert!(config.diagnostics.log_payload_changes);
    assert!(!config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_load_minimal_config_with_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config("store_target = \"memory\"\n");
    let config = load_config(file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "info");
    assert!(!config.application.dry_run);
    assert_eq!(config.cristin.base_url, "https://api.cristin.no/v2");
    assert_eq!(config.import.page_size, 1000);
    assert_eq!(config.import.max_pages, 19);
    assert_eq!(config.import.fetch_ahead, 1);
    assert!(config.import.institution.is_none());
    assert_eq!(config.schedule.time_zone, "GMT+1:00");
    assert!(config.schedule.enabled);
    assert!(config.schedule.include_defaults);
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_CS_DATABASE_URL", "postgresql://u:p@localhost/cristin");

    let file = write_config(
        r#"
[postgresql]
connection_string = "${TEST_CS_DATABASE_URL}"
"#,
    );
    let config = load_config(file.path()).expect("Failed to load config");

    let pg = config.postgresql.unwrap();
    let conn: &str = pg.connection_string.expose_secret().as_ref();
    assert_eq!(conn, "postgresql://u:p@localhost/cristin");
    cleanup_env_vars();
}

#[test]
fn test_missing_env_var_is_reported() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(
        r#"
[postgresql]
connection_string = "${TEST_CS_DATABASE_URL}"
"#,
    );
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("TEST_CS_DATABASE_URL"));
}

#[test]
fn test_env_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("CRISTIN_SYNC_APPLICATION_LOG_LEVEL", "warn");
    std::env::set_var("CRISTIN_SYNC_IMPORT_PAGE_SIZE", "50");
    std::env::set_var("CRISTIN_SYNC_IMPORT_INSTITUTION", "194");
    std::env::set_var("CRISTIN_SYNC_STORE_TARGET", "memory");

    let file = write_config(
        r#"
[import]
page_size = 1000
"#,
    );
    let config = load_config(file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "warn");
    assert_eq!(config.import.page_size, 50);
    assert_eq!(config.import.institution.as_deref(), Some("194"));
    assert_eq!(config.store_target, StoreTarget::Memory);
    cleanup_env_vars();
}

#[test]
fn test_invalid_override_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("CRISTIN_SYNC_IMPORT_PAGE_SIZE", "lots");

    let file = write_config("store_target = \"memory\"\n");
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("CRISTIN_SYNC_IMPORT_PAGE_SIZE"));
    cleanup_env_vars();
}

#[test]
fn test_validation_failures() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let cases = [
        "store_target = \"memory\"\n[import]\npage_size = 0\n",
        "store_target = \"memory\"\nenvironment = \"production\"\n",
        "store_target = \"memory\"\n[schedule]\ntime_zone = \"Mars/Olympus\"\n",
        "store_target = \"memory\"\n[[schedule.jobs]]\nname = \"x\"\ncron = \"0 25 * * *\"\nkind = \"persons\"\n",
        "store_target = \"postgresql\"\n",
    ];

    for contents in cases {
        let file = write_config(contents);
        assert!(
            load_config(file.path()).is_err(),
            "expected rejection of:\n{contents}"
        );
    }
}

#[test]
fn test_missing_file() {
    let err = load_config("/nonexistent/cristin-sync.toml").unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn test_config_path_resolution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    assert_eq!(resolve_config_path(None), PathBuf::from("cristin-sync.toml"));

    std::env::set_var(CONFIG_PATH_ENV, "/etc/cristin-sync/prod.toml");
    assert_eq!(resolve_config_path(None), PathBuf::from("/etc/cristin-sync/prod.toml"));
    assert_eq!(
        resolve_config_path(Some(Path::new("local.toml"))),
        PathBuf::from("local.toml")
    );
    cleanup_env_vars();
}
