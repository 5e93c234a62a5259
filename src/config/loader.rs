//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{Environment, StoreTarget, SyncConfig};
use crate::config::secret_string;
use crate::domain::errors::SyncError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "CRISTIN_SYNC_CONFIG";

/// File used when neither `--config` nor the environment names one
pub const DEFAULT_CONFIG_FILE: &str = "cristin-sync.toml";

/// Prefix of per-key environment overrides
const ENV_PREFIX: &str = "CRISTIN_SYNC";

/// Picks the configuration file: explicit path, then environment, then default
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    std::env::var(CONFIG_PATH_ENV)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into SyncConfig
/// 4. Applies environment variable overrides (CRISTIN_SYNC_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`SyncError::Configuration`] if the file is missing or unreadable,
/// a referenced variable is unset, the TOML is invalid, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use cristin_sync::config::loader::load_config;
///
/// let config = load_config("cristin-sync.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<SyncConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SyncError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SyncError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let config = parse_config(&contents)?;

    tracing::debug!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

/// Parses and validates configuration text
///
/// Runs the same pipeline as [`load_config`] minus the file read.
pub fn parse_config(contents: &str) -> Result<SyncConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: SyncConfig = toml::from_str(&contents)
        .map_err(|e| SyncError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        SyncError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| SyncError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    caps[0].to_string()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(SyncError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_key(section: &str, key: &str) -> String {
    format!("{ENV_PREFIX}_{section}_{key}")
}

fn env_value(section: &str, key: &str) -> Option<String> {
    std::env::var(env_key(section, key)).ok()
}

/// Parses an override, rejecting values of the wrong type
fn env_parse<T: std::str::FromStr>(section: &str, key: &str) -> Result<Option<T>> {
    match env_value(section, key) {
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            SyncError::Configuration(format!(
                "Invalid value '{}' for {}",
                raw,
                env_key(section, key)
            ))
        }),
        None => Ok(None),
    }
}

/// Applies environment variable overrides using the CRISTIN_SYNC_* prefix
///
/// Variables follow the pattern `CRISTIN_SYNC_<SECTION>_<KEY>`, for example
/// `CRISTIN_SYNC_CRISTIN_BASE_URL` or `CRISTIN_SYNC_IMPORT_PAGE_SIZE`.
fn apply_env_overrides(config: &mut SyncConfig) -> Result<()> {
    // Application overrides
    if let Some(val) = env_value("APPLICATION", "LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = env_parse("APPLICATION", "DRY_RUN")? {
        config.application.dry_run = val;
    }
    if let Ok(val) = std::env::var(format!("{ENV_PREFIX}_ENVIRONMENT")) {
        config.environment = match val.to_ascii_lowercase().as_str() {
            "development" => Environment::Development,
            "staging" => Environment::Staging,
            "production" => Environment::Production,
            other => {
                return Err(SyncError::Configuration(format!(
                    "Invalid value '{other}' for {ENV_PREFIX}_ENVIRONMENT"
                )))
            }
        };
    }

    // Cristin overrides
    if let Some(val) = env_value("CRISTIN", "BASE_URL") {
        config.cristin.base_url = val;
    }
    if let Some(val) = env_parse("CRISTIN", "TIMEOUT_SECONDS")? {
        config.cristin.timeout_seconds = val;
    }
    if let Some(val) = env_value("CRISTIN", "LANG") {
        config.cristin.lang = val;
    }
    if let Some(val) = env_value("CRISTIN", "USER_AGENT") {
        config.cristin.user_agent = val;
    }

    // Import overrides
    if let Some(val) = env_parse("IMPORT", "PAGE_SIZE")? {
        config.import.page_size = val;
    }
    if let Some(val) = env_parse("IMPORT", "MAX_PAGES")? {
        config.import.max_pages = val;
    }
    if let Some(val) = env_parse("IMPORT", "PROGRESS_EVERY")? {
        config.import.progress_every = val;
    }
    if let Some(val) = env_parse("IMPORT", "FETCH_AHEAD")? {
        config.import.fetch_ahead = val;
    }
    if let Some(val) = env_value("IMPORT", "INSTITUTION") {
        config.import.institution = Some(val);
    }
    if let Some(val) = env_value("IMPORT", "DEFAULT_KIND") {
        config.import.default_kind = val;
    }

    // Store overrides
    if let Ok(val) = std::env::var(format!("{ENV_PREFIX}_STORE_TARGET")) {
        config.store_target = match val.to_ascii_lowercase().as_str() {
            "postgresql" => StoreTarget::PostgreSQL,
            "memory" => StoreTarget::Memory,
            other => {
                return Err(SyncError::Configuration(format!(
                    "Invalid value '{other}' for {ENV_PREFIX}_STORE_TARGET"
                )))
            }
        };
    }
    if let Some(val) = env_value("POSTGRESQL", "CONNECTION_STRING") {
        match config.postgresql {
            Some(ref mut pg) => pg.connection_string = secret_string(val),
            None => {
                config.postgresql =
                    Some(super::schema::PostgreSQLConfig::new(secret_string(val)))
            }
        }
    }
    if let Some(ref mut pg) = config.postgresql {
        if let Some(val) = env_parse("POSTGRESQL", "MAX_CONNECTIONS")? {
            pg.max_connections = val;
        }
        if let Some(val) = env_parse("POSTGRESQL", "STATEMENT_TIMEOUT_SECONDS")? {
            pg.statement_timeout_seconds = val;
        }
    }

    // Schedule overrides
    if let Some(val) = env_parse("SCHEDULE", "ENABLED")? {
        config.schedule.enabled = val;
    }
    if let Some(val) = env_value("SCHEDULE", "TIME_ZONE") {
        config.schedule.time_zone = val;
    }

    // Diagnostics overrides
    if let Some(val) = env_parse("DIAGNOSTICS", "LOG_PAYLOAD_CHANGES")? {
        config.diagnostics.log_payload_changes = val;
    }

    // Logging overrides
    if let Some(val) = env_parse("LOGGING", "LOCAL_ENABLED")? {
        config.logging.local_enabled = val;
    }
    if let Some(val) = env_value("LOGGING", "LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = env_value("LOGGING", "LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
