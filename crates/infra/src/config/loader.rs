//! Configuration loader
//!
//! Loads service configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the required variables are missing, falls back to a config file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `SIGNAGE_DB_PATH`: Database file path (required)
//! - `SIGNAGE_SOURCE_URL`: Campus feed base URL (required)
//! - `SIGNAGE_DB_POOL_SIZE`: Connection pool size
//! - `SIGNAGE_SOURCE_TOKEN`: Bearer token for the campus feed
//! - `SIGNAGE_SOURCE_TIMEOUT`: Feed request timeout in seconds
//! - `SIGNAGE_IMPORT_ENABLED`: Whether the import worker runs (true/false)
//! - `SIGNAGE_IMPORT_INTERVAL`: Seconds between import cycles
//! - `SIGNAGE_RECONCILE_INTERVAL`: Seconds between reconciliation ticks
//!
//! Unset optional variables keep their configuration defaults.
//!
//! ## File Locations
//! The loader probes `config.{json,toml}` and `signage.{json,toml}` in
//! the working directory, its parents (2 levels) and next to the
//! executable.

use std::path::{Path, PathBuf};

use signage_domain::{Config, Result, SignageError};

/// Load configuration with automatic fallback strategy.
///
/// # Errors
/// Returns `SignageError::Config` if neither source yields a valid
/// configuration.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "environment configuration incomplete, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables.
///
/// `SIGNAGE_DB_PATH` and `SIGNAGE_SOURCE_URL` are required; the
/// remaining variables override defaults when set.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.database.path = env_var("SIGNAGE_DB_PATH")?;
    config.source.base_url = env_var("SIGNAGE_SOURCE_URL")?;

    if let Some(pool_size) = env_parse::<u32>("SIGNAGE_DB_POOL_SIZE")? {
        config.database.pool_size = pool_size;
    }
    config.source.token = std::env::var("SIGNAGE_SOURCE_TOKEN").ok();
    if let Some(timeout) = env_parse::<u64>("SIGNAGE_SOURCE_TIMEOUT")? {
        config.source.timeout_seconds = timeout;
    }
    config.import.enabled = env_bool("SIGNAGE_IMPORT_ENABLED", config.import.enabled);
    if let Some(interval) = env_parse::<u64>("SIGNAGE_IMPORT_INTERVAL")? {
        config.import.interval_seconds = interval;
    }
    if let Some(interval) = env_parse::<u64>("SIGNAGE_RECONCILE_INTERVAL")? {
        config.reconcile.tick_interval_seconds = interval;
    }

    Ok(config)
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes multiple locations. Format is detected by
/// file extension (`.json` or `.toml`).
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SignageError::Config(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SignageError::Config("no config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SignageError::Config(format!("failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SignageError::Config(format!("invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SignageError::Config(format!("invalid JSON format: {e}"))),
        _ => Err(SignageError::Config(format!("unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files.
///
/// Returns the first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        for base in [&cwd, &cwd.join(".."), &cwd.join("../..")] {
            candidates.extend([
                base.join("config.json"),
                base.join("config.toml"),
                base.join("signage.json"),
                base.join("signage.toml"),
            ]);
        }
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend([
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("signage.json"),
                exe_dir.join("signage.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| SignageError::Config(format!("missing required environment variable: {key}")))
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| SignageError::Config(format!("invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable.
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off`
/// (case-insensitive). Returns `default` when unset.
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
