//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file if one is present (existing variables win)
//! 2. Attempts to load from environment variables
//! 3. If `GRAPHQL_URL` is missing, falls back to loading from file
//! 4. Probes multiple paths for config files
//! 5. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `GRAPHQL_URL`: GraphQL endpoint (required)
//! - `GQLINK_BATCH_MAX`: Maximum operations per batched call
//! - `GQLINK_BATCH_INTERVAL_MS`: Batching window in milliseconds
//! - `GQLINK_TIMEOUT_SECS`: HTTP timeout in seconds
//! - `GQLINK_LOGIN_PATH`: Where to navigate after a forced logout
//! - `GQLINK_INVALID_CREDENTIAL_CODE`: Error code that triggers logout
//! - `GQLINK_POSSIBLE_TYPES`: Path to a `possibleTypes.json` table
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./gqlink.json` or `./gqlink.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names in the parent and grandparent directories

use std::path::{Path, PathBuf};
use std::str::FromStr;

use gqlink_core::PossibleTypes;
use gqlink_domain::constants::{
    ENV_BATCH_INTERVAL_MS, ENV_BATCH_MAX, ENV_GRAPHQL_URL, ENV_INVALID_CREDENTIAL_CODE,
    ENV_LOGIN_PATH, ENV_POSSIBLE_TYPES, ENV_TIMEOUT_SECS,
};
use gqlink_domain::{ClientConfig, GqlinkError, Result};

const CONFIG_FILE_NAMES: [&str; 4] = ["gqlink.json", "gqlink.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `GqlinkError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The resulting configuration fails validation
pub fn load() -> Result<ClientConfig> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)?
        }
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// Only `GRAPHQL_URL` is required; everything else falls back to defaults.
///
/// # Errors
/// Returns `GqlinkError::Config` if `GRAPHQL_URL` is missing or a numeric
/// variable cannot be parsed.
pub fn load_from_env() -> Result<ClientConfig> {
    let mut config = ClientConfig::new(env_var(ENV_GRAPHQL_URL)?);

    if let Some(max) = env_parse::<usize>(ENV_BATCH_MAX)? {
        config.batch.max_batch_size = max;
    }
    if let Some(interval) = env_parse::<u64>(ENV_BATCH_INTERVAL_MS)? {
        config.batch.interval_ms = interval;
    }
    if let Some(timeout) = env_parse::<u64>(ENV_TIMEOUT_SECS)? {
        config.timeout_secs = timeout;
    }
    if let Some(path) = env_opt(ENV_LOGIN_PATH) {
        config.auth.login_path = path;
    }
    if let Some(code) = env_opt(ENV_INVALID_CREDENTIAL_CODE) {
        config.auth.invalid_credential_code = code;
    }
    config.possible_types_path = env_opt(ENV_POSSIBLE_TYPES);

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `GqlinkError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(GqlinkError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            GqlinkError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| GqlinkError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Read the possible-types table named by the configuration, if any
///
/// # Errors
/// Returns `GqlinkError::Config` if the file cannot be read and
/// `GqlinkError::Serialization` if it is not a possible-types table.
pub fn load_possible_types(config: &ClientConfig) -> Result<PossibleTypes> {
    let Some(path) = config.possible_types_path.as_deref() else {
        return Ok(PossibleTypes::default());
    };

    let contents = std::fs::read_to_string(path)
        .map_err(|e| GqlinkError::Config(format!("Failed to read possible types {path}: {e}")))?;
    PossibleTypes::from_json(&contents)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| GqlinkError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| GqlinkError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(GqlinkError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    probe_from(&cwd)
}

fn probe_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .take(3)
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        GqlinkError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Non-empty environment variable, if set
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse an optional environment variable
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| GqlinkError::Config(format!("Invalid {key} ({raw}): {e}")))
        })
        .transpose()
}
