//! Client configuration structures

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ACCESS_TOKEN_FIELD, DEFAULT_BATCH_INTERVAL_MS, DEFAULT_BATCH_MAX,
    DEFAULT_INVALID_CREDENTIAL_CODE, DEFAULT_LOGIN_PATH, DEFAULT_TIMEOUT_SECS,
    MAX_EXPIRY_LEEWAY_SECS,
};
use crate::errors::{GqlinkError, Result};

/// Top-level configuration for a GraphQL client instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Single endpoint for all GraphQL traffic (including token refresh)
    pub endpoint: String,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Path to a `possibleTypes.json` table for the cache
    #[serde(default)]
    pub possible_types_path: Option<String>,
}

/// Bounds for the batching transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_batch_max")]
    pub max_batch_size: usize,
    #[serde(default = "default_batch_interval_ms")]
    pub interval_ms: u64,
}

/// Credential handling knobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Field under `data` holding the refresh mutation payload
    #[serde(default = "default_access_token_field")]
    pub access_token_field: String,
    /// `extensions.code` value that means the presented credential is stale
    #[serde(default = "default_invalid_credential_code")]
    pub invalid_credential_code: String,
    /// Where to navigate after a forced logout
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Treat tokens as expired this many seconds early
    #[serde(default)]
    pub expiry_leeway_secs: i64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_batch_max() -> usize {
    DEFAULT_BATCH_MAX
}

fn default_batch_interval_ms() -> u64 {
    DEFAULT_BATCH_INTERVAL_MS
}

fn default_access_token_field() -> String {
    DEFAULT_ACCESS_TOKEN_FIELD.to_string()
}

fn default_invalid_credential_code() -> String {
    DEFAULT_INVALID_CREDENTIAL_CODE.to_string()
}

fn default_login_path() -> String {
    DEFAULT_LOGIN_PATH.to_string()
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { max_batch_size: DEFAULT_BATCH_MAX, interval_ms: DEFAULT_BATCH_INTERVAL_MS }
    }
}

impl BatchConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_field: default_access_token_field(),
            invalid_credential_code: default_invalid_credential_code(),
            login_path: default_login_path(),
            expiry_leeway_secs: 0,
        }
    }
}

impl ClientConfig {
    /// Configuration with defaults for everything but the endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            batch: BatchConfig::default(),
            auth: AuthConfig::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: None,
            possible_types_path: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check the invariants the pipeline relies on.
    ///
    /// # Errors
    /// Returns `GqlinkError::Config` when the endpoint is not an http(s) URL,
    /// the batch size or timeout is zero, the expiry leeway is out of range,
    /// or a required name is empty.
    pub fn validate(&self) -> Result<()> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(GqlinkError::Config("endpoint must not be empty".to_string()));
        }
        let url = url::Url::parse(endpoint)
            .map_err(|e| GqlinkError::Config(format!("invalid endpoint {endpoint}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(GqlinkError::Config(format!(
                "endpoint must be an http(s) URL: {endpoint}"
            )));
        }
        if self.batch.max_batch_size == 0 {
            return Err(GqlinkError::Config("batch.max_batch_size must be > 0".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(GqlinkError::Config("timeout_secs must be > 0".to_string()));
        }
        if !(0..=MAX_EXPIRY_LEEWAY_SECS).contains(&self.auth.expiry_leeway_secs) {
            return Err(GqlinkError::Config(format!(
                "auth.expiry_leeway_secs must be between 0 and {MAX_EXPIRY_LEEWAY_SECS}"
            )));
        }
        if self.auth.access_token_field.is_empty() {
            return Err(GqlinkError::Config("auth.access_token_field must be set".to_string()));
        }
        if self.auth.invalid_credential_code.is_empty() {
            return Err(GqlinkError::Config(
                "auth.invalid_credential_code must be set".to_string(),
            ));
        }
        Ok(())
    }
}
