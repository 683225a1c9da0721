//! Error types used throughout the pipeline

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a [`GqlinkError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connection failures, timeouts, unreadable bodies
    Network,
    /// Credential problems (refresh failed, missing token)
    Authentication,
    /// 5xx responses
    Server,
    /// Malformed requests, 4xx responses, protocol violations
    Client,
    /// Invalid configuration or wiring
    Config,
}

/// Main error type for gqlink
///
/// Variants carry owned strings so a single physical-call failure can be
/// cloned out to every operation that was batched into it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum GqlinkError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GqlinkError {
    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Network(_) => ErrorCategory::Network,
            Self::Status { status, .. } if *status == 401 || *status == 403 => {
                ErrorCategory::Authentication
            }
            Self::Status { status, .. } if *status >= 500 => ErrorCategory::Server,
            Self::Status { .. } | Self::Protocol(_) | Self::Serialization(_) => {
                ErrorCategory::Client
            }
            Self::RefreshFailed(_) => ErrorCategory::Authentication,
            Self::Config(_) | Self::Internal(_) => ErrorCategory::Config,
        }
    }

    /// Whether a caller could reasonably retry the operation.
    ///
    /// The pipeline itself never retries; this is advisory for callers.
    pub fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Network | ErrorCategory::Server)
    }
}

/// Result type alias for gqlink operations
pub type Result<T> = std::result::Result<T, GqlinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(GqlinkError::Network("down".into()).category(), ErrorCategory::Network);
        assert_eq!(
            GqlinkError::Status { status: 401, body: String::new() }.category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            GqlinkError::Status { status: 502, body: String::new() }.category(),
            ErrorCategory::Server
        );
        assert_eq!(
            GqlinkError::Status { status: 400, body: String::new() }.category(),
            ErrorCategory::Client
        );
        assert_eq!(
            GqlinkError::RefreshFailed("boom".into()).category(),
            ErrorCategory::Authentication
        );
        assert_eq!(GqlinkError::Config("bad".into()).category(), ErrorCategory::Config);
    }

    #[test]
    fn test_is_retryable() {
        assert!(GqlinkError::Network("reset".into()).is_retryable());
        assert!(GqlinkError::Status { status: 503, body: String::new() }.is_retryable());
        assert!(!GqlinkError::Status { status: 404, body: String::new() }.is_retryable());
        assert!(!GqlinkError::Protocol("short batch".into()).is_retryable());
        assert!(!GqlinkError::RefreshFailed("nope".into()).is_retryable());
    }

    #[test]
    fn test_serializes_tagged() {
        let json = serde_json::to_value(GqlinkError::Network("timeout".into())).unwrap();
        assert_eq!(json["type"], "Network");
        assert_eq!(json["message"], "timeout");
    }
}
