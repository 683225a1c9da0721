//! Port interfaces for the collaborators the pipeline consumes
//!
//! Each link receives the ports it needs at construction time; nothing in
//! the pipeline reaches for ambient state.

use async_trait::async_trait;
use gqlink_domain::{GraphqlResponse, Operation, RefreshRequest, RefreshResult, Result};

/// Persisted credential storage
///
/// Implementations must be cheap to call: links read the access token on
/// every operation.
pub trait AuthStore: Send + Sync {
    /// Current access token, if any
    fn get_auth_token(&self) -> Option<String>;

    /// Whether `token` is past its expiry
    fn is_token_expired(&self, token: &str) -> bool;

    /// Current refresh token, if any
    fn get_refresh_token(&self) -> Option<String>;

    /// Replace the access token
    fn set_auth_token(&self, token: String);

    /// Replace the refresh token (login flows)
    fn set_refresh_token(&self, token: String);

    /// Forget the access token only
    fn delete_jwt(&self);

    /// Forget every credential
    fn clear(&self);
}

/// Application session handling
#[async_trait]
pub trait Session: Send + Sync {
    /// End the current session. Resolves once logout has completed.
    async fn logout(&self) -> Result<()>;
}

/// Host navigation primitive (route change, window redirect, ...)
pub trait Navigator: Send + Sync {
    /// Send the host to `path` (the login route after a stale credential)
    fn navigate(&self, path: &str);
}

/// Source of idempotency/correlation identifiers
pub trait IdGenerator: Send + Sync {
    /// Fresh identifier, unique per call (used as `clientMutationId`)
    fn next_id(&self) -> String;
}

/// Issues the refresh mutation outside the pipeline
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Send `request` and return what the server answered.
    ///
    /// # Errors
    /// Returns an error only when no GraphQL response could be obtained
    /// (transport failure, unreadable body). GraphQL-level errors are part
    /// of the `RefreshResult`.
    async fn refresh(&self, request: RefreshRequest) -> Result<RefreshResult>;
}

/// Terminal stage of the pipeline
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one logical operation and resolve with its own result.
    async fn execute(&self, operation: Operation) -> Result<GraphqlResponse>;
}
