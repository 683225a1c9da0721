//! Access token refresh before forwarding
//!
//! Expired tokens are refreshed single-flight: every operation that finds
//! the token expired while a refresh is running awaits that same refresh
//! instead of issuing its own.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use gqlink_domain::{GqlinkError, GraphqlResponse, Operation, RefreshRequest, Result};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::pipeline::{Link, Next};
use crate::ports::{AuthStore, IdGenerator, TokenRefresher};

type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// How a refresh attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New access token stored
    Refreshed,
    /// Server answered without a usable token; stored token untouched
    Rejected,
    /// No answer from the server; stored access token cleared
    Failed(GqlinkError),
}

/// Ensures a non-expired access token before forwarding.
///
/// - No token, or a valid one: forward unchanged.
/// - Expired: join (or start) the in-flight refresh, then forward.
/// - Refresh rejected by the server: forward with whatever is stored.
/// - Refresh transport failure: token cleared, `RefreshFailed` returned.
pub struct RefreshLink {
    store: Arc<dyn AuthStore>,
    refresher: Arc<dyn TokenRefresher>,
    ids: Arc<dyn IdGenerator>,
    in_flight: Mutex<Option<SharedRefresh>>,
}

impl RefreshLink {
    /// `ids` supplies the `clientMutationId` of each refresh call.
    pub fn new(
        store: Arc<dyn AuthStore>,
        refresher: Arc<dyn TokenRefresher>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self { store, refresher, ids, in_flight: Mutex::new(None) }
    }

    /// Absent or unexpired tokens need nothing
    fn needs_refresh(&self) -> bool {
        match self.store.get_auth_token() {
            Some(token) if !token.is_empty() => self.store.is_token_expired(&token),
            _ => false,
        }
    }

    /// Refresh if the stored token is expired, sharing any refresh already
    /// running. Returns `None` when no refresh was needed.
    pub async fn ensure_fresh_token(&self) -> Option<RefreshOutcome> {
        if !self.needs_refresh() {
            return None;
        }

        let refresh = self.join_or_start()?;
        let outcome = refresh.clone().await;
        self.release(&refresh);
        Some(outcome)
    }

    fn join_or_start(&self) -> Option<SharedRefresh> {
        let mut slot = self.in_flight.lock();

        if let Some(existing) = slot.as_ref() {
            // A finished refresh left behind by a dropped caller is stale.
            if existing.peek().is_none() {
                debug!("Joining in-flight token refresh");
                return Some(existing.clone());
            }
        }

        // Re-check under the lock: a refresh may have landed since the
        // caller looked.
        if !self.needs_refresh() {
            *slot = None;
            return None;
        }

        let refresh = Self::refresh_once(
            Arc::clone(&self.store),
            Arc::clone(&self.refresher),
            Arc::clone(&self.ids),
        )
        .boxed()
        .shared();
        *slot = Some(refresh.clone());
        Some(refresh)
    }

    fn release(&self, refresh: &SharedRefresh) {
        let mut slot = self.in_flight.lock();
        if slot.as_ref().is_some_and(|current| current.ptr_eq(refresh)) {
            *slot = None;
        }
    }

    async fn refresh_once(
        store: Arc<dyn AuthStore>,
        refresher: Arc<dyn TokenRefresher>,
        ids: Arc<dyn IdGenerator>,
    ) -> RefreshOutcome {
        let client_mutation_id = ids.next_id();
        let request = RefreshRequest::new(store.get_refresh_token(), client_mutation_id.clone());

        info!(client_mutation_id = %client_mutation_id, "Access token expired, refreshing");

        match refresher.refresh(request).await {
            Ok(result) => {
                if let Some(token) = result.token() {
                    store.set_auth_token(token.to_string());
                    info!(client_mutation_id = %client_mutation_id, "Access token refreshed");
                    return RefreshOutcome::Refreshed;
                }

                if result.errors.is_empty() {
                    warn!(client_mutation_id = %client_mutation_id, "Refresh response carried no token");
                }
                for entry in &result.errors {
                    warn!(
                        client_mutation_id = %client_mutation_id,
                        message = %entry.message,
                        code = entry.code().unwrap_or("none"),
                        "Refresh mutation returned an error"
                    );
                }
                RefreshOutcome::Rejected
            }
            Err(err) => {
                error!(
                    client_mutation_id = %client_mutation_id,
                    error = %err,
                    "Token refresh failed, clearing stored access token"
                );
                store.delete_jwt();
                RefreshOutcome::Failed(err)
            }
        }
    }
}

#[async_trait]
impl Link for RefreshLink {
    fn name(&self) -> &'static str {
        "refresh"
    }

    async fn call(&self, operation: Operation, next: Next<'_>) -> Result<GraphqlResponse> {
        if let Some(RefreshOutcome::Failed(err)) = self.ensure_fresh_token().await {
            return Err(match err {
                GqlinkError::RefreshFailed(_) => err,
                other => GqlinkError::RefreshFailed(other.to_string()),
            });
        }
        next.run(operation).await
    }
}
