//! Bearer header injection

use std::sync::Arc;

use async_trait::async_trait;
use gqlink_domain::constants::{AUTHORIZATION_HEADER, BEARER_PREFIX};
use gqlink_domain::{GraphqlResponse, Operation, Result};

use crate::pipeline::{Link, Next};
use crate::ports::AuthStore;

/// Attaches `Authorization: Bearer <token>` when a token is stored.
///
/// Read-only: never refreshes, never short-circuits.
pub struct AuthHeaderLink {
    store: Arc<dyn AuthStore>,
}

impl AuthHeaderLink {
    pub fn new(store: Arc<dyn AuthStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Link for AuthHeaderLink {
    fn name(&self) -> &'static str {
        "auth-header"
    }

    async fn call(&self, mut operation: Operation, next: Next<'_>) -> Result<GraphqlResponse> {
        if let Some(token) = self.store.get_auth_token().filter(|token| !token.is_empty()) {
            operation.context.set_header(AUTHORIZATION_HEADER, format!("{BEARER_PREFIX}{token}"));
        }
        next.run(operation).await
    }
}
