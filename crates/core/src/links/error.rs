//! Error observation closest to the wire
//!
//! Sees both channels: GraphQL errors inside a resolved response and
//! network errors from the transport. Stale-credential errors force a
//! logout followed by navigation to the login surface; everything is
//! logged; nothing is suppressed or rewritten.

use std::sync::Arc;

use async_trait::async_trait;
use gqlink_domain::constants::{DEFAULT_INVALID_CREDENTIAL_CODE, DEFAULT_LOGIN_PATH};
use gqlink_domain::{GraphqlErrorEntry, GraphqlResponse, Operation, Result};
use tracing::{error, info, warn};

use crate::pipeline::{Link, Next};
use crate::ports::{Navigator, Session};

/// Observes results and reacts to stale credentials
pub struct ErrorLink {
    session: Arc<dyn Session>,
    navigator: Arc<dyn Navigator>,
    invalid_credential_code: String,
    login_path: String,
}

impl ErrorLink {
    pub fn new(session: Arc<dyn Session>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            session,
            navigator,
            invalid_credential_code: DEFAULT_INVALID_CREDENTIAL_CODE.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }

    /// `extensions.code` that marks a stale credential
    pub fn with_invalid_credential_code(mut self, code: impl Into<String>) -> Self {
        self.invalid_credential_code = code.into();
        self
    }

    /// Where to send the user after a forced logout
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    async fn observe_graphql_errors(&self, operation_name: &str, response: &GraphqlResponse) {
        for entry in &response.errors {
            log_graphql_error(operation_name, entry);

            if entry.code() == Some(self.invalid_credential_code.as_str()) {
                self.force_logout(operation_name).await;
            }
        }
    }

    async fn force_logout(&self, operation_name: &str) {
        info!(operation = operation_name, "Credential rejected by server, logging out");

        match self.session.logout().await {
            Ok(()) => self.navigator.navigate(&self.login_path),
            Err(err) => error!(operation = operation_name, error = %err, "Logout failed"),
        }
    }
}

fn log_graphql_error(operation_name: &str, entry: &GraphqlErrorEntry) {
    warn!(
        operation = operation_name,
        message = %entry.message,
        locations = %entry.locations_display(),
        path = %entry.path_display(),
        extensions = ?entry.extensions,
        "[GraphQL error]"
    );
}

#[async_trait]
impl Link for ErrorLink {
    fn name(&self) -> &'static str {
        "error"
    }

    async fn call(&self, operation: Operation, next: Next<'_>) -> Result<GraphqlResponse> {
        let operation_name =
            operation.operation_name.clone().unwrap_or_else(|| "anonymous".to_string());

        let result = next.run(operation).await;

        match &result {
            Ok(response) => self.observe_graphql_errors(&operation_name, response).await,
            Err(err) => warn!(operation = %operation_name, error = %err, "[Network error]"),
        }

        result
    }
}
