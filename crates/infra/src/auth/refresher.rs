//! Refresh mutation client
//!
//! Sends the refresh mutation as a single, unbatched POST. It must not go
//! through the pipeline: the refresh link is what guards the pipeline.

use std::collections::BTreeMap;

use async_trait::async_trait;
use gqlink_core::TokenRefresher;
use gqlink_domain::{GqlinkError, GraphqlResponse, RefreshRequest, RefreshResult, Result};
use tracing::{debug, instrument};

use crate::errors::InfraError;
use crate::http::HttpClient;

/// [`TokenRefresher`] that talks to the GraphQL endpoint directly
pub struct GraphqlTokenRefresher {
    http: HttpClient,
    endpoint: String,
    access_token_field: String,
}

impl GraphqlTokenRefresher {
    /// Refresher posting the refresh mutation unbatched through `http`.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - GraphQL endpoint (same one the pipeline uses)
    /// * `access_token_field` - field under `data` carrying `authToken`
    pub fn new(
        http: HttpClient,
        endpoint: impl Into<String>,
        access_token_field: impl Into<String>,
    ) -> Self {
        Self { http, endpoint: endpoint.into(), access_token_field: access_token_field.into() }
    }
}

#[async_trait]
impl TokenRefresher for GraphqlTokenRefresher {
    #[instrument(skip(self, request), fields(endpoint = %self.endpoint))]
    async fn refresh(&self, request: RefreshRequest) -> Result<RefreshResult> {
        let response = self.http.post_json(&self.endpoint, &request, &BTreeMap::new()).await?;

        let status = response.status();
        let body = response.bytes().await.map_err(|err| GqlinkError::from(InfraError::from(err)))?;
        if !status.is_success() {
            return Err(GqlinkError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let envelope: GraphqlResponse =
            serde_json::from_slice(&body).map_err(|err| GqlinkError::from(InfraError::from(err)))?;
        let result = RefreshResult::from_response(envelope, &self.access_token_field);
        debug!(
            token_issued = result.auth_token.is_some(),
            errors = result.errors.len(),
            "Refresh mutation answered"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn refresher(server: &MockServer) -> GraphqlTokenRefresher {
        GraphqlTokenRefresher::new(HttpClient::new().unwrap(), server.uri(), "refreshJwtAuthToken")
    }

    #[tokio::test]
    async fn sends_refresh_input_and_reads_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "variables": { "input": { "jwtRefreshToken": "r-1", "clientMutationId": "id-1" } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "refreshJwtAuthToken": { "authToken": "fresh" } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = refresher(&server)
            .refresh(RefreshRequest::new(Some("r-1".into()), "id-1"))
            .await
            .unwrap();

        assert_eq!(result.token(), Some("fresh"));
    }

    #[tokio::test]
    async fn graphql_errors_are_a_result_not_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": null,
                "errors": [{ "message": "refresh token expired" }]
            })))
            .mount(&server)
            .await;

        let result =
            refresher(&server).refresh(RefreshRequest::new(None, "id-1")).await.unwrap();

        assert_eq!(result.token(), None);
        assert_eq!(result.errors.len(), 1);
    }

    #[tokio::test]
    async fn server_error_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let result = refresher(&server).refresh(RefreshRequest::new(None, "id-1")).await;

        assert_eq!(result, Err(GqlinkError::Status { status: 500, body: "boom".into() }));
    }
}
