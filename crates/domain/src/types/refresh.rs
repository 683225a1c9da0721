//! Payloads of the token refresh mutation

use serde::{Deserialize, Serialize};

use super::response::{GraphqlErrorEntry, GraphqlResponse};
use crate::constants::{REFRESHED_TOKEN_KEY, REFRESH_JWT_MUTATION};

/// `input` argument of the refresh mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshInput {
    pub jwt_refresh_token: Option<String>,
    pub client_mutation_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshVariables {
    pub input: RefreshInput,
}

/// Body POSTed to mint a new access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub query: String,
    pub variables: RefreshVariables,
}

impl RefreshRequest {
    pub fn new(refresh_token: Option<String>, client_mutation_id: impl Into<String>) -> Self {
        Self {
            query: REFRESH_JWT_MUTATION.to_string(),
            variables: RefreshVariables {
                input: RefreshInput {
                    jwt_refresh_token: refresh_token,
                    client_mutation_id: client_mutation_id.into(),
                },
            },
        }
    }
}

/// What came back from a refresh call that reached the server
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshResult {
    pub auth_token: Option<String>,
    pub errors: Vec<GraphqlErrorEntry>,
}

impl RefreshResult {
    /// Extract `data.<field>.authToken` and the error list from a raw
    /// response envelope.
    pub fn from_response(response: GraphqlResponse, field: &str) -> Self {
        let auth_token = response
            .data
            .as_ref()
            .and_then(|data| data.get(field))
            .and_then(|payload| payload.get(REFRESHED_TOKEN_KEY))
            .and_then(|token| token.as_str())
            .filter(|token| !token.is_empty())
            .map(ToString::to_string);

        Self { auth_token, errors: response.errors }
    }

    /// A refresh only counts when the server returned a token and no errors
    pub fn token(&self) -> Option<&str> {
        if self.errors.is_empty() {
            self.auth_token.as_deref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_request_shape() {
        let body = serde_json::to_value(RefreshRequest::new(Some("r-1".into()), "cid-1")).unwrap();
        assert_eq!(
            body["variables"],
            json!({ "input": { "jwtRefreshToken": "r-1", "clientMutationId": "cid-1" } })
        );
        assert!(body["query"].as_str().unwrap().contains("refreshJwtAuthToken(input: $input)"));
    }

    #[test]
    fn test_extracts_token() {
        let response = GraphqlResponse::from_data(
            json!({ "refreshJwtAuthToken": { "authToken": "fresh" } }),
        );
        let result = RefreshResult::from_response(response, "refreshJwtAuthToken");
        assert_eq!(result.token(), Some("fresh"));
    }

    #[test]
    fn test_errors_suppress_token() {
        let mut response = GraphqlResponse::from_data(
            json!({ "refreshJwtAuthToken": { "authToken": "fresh" } }),
        );
        response.errors.push(GraphqlErrorEntry::new("refresh token revoked"));

        let result = RefreshResult::from_response(response, "refreshJwtAuthToken");
        assert_eq!(result.token(), None);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_missing_payload_has_no_token() {
        let response = GraphqlResponse::from_data(json!({ "refreshJwtAuthToken": null }));
        assert_eq!(RefreshResult::from_response(response, "refreshJwtAuthToken").token(), None);
    }
}
