//! Protocol constants
//!
//! Centralized location for wire-level names and defaults used throughout
//! the pipeline.

// Batching defaults
pub const DEFAULT_BATCH_MAX: usize = 100;
pub const DEFAULT_BATCH_INTERVAL_MS: u64 = 10;

// HTTP
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const BEARER_PREFIX: &str = "Bearer ";
pub const JSON_CONTENT_TYPE: &str = "application/json";

// Credential handling
pub const DEFAULT_INVALID_CREDENTIAL_CODE: &str = "invalid-jwt";
/// Upper bound for `auth.expiry_leeway_secs` (one day).
pub const MAX_EXPIRY_LEEWAY_SECS: i64 = 86_400;
pub const DEFAULT_LOGIN_PATH: &str = "/login/";
pub const DEFAULT_ACCESS_TOKEN_FIELD: &str = "refreshJwtAuthToken";
pub const REFRESHED_TOKEN_KEY: &str = "authToken";

/// Mutation used to mint a new access token from a refresh token.
pub const REFRESH_JWT_MUTATION: &str = r"
mutation RefreshJWTAuthToken($input: RefreshJwtAuthTokenInput!) {
  refreshJwtAuthToken(input: $input) {
    authToken
  }
}
";

// Cache
pub const TYPENAME_FIELD: &str = "__typename";
pub const REF_FIELD: &str = "__ref";
pub const SELECTION_FIELD: &str = "__selection";

// Environment variables
pub const ENV_GRAPHQL_URL: &str = "GRAPHQL_URL";
pub const ENV_BATCH_MAX: &str = "GQLINK_BATCH_MAX";
pub const ENV_BATCH_INTERVAL_MS: &str = "GQLINK_BATCH_INTERVAL_MS";
pub const ENV_TIMEOUT_SECS: &str = "GQLINK_TIMEOUT_SECS";
pub const ENV_LOGIN_PATH: &str = "GQLINK_LOGIN_PATH";
pub const ENV_INVALID_CREDENTIAL_CODE: &str = "GQLINK_INVALID_CREDENTIAL_CODE";
pub const ENV_POSSIBLE_TYPES: &str = "GQLINK_POSSIBLE_TYPES";
