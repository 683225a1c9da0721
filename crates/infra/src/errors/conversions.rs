//! Conversions from external infrastructure errors into domain errors.

use gqlink_domain::GqlinkError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub GqlinkError);

impl From<InfraError> for GqlinkError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<GqlinkError> for InfraError {
    fn from(value: GqlinkError) -> Self {
        InfraError(value)
    }
}

trait IntoGqlinkError {
    fn into_gqlink(self) -> GqlinkError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → GqlinkError */
/* -------------------------------------------------------------------------- */

impl IntoGqlinkError for HttpError {
    fn into_gqlink(self) -> GqlinkError {
        if self.is_timeout() {
            return GqlinkError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return GqlinkError::Network(format!("HTTP connection failure: {self}"));
        }

        if let Some(status) = self.status() {
            return GqlinkError::Status {
                status: status.as_u16(),
                body: status.canonical_reason().unwrap_or("unknown status").to_string(),
            };
        }

        if self.is_decode() {
            return GqlinkError::Serialization(format!("failed to decode response body: {self}"));
        }

        if self.is_builder() {
            return GqlinkError::Internal(format!("invalid HTTP request: {self}"));
        }

        GqlinkError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_gqlink())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → GqlinkError */
/* -------------------------------------------------------------------------- */

impl IntoGqlinkError for JsonError {
    fn into_gqlink(self) -> GqlinkError {
        use serde_json::error::Category;

        match self.classify() {
            Category::Io => GqlinkError::Network(format!("I/O error while reading JSON: {self}")),
            Category::Syntax | Category::Eof => {
                GqlinkError::Protocol(format!("response is not valid JSON: {self}"))
            }
            Category::Data => {
                GqlinkError::Serialization(format!("unexpected JSON shape: {self}"))
            }
        }
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_gqlink())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
