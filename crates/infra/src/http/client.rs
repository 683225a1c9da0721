use std::collections::BTreeMap;
use std::time::Duration;

use gqlink_domain::constants::{DEFAULT_TIMEOUT_SECS, JSON_CONTENT_TYPE};
use gqlink_domain::{GqlinkError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, Response};
use serde::Serialize;
use tracing::debug;

use crate::errors::InfraError;

/// Thin wrapper over `reqwest` with a request timeout.
///
/// Every call is a single attempt; failures surface to the caller as-is.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// POST `body` as JSON with JSON content negotiation and the extra
    /// `headers`.
    ///
    /// # Errors
    /// Fails on serialization, invalid header, or transport errors. Non-2xx
    /// responses are returned as `Ok` for the caller to inspect.
    pub async fn post_json<B>(
        &self,
        url: &str,
        body: &B,
        headers: &BTreeMap<String, String>,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let payload =
            serde_json::to_vec(body).map_err(|err| GqlinkError::from(InfraError::from(err)))?;

        let mut header_map = HeaderMap::new();
        header_map.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        header_map.insert(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE));
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| GqlinkError::Internal(format!("invalid header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| GqlinkError::Internal(format!("invalid value for header {name}: {e}")))?;
            header_map.insert(name, value);
        }

        debug!(%url, bytes = payload.len(), "sending HTTP request");
        let response = self
            .client
            .post(url)
            .headers(header_map)
            .body(payload)
            .send()
            .await
            .map_err(|err| {
                debug!(%url, error = %err, "HTTP request failed");
                GqlinkError::from(InfraError::from(err))
            })?;

        debug!(%url, status = %response.status(), "received HTTP response");
        Ok(response)
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS), user_agent: None }
    }
}

impl HttpClientBuilder {
    /// Whole-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `User-Agent` sent with every request
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// # Errors
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn build(self) -> Result<HttpClient> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(|err| GqlinkError::from(InfraError::from(err)))?;
        Ok(HttpClient { client })
    }
}
