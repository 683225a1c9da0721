//! Configured GraphQL client
//!
//! Wires the default collaborators into the request pipeline in its fixed
//! order (refresh, auth header, error observer, batching transport) and
//! layers the normalized cache on top.

use std::sync::Arc;

use gqlink_core::{
    AuthHeaderLink, AuthStore, ErrorLink, IdGenerator, InMemoryCache, Navigator, Pipeline,
    PossibleTypes, RefreshLink, Session, TokenRefresher, Transport,
};
use gqlink_domain::{ClientConfig, FetchPolicy, GqlinkError, GraphqlResponse, Operation, Result};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::auth::{GraphqlTokenRefresher, LoggingNavigator, MemoryAuthStore, StoreSession};
use crate::config::load_possible_types;
use crate::http::HttpClient;
use crate::ids::UuidGenerator;
use crate::transport::BatchHttpTransport;

/// GraphQL client with credential handling, batching, and a normalized cache
pub struct GraphqlClient {
    config: ClientConfig,
    pipeline: Pipeline,
    cache: Arc<InMemoryCache>,
    store: Arc<dyn AuthStore>,
}

impl GraphqlClient {
    /// Start building a client; only the configuration is required.
    pub fn builder() -> GraphqlClientBuilder {
        GraphqlClientBuilder::default()
    }

    /// Configuration the client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Normalized cache shared by `query` and `mutate`
    pub fn cache(&self) -> &InMemoryCache {
        &self.cache
    }

    /// Token store used by the refresh and auth-header links
    pub fn auth_store(&self) -> &Arc<dyn AuthStore> {
        &self.store
    }

    /// Link names in execution order
    pub fn link_names(&self) -> Vec<&'static str> {
        self.pipeline.link_names()
    }

    /// Run `operation` through the pipeline without touching the cache.
    ///
    /// # Errors
    /// Returns the transport or refresh failure for this operation.
    pub async fn execute(&self, operation: Operation) -> Result<GraphqlResponse> {
        self.pipeline.execute(operation).await
    }

    /// Run a query, consulting the cache according to `policy`.
    ///
    /// Error-free results are written to the cache under both policies.
    ///
    /// # Errors
    /// Returns the transport or refresh failure when the network is used.
    #[instrument(skip(self, query, variables))]
    pub async fn query(
        &self,
        query: &str,
        variables: Value,
        policy: FetchPolicy,
    ) -> Result<GraphqlResponse> {
        let operation = Operation::new(query).with_variables(variables);

        if policy == FetchPolicy::CacheFirst {
            if let Some(data) = self.cache.read_query(&operation) {
                debug!("Served from cache");
                return Ok(GraphqlResponse::from_data(data));
            }
        }

        let response = self.pipeline.execute(operation.clone()).await?;
        if let Some(data) = cacheable(&response) {
            self.cache.write_query(&operation, data);
        }
        Ok(response)
    }

    /// Run a mutation; identifiable objects in its result refresh the cache.
    ///
    /// # Errors
    /// Returns `GqlinkError::Protocol` without sending anything when the
    /// document is not a mutation, otherwise the transport or refresh failure
    /// for this operation.
    #[instrument(skip(self, mutation, variables))]
    pub async fn mutate(&self, mutation: &str, variables: Value) -> Result<GraphqlResponse> {
        let operation = Operation::new(mutation).with_variables(variables);
        if !operation.is_mutation() {
            return Err(GqlinkError::Protocol(format!(
                "mutate() expects a mutation document, got a {}",
                operation.kind()
            )));
        }

        let response = self.pipeline.execute(operation).await?;

        if let Some(data) = cacheable(&response) {
            let writes = self.cache.write_entities(data);
            debug!(writes, "Merged mutation result into cache");
        }
        Ok(response)
    }

    /// Drop every cached result (e.g. after a user switch)
    pub fn reset_store(&self) {
        self.cache.reset();
    }
}

/// Data of a response that carries no errors
fn cacheable(response: &GraphqlResponse) -> Option<&Value> {
    if response.errors.is_empty() {
        response.data.as_ref()
    } else {
        None
    }
}

/// Builder for [`GraphqlClient`]
///
/// Only the configuration is required. Every collaborator falls back to the
/// in-crate default: [`MemoryAuthStore`], [`StoreSession`],
/// [`LoggingNavigator`], [`UuidGenerator`], [`BatchHttpTransport`] and
/// [`GraphqlTokenRefresher`].
#[derive(Default)]
pub struct GraphqlClientBuilder {
    config: Option<ClientConfig>,
    auth_store: Option<Arc<dyn AuthStore>>,
    session: Option<Arc<dyn Session>>,
    navigator: Option<Arc<dyn Navigator>>,
    ids: Option<Arc<dyn IdGenerator>>,
    transport: Option<Arc<dyn Transport>>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    possible_types: Option<PossibleTypes>,
}

impl GraphqlClientBuilder {
    /// Client configuration (required)
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the in-memory token store
    pub fn auth_store(mut self, store: Arc<dyn AuthStore>) -> Self {
        self.auth_store = Some(store);
        self
    }

    /// Replace the logout handler invoked on stale credentials
    pub fn session(mut self, session: Arc<dyn Session>) -> Self {
        self.session = Some(session);
        self
    }

    /// Replace the navigator that receives the login redirect
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Replace the `clientMutationId` source for refresh calls
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Replace the batching HTTP transport
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the refresh-mutation caller
    pub fn refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Use this table instead of the one named by the configuration
    pub fn possible_types(mut self, possible_types: PossibleTypes) -> Self {
        self.possible_types = Some(possible_types);
        self
    }

    /// # Errors
    /// Returns `GqlinkError::Config` when the configuration is missing or
    /// invalid, or when the HTTP client or possible-types table cannot be
    /// set up.
    pub fn build(self) -> Result<GraphqlClient> {
        let config =
            self.config.ok_or_else(|| GqlinkError::Config("Client config not set".into()))?;
        config.validate()?;

        let store = self.auth_store.unwrap_or_else(|| {
            Arc::new(MemoryAuthStore::new().with_leeway(config.auth.expiry_leeway_secs))
        });
        let session = self.session.unwrap_or_else(|| Arc::new(StoreSession::new(store.clone())));
        let navigator = self.navigator.unwrap_or_else(|| Arc::new(LoggingNavigator));
        let ids = self.ids.unwrap_or_else(|| Arc::new(UuidGenerator));

        let mut http = HttpClient::builder().timeout(config.timeout());
        if let Some(agent) = &config.user_agent {
            http = http.user_agent(agent.clone());
        }
        let http = http.build()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(BatchHttpTransport::new(http.clone(), &config.endpoint, &config.batch)),
        };
        let refresher = match self.refresher {
            Some(refresher) => refresher,
            None => Arc::new(GraphqlTokenRefresher::new(
                http,
                &config.endpoint,
                &config.auth.access_token_field,
            )),
        };
        let possible_types = match self.possible_types {
            Some(table) => table,
            None => load_possible_types(&config)?,
        };

        let pipeline = Pipeline::builder()
            .link(RefreshLink::new(store.clone(), refresher, ids))
            .link(AuthHeaderLink::new(store.clone()))
            .link(
                ErrorLink::new(session, navigator)
                    .with_invalid_credential_code(&config.auth.invalid_credential_code)
                    .with_login_path(&config.auth.login_path),
            )
            .transport(transport)
            .build()?;

        Ok(GraphqlClient {
            config,
            pipeline,
            cache: Arc::new(InMemoryCache::new(possible_types)),
            store,
        })
    }
}

#[cfg(test)]
mod tests {
    use gqlink_core::testing::{
        MockAuthStore, MockRefresher, RecordingNavigator, RecordingSession, RecordingTransport,
        SequentialIds,
    };
    use gqlink_domain::GraphqlErrorEntry;
    use serde_json::json;

    use super::*;

    const VIEWER: &str = "query Viewer { viewer { __typename id name } }";

    struct Harness {
        client: GraphqlClient,
        transport: Arc<RecordingTransport>,
    }

    fn harness() -> Harness {
        let transport = Arc::new(RecordingTransport::default());
        let client = GraphqlClient::builder()
            .config(ClientConfig::new("http://localhost:4000/graphql"))
            .auth_store(Arc::new(MockAuthStore::with_tokens("access", "refresh")))
            .session(Arc::new(RecordingSession::new()))
            .navigator(Arc::new(RecordingNavigator::default()))
            .id_generator(Arc::new(SequentialIds::default()))
            .refresher(Arc::new(MockRefresher::issuing("fresh")))
            .transport(transport.clone())
            .build()
            .expect("client");
        Harness { client, transport }
    }

    fn viewer(name: &str) -> GraphqlResponse {
        GraphqlResponse::from_data(json!({ "viewer": { "__typename": "User", "id": "u1", "name": name } }))
    }

    #[test]
    fn links_run_in_fixed_order() {
        assert_eq!(harness().client.link_names(), vec!["refresh", "auth-header", "error"]);
    }

    #[test]
    fn build_requires_valid_config() {
        let missing = GraphqlClient::builder().build();
        assert!(matches!(missing, Err(GqlinkError::Config(_))));

        let invalid = GraphqlClient::builder().config(ClientConfig::new("not a url")).build();
        assert!(matches!(invalid, Err(GqlinkError::Config(_))));
    }

    #[test]
    fn build_rejects_unrepresentable_leeway() {
        let mut config = ClientConfig::new("http://localhost:4000/graphql");
        config.auth.expiry_leeway_secs = i64::MAX;

        let result = GraphqlClient::builder().config(config).build();

        assert!(matches!(result, Err(GqlinkError::Config(msg)) if msg.contains("leeway")));
    }

    #[tokio::test]
    async fn cache_first_skips_network_on_hit() {
        let Harness { client, transport } = harness();
        transport.push_result(Ok(viewer("Ada")));

        let first = client.query(VIEWER, json!({}), FetchPolicy::CacheFirst).await.unwrap();
        let second = client.query(VIEWER, json!({}), FetchPolicy::CacheFirst).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(transport.operations().len(), 1);
        assert_eq!(
            transport.operations()[0].context.header("Authorization"),
            Some("Bearer access")
        );
    }

    #[tokio::test]
    async fn network_only_always_fetches_and_updates_cache() {
        let Harness { client, transport } = harness();
        transport.push_result(Ok(viewer("Ada")));
        transport.push_result(Ok(viewer("Ada Lovelace")));

        client.query(VIEWER, json!({}), FetchPolicy::CacheFirst).await.unwrap();
        client.query(VIEWER, json!({}), FetchPolicy::NetworkOnly).await.unwrap();
        let cached = client.query(VIEWER, json!({}), FetchPolicy::CacheFirst).await.unwrap();

        assert_eq!(transport.operations().len(), 2);
        assert_eq!(cached.data.unwrap()["viewer"]["name"], "Ada Lovelace");
    }

    #[tokio::test]
    async fn results_with_errors_are_not_cached() {
        let Harness { client, transport } = harness();
        let mut partial = viewer("Ada");
        partial.errors.push(GraphqlErrorEntry::new("partial failure"));
        transport.push_result(Ok(partial));

        client.query(VIEWER, json!({}), FetchPolicy::CacheFirst).await.unwrap();

        assert!(client.cache().is_empty());
    }

    #[tokio::test]
    async fn mutation_results_refresh_cached_entities() {
        let Harness { client, transport } = harness();
        transport.push_result(Ok(viewer("Ada")));
        transport.push_result(Ok(GraphqlResponse::from_data(json!({
            "renameUser": { "user": { "__typename": "User", "id": "u1", "name": "Grace" } }
        }))));

        client.query(VIEWER, json!({}), FetchPolicy::CacheFirst).await.unwrap();
        client
            .mutate("mutation { renameUser { user { __typename id name } } }", json!({}))
            .await
            .unwrap();
        let cached = client.query(VIEWER, json!({}), FetchPolicy::CacheFirst).await.unwrap();

        assert_eq!(cached.data.unwrap()["viewer"]["name"], "Grace");
        assert_eq!(transport.operations().len(), 2);
    }

    #[tokio::test]
    async fn mutate_rejects_query_documents_before_sending() {
        let Harness { client, transport } = harness();

        let result = client.mutate(VIEWER, json!({})).await;

        assert!(matches!(result, Err(GqlinkError::Protocol(msg)) if msg.contains("query")));
        assert!(transport.operations().is_empty());
    }

    #[tokio::test]
    async fn reset_store_forces_refetch() {
        let Harness { client, transport } = harness();

        client.query(VIEWER, json!({}), FetchPolicy::CacheFirst).await.unwrap();
        client.reset_store();
        client.query(VIEWER, json!({}), FetchPolicy::CacheFirst).await.unwrap();

        assert_eq!(transport.operations().len(), 2);
    }
}
