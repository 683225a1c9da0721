//! Mock implementations of the pipeline ports

// Test doubles: errors are obvious from the return types and panics are the
// point of a failed expectation.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gqlink_domain::{
    GqlinkError, GraphqlResponse, Operation, RefreshRequest, RefreshResult, Result,
};
use parking_lot::Mutex;
use serde_json::json;

use crate::ports::{AuthStore, IdGenerator, Navigator, Session, TokenRefresher, Transport};

/// In-memory credential store whose expiry is decided by the test
#[derive(Debug, Default)]
pub struct MockAuthStore {
    access: Mutex<Option<String>>,
    refresh: Mutex<Option<String>>,
    expired: Mutex<HashSet<String>>,
    writes: AtomicUsize,
    deletes: AtomicUsize,
}

impl MockAuthStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding a valid access token and a refresh token
    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        let store = Self::new();
        *store.access.lock() = Some(access.to_string());
        *store.refresh.lock() = Some(refresh.to_string());
        store
    }

    /// Store holding an already expired access token and a refresh token
    pub fn with_expired_token(access: &str, refresh: &str) -> Self {
        let store = Self::with_tokens(access, refresh);
        store.expire(access);
        store
    }

    /// Mark `token` as expired
    pub fn expire(&self, token: &str) {
        self.expired.lock().insert(token.to_string());
    }

    /// Number of `set_auth_token` calls
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of `delete_jwt` calls
    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

impl AuthStore for MockAuthStore {
    fn get_auth_token(&self) -> Option<String> {
        self.access.lock().clone()
    }

    fn is_token_expired(&self, token: &str) -> bool {
        self.expired.lock().contains(token)
    }

    fn get_refresh_token(&self) -> Option<String> {
        self.refresh.lock().clone()
    }

    fn set_auth_token(&self, token: String) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.access.lock() = Some(token);
    }

    fn set_refresh_token(&self, token: String) {
        *self.refresh.lock() = Some(token);
    }

    fn delete_jwt(&self) {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        *self.access.lock() = None;
    }

    fn clear(&self) {
        *self.access.lock() = None;
        *self.refresh.lock() = None;
    }
}

/// Transport that records operations and replays scripted results
#[derive(Default)]
pub struct RecordingTransport {
    operations: Mutex<Vec<Operation>>,
    scripted: Mutex<VecDeque<Result<GraphqlResponse>>>,
}

impl RecordingTransport {
    /// Queue the result for the next operation; unscripted operations get
    /// `{"data": {"ok": true}}`
    pub fn push_result(&self, result: Result<GraphqlResponse>) {
        self.scripted.lock().push_back(result);
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.operations.lock().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn execute(&self, operation: Operation) -> Result<GraphqlResponse> {
        self.operations.lock().push(operation);
        self.scripted
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(GraphqlResponse::from_data(json!({ "ok": true }))))
    }
}

/// Refresher returning one fixed result after an optional delay
pub struct MockRefresher {
    result: Result<RefreshResult>,
    delay: Duration,
    calls: AtomicUsize,
    requests: Mutex<Vec<RefreshRequest>>,
}

impl MockRefresher {
    /// Refresh succeeds with `token`
    pub fn issuing(token: &str) -> Self {
        Self::with_result(Ok(RefreshResult { auth_token: Some(token.to_string()), errors: vec![] }))
    }

    /// Refresh reaches the server but the server reports errors
    pub fn rejecting(message: &str) -> Self {
        Self::with_result(Ok(RefreshResult {
            auth_token: None,
            errors: vec![gqlink_domain::GraphqlErrorEntry::new(message)],
        }))
    }

    /// Refresh never reaches the server
    pub fn failing(message: &str) -> Self {
        Self::with_result(Err(GqlinkError::Network(message.to_string())))
    }

    pub fn with_result(result: Result<RefreshResult>) -> Self {
        Self {
            result,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Hold every refresh open for `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RefreshRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl TokenRefresher for MockRefresher {
    async fn refresh(&self, request: RefreshRequest) -> Result<RefreshResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result.clone()
    }
}

/// Session that counts logouts and can clear a store
#[derive(Default)]
pub struct RecordingSession {
    logouts: AtomicUsize,
    store: Option<Arc<dyn AuthStore>>,
    fail: bool,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear `store` on logout, like a real session would
    pub fn clearing(store: Arc<dyn AuthStore>) -> Self {
        Self { store: Some(store), ..Self::default() }
    }

    /// Every logout fails
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn logout_count(&self) -> usize {
        self.logouts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Session for RecordingSession {
    async fn logout(&self) -> Result<()> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(GqlinkError::Internal("logout failed".to_string()));
        }
        if let Some(store) = &self.store {
            store.clear();
        }
        Ok(())
    }
}

/// Navigator that remembers every path
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    paths: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.paths.lock().push(path.to_string());
    }
}

/// Deterministic ids: `id-1`, `id-2`, ...
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicUsize,
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        format!("id-{}", self.next.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
