//! Session and navigation adapters

use std::sync::Arc;

use async_trait::async_trait;
use gqlink_core::{AuthStore, Navigator, Session};
use gqlink_domain::Result;
use tracing::info;

/// [`Session`] whose logout forgets every stored credential
pub struct StoreSession {
    store: Arc<dyn AuthStore>,
}

impl StoreSession {
    /// Session backed by `store`; logout clears both tokens.
    pub fn new(store: Arc<dyn AuthStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Session for StoreSession {
    async fn logout(&self) -> Result<()> {
        self.store.clear();
        info!("Session credentials cleared");
        Ok(())
    }
}

/// [`Navigator`] for headless hosts: records the redirect in the log
#[derive(Debug, Default)]
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn navigate(&self, path: &str) {
        info!(path, "Navigation requested");
    }
}

/// [`Navigator`] that forwards to a closure (router hook, channel, ...)
pub struct FnNavigator<F>(F);

impl<F> FnNavigator<F>
where
    F: Fn(&str) + Send + Sync,
{
    /// Wrap `navigate`, called with the target path on every redirect
    pub fn new(navigate: F) -> Self {
        Self(navigate)
    }
}

impl<F> Navigator for FnNavigator<F>
where
    F: Fn(&str) + Send + Sync,
{
    fn navigate(&self, path: &str) {
        (self.0)(path);
    }
}
