//! The uniform stage contract

use std::sync::Arc;

use async_trait::async_trait;
use gqlink_domain::{GraphqlResponse, Operation, Result};

use crate::ports::Transport;

/// One stage of the request pipeline.
///
/// A link may mutate the operation before forwarding, suspend before
/// forwarding, inspect the result after forwarding, or answer without
/// forwarding at all.
#[async_trait]
pub trait Link: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    /// Handle `operation`, usually by calling `next.run(operation)`.
    async fn call(&self, operation: Operation, next: Next<'_>) -> Result<GraphqlResponse>;
}

/// Continuation over the remaining links and the terminal transport
#[derive(Clone, Copy)]
pub struct Next<'a> {
    links: &'a [Arc<dyn Link>],
    transport: &'a dyn Transport,
}

impl<'a> Next<'a> {
    pub(crate) fn new(links: &'a [Arc<dyn Link>], transport: &'a dyn Transport) -> Self {
        Self { links, transport }
    }

    /// Hand the operation to the next stage
    pub async fn run(self, operation: Operation) -> Result<GraphqlResponse> {
        match self.links.split_first() {
            Some((link, rest)) => {
                link.call(operation, Next { links: rest, transport: self.transport }).await
            }
            None => self.transport.execute(operation).await,
        }
    }
}
