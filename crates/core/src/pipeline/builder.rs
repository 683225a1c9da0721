//! Explicit pipeline composition

use std::sync::Arc;

use gqlink_domain::{GqlinkError, GraphqlResponse, Operation, Result};
use tracing::{debug, instrument};

use super::link::{Link, Next};
use crate::ports::Transport;

/// Links in order, terminated by a transport
pub struct Pipeline {
    links: Vec<Arc<dyn Link>>,
    transport: Arc<dyn Transport>,
}

impl Pipeline {
    /// Create a builder for fluent composition
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Run one operation through every link and the transport
    ///
    /// # Errors
    ///
    /// Returns whatever error a link or the transport resolved with
    #[instrument(skip(self, operation), fields(operation = operation.operation_name.as_deref().unwrap_or("anonymous")))]
    pub async fn execute(&self, operation: Operation) -> Result<GraphqlResponse> {
        debug!(links = self.links.len(), "Executing operation");
        Next::new(&self.links, self.transport.as_ref()).run(operation).await
    }

    /// Link names in execution order
    pub fn link_names(&self) -> Vec<&'static str> {
        self.links.iter().map(|link| link.name()).collect()
    }
}

/// Builder for [`Pipeline`]
#[derive(Default)]
pub struct PipelineBuilder {
    links: Vec<Arc<dyn Link>>,
    transport: Option<Arc<dyn Transport>>,
}

impl PipelineBuilder {
    /// Append a link; links run in the order they are added
    pub fn link(self, link: impl Link + 'static) -> Self {
        self.shared_link(Arc::new(link))
    }

    /// Append an already shared link
    pub fn shared_link(mut self, link: Arc<dyn Link>) -> Self {
        self.links.push(link);
        self
    }

    /// Set the terminal transport
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the pipeline
    ///
    /// # Errors
    ///
    /// Returns `GqlinkError::Config` if no transport was set
    pub fn build(self) -> Result<Pipeline> {
        let transport =
            self.transport.ok_or_else(|| GqlinkError::Config("Transport not set".to_string()))?;

        Ok(Pipeline { links: self.links, transport })
    }
}
