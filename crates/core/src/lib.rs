//! # gqlink Core
//!
//! Pure request-pipeline logic - no HTTP, storage, or platform code.
//!
//! This crate contains:
//! - Port interfaces (traits) for the collaborators the pipeline consumes
//! - The `Link` contract and the `Pipeline` that chains links to a transport
//! - The refresh, auth-header, and error-observer links
//! - The in-memory normalized cache
//!
//! ## Architecture Principles
//! - Only depends on `gqlink-domain`
//! - All external effects go through traits in [`ports`]
//! - Pure, testable logic

pub mod cache;
pub mod links;
pub mod pipeline;
pub mod ports;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export specific items to avoid ambiguity
pub use cache::{InMemoryCache, PossibleTypes};
pub use links::{AuthHeaderLink, ErrorLink, RefreshLink, RefreshOutcome};
pub use pipeline::{Link, Next, Pipeline, PipelineBuilder};
pub use ports::{AuthStore, IdGenerator, Navigator, Session, TokenRefresher, Transport};
