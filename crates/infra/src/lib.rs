//! # gqlink Infrastructure
//!
//! Infrastructure implementations of the core pipeline ports.
//!
//! This crate contains:
//! - The batching HTTP transport and the refresh mutation client
//! - In-memory credential storage and session/navigation adapters
//! - Configuration loading and tracing setup
//! - [`GraphqlClient`], which wires everything together
//!
//! ## Architecture
//! - Implements traits defined in `gqlink-core`
//! - Depends on `gqlink-domain` and `gqlink-core`
//! - Contains all "impure" code (HTTP, environment, files)

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod http;
pub mod ids;
pub mod observability;
pub mod transport;

// Re-export commonly used items
pub use auth::{FnNavigator, GraphqlTokenRefresher, LoggingNavigator, MemoryAuthStore, StoreSession};
pub use client::{GraphqlClient, GraphqlClientBuilder};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use ids::UuidGenerator;
pub use observability::{init_tracing, LogFormat};
pub use transport::BatchHttpTransport;
