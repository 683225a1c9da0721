//! # gqlink Domain
//!
//! Domain types shared by every gqlink crate.
//!
//! This crate contains:
//! - The GraphQL operation and response envelope types
//! - Refresh mutation payloads
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Protocol constants
//!
//! ## Architecture
//! - No dependencies on other gqlink crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
