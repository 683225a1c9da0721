//! The built-in pipeline stages
//!
//! Standard order: [`RefreshLink`] → [`AuthHeaderLink`] → [`ErrorLink`] →
//! transport. The token is refreshed before it is attached, and errors are
//! observed closest to the wire.

pub mod auth_header;
pub mod error;
pub mod refresh;

pub use auth_header::AuthHeaderLink;
pub use error::ErrorLink;
pub use refresh::{RefreshLink, RefreshOutcome};
