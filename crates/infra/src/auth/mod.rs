//! Default credential and session collaborators
//!
//! Provides in-memory credential storage with JWT expiry checks, the
//! refresh mutation client, and simple session/navigation adapters for
//! hosts that do not bring their own.

mod refresher;
mod session;
mod store;

pub use refresher::GraphqlTokenRefresher;
pub use session::{FnNavigator, LoggingNavigator, StoreSession};
pub use store::{token_expiry, MemoryAuthStore};
