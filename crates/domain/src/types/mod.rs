//! Domain types and models

pub mod operation;
pub mod refresh;
pub mod response;

pub use operation::{FetchPolicy, Operation, OperationContext, OperationKind};
pub use refresh::{RefreshInput, RefreshRequest, RefreshResult, RefreshVariables};
pub use response::{ErrorLocation, GraphqlErrorEntry, GraphqlResponse, PathSegment};
