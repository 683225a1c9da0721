//! Terminal transports

mod batch_http;

pub use batch_http::BatchHttpTransport;
