//! Error plumbing between infrastructure libraries and the domain error

mod conversions;

pub use conversions::InfraError;
