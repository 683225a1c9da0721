//! HTTP plumbing shared by the transport and the token refresher

mod client;

pub use client::{HttpClient, HttpClientBuilder};
