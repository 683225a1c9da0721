//! Test doubles for the pipeline ports
//!
//! Available to this crate's tests and, through the `test-utils` feature,
//! to other crates' tests.

pub mod mocks;

pub use mocks::{
    MockAuthStore, MockRefresher, RecordingNavigator, RecordingSession, RecordingTransport,
    SequentialIds,
};
