//! Tracing subscriber setup
//!
//! Library code only emits `tracing` events; hosts that have no subscriber
//! of their own can install this one.

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Output format for [`init_tracing`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Install a global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Returns `false` when
/// a global subscriber was already installed (the call is then a no-op).
pub fn init_tracing(default_filter: &str, format: LogFormat) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true).with_current_span(true))
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    installed.is_ok()
}
