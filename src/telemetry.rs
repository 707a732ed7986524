//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins over the configured filter when set. Production emits
//! JSON lines; every other environment gets the human-readable format.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ServerConfig;

/// Filter from `RUST_LOG`, falling back to the configured directive.
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init(server: &ServerConfig) {
    let registry = tracing_subscriber::registry().with(env_filter(&server.log_level));

    if server.is_production() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}
