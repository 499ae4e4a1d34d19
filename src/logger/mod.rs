//! Logger module
//!
//! Provides logging utilities for the server including:
//! - `tracing` subscriber setup (text or JSON, `RUST_LOG` aware)
//! - Server lifecycle logging
//! - Access logging with multiple formats on the `access` target

mod format;

pub use format::AccessLogEntry;

use std::net::SocketAddr;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, LoggingConfig};

/// Target that access log lines are emitted on
pub const ACCESS_TARGET: &str = "access";

/// Initialize the global subscriber with configuration
///
/// Should be called once at application startup. `RUST_LOG` takes precedence
/// over the configured level.
pub fn init(config: &LoggingConfig) -> Result<(), TryInitError> {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    if !config.access_log {
        if let Ok(directive) = format!("{ACCESS_TARGET}=off").parse() {
            filter = filter.add_directive(directive);
        }
    }

    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, routes: &[&str]) {
    tracing::info!(
        %addr,
        level = %config.logging.level,
        workers = ?config.server.workers,
        max_connections = ?config.performance.max_connections,
        "server started, listening on http://{addr}"
    );
    for pattern in routes {
        tracing::info!(pattern, "route");
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!(peer = %peer_addr, "connection accepted");
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    tracing::warn!(error = %err, "failed to serve connection");
}

pub fn log_connection_rejected(peer_addr: &SocketAddr, limit: u64) {
    tracing::warn!(peer = %peer_addr, limit, "connection limit reached, rejecting");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: ACCESS_TARGET, "{}", entry.format(format));
}

pub fn log_shutdown(reason: &str) {
    tracing::info!(reason, "shutting down");
}
