//! Startup error types.
//!
//! Request handling has no failure modes of its own. Everything here happens
//! before the server accepts its first connection.

use std::net::SocketAddr;

use common::ParseDeploymentError;
use metrics_exporter_prometheus::BuildError;
use thiserror::Error;
use tracing_subscriber::util::TryInitError;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `DEPLOYMENT` names no known variant.
    #[error(transparent)]
    UnknownDeployment(#[from] ParseDeploymentError),

    /// `HOST` is not an IP address.
    #[error("Invalid HOST '{0}': expected an IP address")]
    InvalidHost(String),

    /// `METRICS_PORT` is not a port number.
    #[error("Invalid METRICS_PORT '{0}': expected a port number")]
    InvalidMetricsPort(String),

    /// `LOG_FORMAT` is neither `text` nor `json`.
    #[error("Invalid LOG_FORMAT '{0}': expected 'text' or 'json'")]
    InvalidLogFormat(String),

    /// `RUST_LOG` is not a valid tracing filter directive.
    #[error("Invalid RUST_LOG '{value}': {reason}")]
    InvalidLogLevel { value: String, reason: String },

    /// The metrics exporter would listen on the API port.
    #[error("METRICS_PORT {0} is already used by the API listener")]
    MetricsPortConflict(u16),
}

/// Errors that stop the server from starting or running.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration is inconsistent or cannot be applied.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A global tracing subscriber is already installed.
    #[error("Failed to install tracing subscriber: {0}")]
    Tracing(#[from] TryInitError),

    /// The listen address could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The accept loop failed.
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),

    /// The Prometheus exporter could not be installed.
    #[error("Failed to install Prometheus exporter: {0}")]
    Metrics(#[from] BuildError),
}

/// Convenience type alias for server results.
pub type Result<T> = std::result::Result<T, ServerError>;
