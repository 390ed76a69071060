//! Structured logging and Prometheus metrics setup.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{Config, LogFormat};
use crate::error::Result;

/// Counter of `GET /` requests, labelled by deployment.
pub const STATUS_REQUESTS_TOTAL: &str = "status_requests_total";

/// Installs the global tracing subscriber.
///
/// Fails if `log_level` is not a valid filter or a global subscriber is
/// already set.
pub fn init_tracing(config: &Config) -> Result<()> {
    let registry = tracing_subscriber::registry().with(config.env_filter()?);

    match config.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init()?,
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?,
    }
    Ok(())
}

/// Installs the Prometheus recorder with its own scrape listener.
///
/// Does nothing when `METRICS_PORT` is unset. Must be called from within a
/// tokio runtime. Returns the scrape address when the exporter was installed.
pub fn install_metrics(config: &Config) -> Result<Option<SocketAddr>> {
    let Some(addr) = config.metrics_addr() else {
        return Ok(None);
    };
    config.validate()?;

    PrometheusBuilder::new().with_http_listener(addr).install()?;
    metrics::describe_counter!(
        STATUS_REQUESTS_TOTAL,
        "Number of status requests served"
    );
    Ok(Some(addr))
}
