//! API server entry point.

use std::process::ExitCode;

use api::config::{Config, PortSource};
use common::Deployment;
use tokio::signal;

/// Resolves on SIGINT or SIGTERM.
///
/// A signal whose handler cannot be installed is logged and never fires, so
/// the other one still triggers shutdown.
async fn shutdown_signal(deployment: Deployment) {
    let interrupt = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, signal = "SIGINT", "cannot listen for signal");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, signal = "SIGTERM", "cannot listen for signal");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let received = tokio::select! {
        () = interrupt => "SIGINT",
        () = terminate => "SIGTERM",
    };
    tracing::info!(signal = received, %deployment, "starting graceful shutdown");
}

async fn run(config: Config) -> api::error::Result<()> {
    if let Some(addr) = api::telemetry::install_metrics(&config)? {
        tracing::info!(%addr, "prometheus exporter listening");
    }

    match &config.port_source {
        PortSource::Ignored(raw) => tracing::info!(
            port = %raw,
            deployment = %config.deployment,
            "PORT is not read by this deployment, using default port"
        ),
        PortSource::Invalid(raw) => tracing::warn!(
            port = %raw,
            default = config.port,
            "PORT is not a valid port number, using default port"
        ),
        PortSource::Env | PortSource::Default => {}
    }

    let state = api::create_default_state(config.deployment);
    let app = api::create_app(state);

    let listener = api::bind(&config).await?;
    tracing::info!(
        addr = %config.addr(),
        deployment = %config.deployment,
        "starting API server"
    );

    api::serve(listener, app, shutdown_signal(config.deployment)).await?;

    tracing::info!(deployment = %config.deployment, "server shut down gracefully");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Tracing is configured from the environment too, so errors up to and
    // including subscriber setup can only go to stderr.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = api::telemetry::init_tracing(&config) {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }

    if let Err(err) = run(config).await {
        tracing::error!(error = %err, "server failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
