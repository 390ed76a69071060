//! HTTP server acknowledging that a deployment is reachable.
//!
//! Serves a single `GET /` route returning a fixed JSON message chosen by
//! the deployment variant, with structured logging (tracing) and optional
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod telemetry;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use common::Deployment;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use error::{Result, ServerError};
use routes::status::AppState;

/// Creates the Axum application router.
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::status::get))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state for a deployment.
pub fn create_default_state(deployment: Deployment) -> Arc<AppState> {
    Arc::new(AppState::new(deployment))
}

/// Validates `config` and binds its listen address.
pub async fn bind(config: &Config) -> Result<TcpListener> {
    config.validate()?;
    let addr = config.addr();
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Serves `app` until `shutdown` resolves, then drains open connections.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)
}
