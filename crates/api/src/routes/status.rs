//! Deployment status endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::{Deployment, StatusMessage};

use crate::telemetry::STATUS_REQUESTS_TOTAL;

/// Shared, read-only application state.
#[derive(Debug)]
pub struct AppState {
    pub deployment: Deployment,
    pub payload: StatusMessage,
}

impl AppState {
    pub fn new(deployment: Deployment) -> Self {
        Self {
            deployment,
            payload: StatusMessage::for_deployment(deployment),
        }
    }
}

/// GET /, acknowledges that the deployment is reachable.
#[tracing::instrument(skip(state), fields(deployment = %state.deployment))]
pub async fn get(State(state): State<Arc<AppState>>) -> Json<StatusMessage> {
    metrics::counter!(STATUS_REQUESTS_TOTAL, "deployment" => state.deployment.as_str())
        .increment(1);
    Json(state.payload.clone())
}
