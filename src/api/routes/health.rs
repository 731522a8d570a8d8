//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (dataset is loaded)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;
use crate::loader::LoadState;

/// GET /health/live
///
/// Kubernetes liveness probe.
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Kubernetes readiness probe.
/// Ready once the dataset has been loaded.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    match state.loader.state().await {
        LoadState::Loaded => StatusCode::OK,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// GET /health
///
/// Full health status with dataset details.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (status, dataset) = match state.loader.state().await {
        LoadState::Loaded => ("healthy", "loaded".to_string()),
        LoadState::Loading => ("degraded", "loading".to_string()),
        LoadState::Unloaded => ("degraded", "not loaded".to_string()),
        LoadState::Failed(e) => ("unhealthy", format!("load failed: {}", e)),
    };

    Json(HealthResponse {
        status: status.to_string(),
        dataset,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
