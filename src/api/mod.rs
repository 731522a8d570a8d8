//! DSOMM REST API
//!
//! HTTP API layer over the loaded maturity-model dataset, built with Axum.
//!
//! # Endpoints
//!
//! ## Activities
//! - `GET /api/v1/activities` - List activities (optional `max_level`)
//! - `GET /api/v1/activities/lookup` - Resolve one activity by uuid or name
//! - `GET /api/v1/dimensions` - Category and dimension display lists
//!
//! ## Teams
//! - `GET /api/v1/teams` - Teams and team groups
//! - `GET /api/v1/teams/summary` - Completed / in-progress activities
//!
//! ## Charts
//! - `GET /api/v1/chart/spiderweb` - Spiderweb aggregate and series
//! - `GET /api/v1/chart/sectors` - Circular-heatmap sector grid
//!
//! ## Export
//! - `GET /api/v1/export/teams` - Teams YAML download
//! - `GET /api/v1/export/progress` - Progress YAML download
//!
//! ## Admin
//! - `POST /api/v1/reload` - Discard and reload the dataset
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe (dataset loaded)
//! - `GET /health` - Full health status

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Activity routes
        .route("/activities", get(routes::activities::list_activities))
        .route("/activities/lookup", get(routes::activities::lookup_activity))
        .route("/dimensions", get(routes::activities::list_dimensions))
        // Team routes
        .route("/teams", get(routes::teams::list_teams))
        .route("/teams/summary", get(routes::teams::team_summary))
        // Chart routes
        .route("/chart/spiderweb", get(routes::chart::spiderweb))
        .route("/chart/sectors", get(routes::chart::sectors))
        // Export routes
        .route("/export/teams", get(routes::export::export_teams))
        .route("/export/progress", get(routes::export::export_progress))
        // Admin routes
        .route("/reload", post(routes::reload::reload));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()) // Configure properly in production
        .with_state(shared_state)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("DSOMM API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("DSOMM API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
