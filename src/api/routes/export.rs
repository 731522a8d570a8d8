//! Export Routes
//!
//! YAML download endpoints, mirroring the files the dataset was loaded
//! from so edits can be written back to the asset repository.
//!
//! - GET /api/v1/export/teams - Teams and team groups as YAML
//! - GET /api/v1/export/progress - Team progress as annotated YAML

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// GET /api/v1/export/teams
pub async fn export_teams(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let store = state.dataset().await?;
    let yaml = store.meta.teams_yaml().map_err(crate::api::ApiError::from)?;
    Ok(yaml_attachment("teams.yaml", yaml))
}

/// GET /api/v1/export/progress
///
/// The progress export keeps YAML key order and annotates each activity
/// uuid with its name, so the file stays reviewable in the asset repo.
pub async fn export_progress(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let store = state.dataset().await?;
    Ok(yaml_attachment("progress.yaml", store.progress.as_yaml_string()))
}

fn yaml_attachment(filename: &str, body: String) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/yaml".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        Body::from(body),
    )
        .into_response()
}
