//! Reload Route
//!
//! - POST /api/v1/reload - Discard the cached dataset and load it again

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::ReloadResponse;
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// POST /api/v1/reload
///
/// Forces a fresh fetch of the whole dataset. Callers racing the reload
/// coalesce onto the new load.
pub async fn reload(State(state): State<Arc<AppState>>) -> ApiResult<Json<ReloadResponse>> {
    let store = state.loader.force_reload().await?;

    Ok(Json(ReloadResponse {
        status: "reloaded".to_string(),
        activities: store.activities.len(),
        dataset_version: store.meta.dataset_version.clone(),
    }))
}
