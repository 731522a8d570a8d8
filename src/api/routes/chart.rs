//! Chart Routes
//!
//! Chart payloads for the spiderweb and circular-heatmap renderers.
//!
//! - GET /api/v1/chart/spiderweb - Nested aggregate plus flattened series
//! - GET /api/v1/chart/sectors - Sector grid

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{SectorParams, SpiderwebResponse, TeamSelectionParams};
use crate::api::error::ApiResult;
use crate::api::routes::teams::resolve_selection;
use crate::api::state::AppState;
use crate::chart::{build_aggregate, build_sectors, flatten, Sector};

/// GET /api/v1/chart/spiderweb?teams=a,b
pub async fn spiderweb(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TeamSelectionParams>,
) -> ApiResult<Json<SpiderwebResponse>> {
    let store = state.dataset().await?;
    let teams = resolve_selection(&store, params.teams.as_deref())?;

    let aggregate = build_aggregate(&store, &teams);
    let series = flatten(&aggregate)?;

    Ok(Json(SpiderwebResponse {
        teams,
        aggregate,
        labels: series.labels,
        values: series.values,
    }))
}

/// GET /api/v1/chart/sectors?teams=a,b&max_level=
pub async fn sectors(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SectorParams>,
) -> ApiResult<Json<Vec<Sector>>> {
    let store = state.dataset().await?;
    let teams = resolve_selection(&store, params.teams.as_deref())?;

    Ok(Json(build_sectors(&store, &teams, params.max_level)))
}
