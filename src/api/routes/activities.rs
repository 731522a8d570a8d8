//! Activity Routes
//!
//! Read access to the activity catalog.
//!
//! - GET /api/v1/activities - List activities, optionally capped by level
//! - GET /api/v1/activities/lookup - Resolve one activity by uuid or name
//! - GET /api/v1/dimensions - Category and dimension display lists

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{
    ActivityListParams, ActivityListResponse, DimensionsResponse, LookupParams,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::model::Activity;

/// GET /api/v1/activities
///
/// All activities in dataset order. `max_level` keeps only activities at or
/// below the given level.
pub async fn list_activities(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ActivityListParams>,
) -> ApiResult<Json<ActivityListResponse>> {
    let store = state.dataset().await?;

    let activities: Vec<Activity> = match params.max_level {
        Some(max_level) => store
            .activities
            .activities_up_to_level(max_level)
            .into_iter()
            .cloned()
            .collect(),
        None => store.activities.all_activities().to_vec(),
    };

    Ok(Json(ActivityListResponse {
        count: activities.len(),
        activities,
    }))
}

/// GET /api/v1/activities/lookup?uuid=&name=
///
/// Resolve one activity. The uuid wins when both parameters are given; the
/// name is the fallback. An unresolvable lookup is a 404.
pub async fn lookup_activity(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LookupParams>,
) -> ApiResult<Json<Activity>> {
    let uuid = params.uuid.unwrap_or_default();
    let name = params.name.unwrap_or_default();
    if uuid.is_empty() && name.is_empty() {
        return Err(ApiError::Validation(
            "either 'uuid' or 'name' must be given".to_string(),
        ));
    }

    let store = state.dataset().await?;
    let activity = store.activities.activity(&uuid, &name)?;
    Ok(Json(activity.clone()))
}

/// GET /api/v1/dimensions
///
/// The category and dimension names of the dataset, in display order.
pub async fn list_dimensions(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DimensionsResponse>> {
    let store = state.dataset().await?;

    Ok(Json(DimensionsResponse {
        categories: store.activities.category_names().to_vec(),
        dimensions: store
            .activities
            .dimension_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        max_level: store.max_level(),
    }))
}
