//! Team Routes
//!
//! Team and team-group display lists and per-team progress summaries.
//!
//! - GET /api/v1/teams - Teams and team groups
//! - GET /api/v1/teams/summary - Completed and in-progress activities

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{
    split_selection, ActivitySummary, TeamSelectionParams, TeamsResponse, TeamSummaryResponse,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::model::{DataStore, TeamActivityProgress};

/// GET /api/v1/teams
pub async fn list_teams(State(state): State<Arc<AppState>>) -> ApiResult<Json<TeamsResponse>> {
    let store = state.dataset().await?;

    Ok(Json(TeamsResponse {
        teams: store.meta.teams.clone(),
        team_groups: store.meta.team_groups.clone(),
    }))
}

/// GET /api/v1/teams/summary?teams=a,b
///
/// Activities completed by every selected team and activities still in
/// progress for any of them, with the date the latest state was reached.
pub async fn team_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TeamSelectionParams>,
) -> ApiResult<Json<TeamSummaryResponse>> {
    let store = state.dataset().await?;
    let teams = resolve_selection(&store, params.teams.as_deref())?;

    let completed = store
        .progress
        .activities_completed(&teams)
        .into_iter()
        .map(|entry| summarize(&store, entry))
        .collect();
    let in_progress = store
        .progress
        .activities_in_progress(&teams)
        .into_iter()
        .map(|entry| summarize(&store, entry))
        .collect();

    Ok(Json(TeamSummaryResponse {
        teams,
        completed,
        in_progress,
    }))
}

/// Resolve a raw `teams=` parameter against the dataset. A non-empty
/// selection that matches nothing is a request error.
pub fn resolve_selection(store: &DataStore, raw: Option<&str>) -> ApiResult<Vec<String>> {
    let selection = split_selection(raw);
    let teams = store.resolve_teams(&selection);
    if teams.is_empty() && !selection.is_empty() {
        return Err(ApiError::Validation(format!(
            "no known teams in selection '{}'",
            selection.join(",")
        )));
    }
    Ok(teams)
}

fn summarize(store: &DataStore, entry: TeamActivityProgress) -> ActivitySummary {
    let name = store
        .activities
        .activity_by_uuid(&entry.activity_uuid)
        .map(|a| a.name.clone());
    let last_updated = entry.progress.values().max().copied();

    ActivitySummary {
        team: entry.team,
        uuid: entry.activity_uuid,
        name,
        last_updated,
    }
}
