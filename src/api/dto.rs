//! Data Transfer Objects
//!
//! Request parameter and response body types for the API layer. Dataset
//! entities (activities, team groups) serialize with the same camelCase
//! field names the YAML files use.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::chart::SpiderwebAggregate;
use crate::model::{Activity, TeamGroups, TeamNames};

/// Query parameters for GET /api/v1/activities
#[derive(Debug, Deserialize)]
pub struct ActivityListParams {
    /// Only include activities up to this level
    pub max_level: Option<u32>,
}

/// Query parameters for GET /api/v1/activities/lookup
#[derive(Debug, Deserialize)]
pub struct LookupParams {
    pub uuid: Option<String>,
    pub name: Option<String>,
}

/// Query parameters carrying a team or group selection
#[derive(Debug, Deserialize)]
pub struct TeamSelectionParams {
    /// Comma-separated team or group names; empty means all teams
    pub teams: Option<String>,
}

/// Query parameters for GET /api/v1/chart/sectors
#[derive(Debug, Deserialize)]
pub struct SectorParams {
    pub teams: Option<String>,
    pub max_level: Option<u32>,
}

/// Split a comma-separated selection into names.
pub fn split_selection(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Response for GET /api/v1/activities
#[derive(Serialize)]
pub struct ActivityListResponse {
    pub count: usize,
    pub activities: Vec<Activity>,
}

/// Response for GET /api/v1/dimensions
#[derive(Serialize)]
pub struct DimensionsResponse {
    pub categories: Vec<String>,
    pub dimensions: Vec<String>,
    pub max_level: u32,
}

/// Response for GET /api/v1/teams
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamsResponse {
    pub teams: TeamNames,
    pub team_groups: TeamGroups,
}

/// One activity entry in a team summary
#[derive(Serialize)]
pub struct ActivitySummary {
    /// Empty for entries aggregated over the whole selection
    pub team: String,
    pub uuid: String,
    pub name: Option<String>,
    /// Date the latest progress state was reached
    pub last_updated: Option<NaiveDate>,
}

/// Response for GET /api/v1/teams/summary
#[derive(Serialize)]
pub struct TeamSummaryResponse {
    pub teams: Vec<String>,
    pub completed: Vec<ActivitySummary>,
    pub in_progress: Vec<ActivitySummary>,
}

/// Response for GET /api/v1/chart/spiderweb
#[derive(Serialize)]
pub struct SpiderwebResponse {
    pub teams: Vec<String>,
    pub aggregate: SpiderwebAggregate,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Response for POST /api/v1/reload
#[derive(Serialize)]
pub struct ReloadResponse {
    pub status: String,
    pub activities: usize,
    pub dataset_version: Option<String>,
}

/// Response for GET /health
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub dataset: String,
    pub uptime_seconds: u64,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_selection() {
        assert_eq!(split_selection(None), Vec::<String>::new());
        assert_eq!(split_selection(Some("")), Vec::<String>::new());
        assert_eq!(
            split_selection(Some("Alpha, Bravo ,,Charlie")),
            vec!["Alpha", "Bravo", "Charlie"]
        );
    }
}
