//! Sector Grid
//!
//! The circular-heatmap layout: one sector per (level, subdimension) cell
//! for levels `1..=max_level`, carrying the cell's activity names and the
//! mean progress of the visible teams. Sectors without activities are
//! disabled so the renderer can grey them out.

use serde::Serialize;

use crate::model::DataStore;

/// One cell of the heatmap grid
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sector {
    pub level: u32,
    pub dimension: String,
    pub activities: Vec<String>,
    /// Mean progress score across the sector's activities and teams, in [0, 1]
    pub progress: f64,
    pub disabled: bool,
}

/// Build the sector grid for a team selection. `max_level` caps the rings;
/// anything above the dataset's own maximum is clamped.
pub fn build_sectors(store: &DataStore, teams: &[String], max_level: Option<u32>) -> Vec<Sector> {
    let top = max_level
        .unwrap_or_else(|| store.max_level())
        .min(store.max_level());

    let dimensions: Vec<String> = store
        .activities
        .dimension_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut sectors = Vec::new();
    for level in 1..=top {
        for dimension in &dimensions {
            let activities = store.activities.activities_in(dimension, level);

            let cells = activities.len() * teams.len();
            let progress = if cells == 0 {
                0.0
            } else {
                let total: f64 = activities
                    .iter()
                    .flat_map(|activity| {
                        teams
                            .iter()
                            .map(|team| store.progress.team_progress_value(&activity.uuid, team))
                    })
                    .sum();
                total / cells as f64
            };

            sectors.push(Sector {
                level,
                dimension: dimension.clone(),
                activities: activities.iter().map(|a| a.name.clone()).collect(),
                progress,
                disabled: activities.is_empty(),
            });
        }
    }
    sectors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActivityStore, MetaStore, ProgressStore};
    use serde_yaml::Value;

    fn data_store() -> DataStore {
        let meta_value: Value = serde_yaml::from_str(
            r#"
            teams: [Alpha, Bravo]
            teamGroups: {}
            activityFiles: [a.yaml]
            teamProgressFile: progress.yaml
            progressDefinition:
              Planned: { score: 0 }
              Half: { score: "50%" }
              Implemented: { score: 1 }
            "#,
        )
        .unwrap();
        let meta = MetaStore::from_value(&meta_value).unwrap();

        let doc: Value = serde_yaml::from_str(
            r#"
            Build and Deployment:
              Build:
                Defined build process:
                  uuid: uuid-build-1
                  level: 1
              Deployment:
                Defined deployment process:
                  uuid: uuid-deploy-1
                  level: 2
            "#,
        )
        .unwrap();
        let mut activities = ActivityStore::new();
        let mut errors = Vec::new();
        activities.add_activity_file(&doc, &mut errors);
        assert!(errors.is_empty());

        let mut progress = ProgressStore::new(meta.progress_definition.clone());
        progress.add_progress_data(
            serde_yaml::from_str(
                r#"
                uuid-build-1:
                  Alpha:
                    Implemented: 2024-01-01
                  Bravo:
                    Half: 2024-01-01
                "#,
            )
            .unwrap(),
        );

        DataStore::new(meta, activities, progress)
    }

    #[test]
    fn test_grid_covers_every_level_and_dimension() {
        let store = data_store();
        let teams = vec!["Alpha".to_string(), "Bravo".to_string()];

        let sectors = build_sectors(&store, &teams, None);
        // 2 levels x 2 dimensions
        assert_eq!(sectors.len(), 4);

        let build_1 = sectors
            .iter()
            .find(|s| s.level == 1 && s.dimension == "Build")
            .unwrap();
        assert_eq!(build_1.activities, vec!["Defined build process"]);
        // Alpha at 1.0, Bravo at 0.5
        assert!((build_1.progress - 0.75).abs() < 1e-9);
        assert!(!build_1.disabled);

        // Deployment has no level-1 activity
        let deploy_1 = sectors
            .iter()
            .find(|s| s.level == 1 && s.dimension == "Deployment")
            .unwrap();
        assert!(deploy_1.disabled);
        assert!(deploy_1.activities.is_empty());
        assert_eq!(deploy_1.progress, 0.0);
    }

    #[test]
    fn test_max_level_caps_the_rings() {
        let store = data_store();
        let teams = vec!["Alpha".to_string()];

        let sectors = build_sectors(&store, &teams, Some(1));
        assert!(sectors.iter().all(|s| s.level == 1));

        // A cap beyond the dataset maximum clamps instead of inventing rings
        let sectors = build_sectors(&store, &teams, Some(99));
        assert_eq!(sectors.iter().map(|s| s.level).max(), Some(2));
    }
}
