//! Spiderweb Chart Transform
//!
//! Builds the nested `level -> dimension -> subdimension` aggregate from a
//! loaded dataset and flattens it into the parallel label/value series the
//! spiderweb renderer consumes. Values are completion percentages: the share
//! of a subdimension's activities that every selected team has completed.

use indexmap::IndexMap;
use serde::Serialize;

use super::{ChartError, ChartResult};
use crate::model::DataStore;

/// Completion counts for one subdimension at one level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubdimensionCount {
    pub selected: usize,
    pub count: usize,
}

/// Level label -> dimension -> subdimension -> counts, in dataset order
pub type SpiderwebAggregate =
    IndexMap<String, IndexMap<String, IndexMap<String, SubdimensionCount>>>;

/// Flattened series: one label and one value per aggregate leaf
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Percentage value for one leaf. A leaf with nothing selected is flat zero
/// regardless of its count, so empty subdimensions never divide by zero.
fn percentage(subdimension: &str, counts: SubdimensionCount) -> ChartResult<f64> {
    if counts.selected == 0 {
        return Ok(0.0);
    }
    if counts.count == 0 {
        return Err(ChartError::MalformedAggregate {
            subdimension: subdimension.to_string(),
            selected: counts.selected,
            count: counts.count,
        });
    }
    Ok(100.0 * counts.selected as f64 / counts.count as f64)
}

/// Flatten the aggregate into parallel labels and values, walking leaves in
/// insertion order. One value per (level, dimension, subdimension) leaf.
pub fn flatten(aggregate: &SpiderwebAggregate) -> ChartResult<ChartSeries> {
    let mut labels = Vec::new();
    let mut values = Vec::new();

    for dimensions in aggregate.values() {
        for subdimensions in dimensions.values() {
            for (subdimension, counts) in subdimensions {
                labels.push(subdimension.clone());
                values.push(percentage(subdimension, *counts)?);
            }
        }
    }

    Ok(ChartSeries { labels, values })
}

/// Build the nested aggregate for a team selection: per level and
/// subdimension, how many activities exist and how many every selected team
/// has completed.
pub fn build_aggregate(store: &DataStore, teams: &[String]) -> SpiderwebAggregate {
    let completed_title = store.progress.completed_title();
    let mut aggregate = SpiderwebAggregate::new();

    for level in 1..=store.max_level() {
        let mut dimensions: IndexMap<String, IndexMap<String, SubdimensionCount>> =
            IndexMap::new();

        for activity in store.activities.all_activities() {
            if activity.level != level {
                continue;
            }
            let entry = dimensions
                .entry(activity.category.clone())
                .or_default()
                .entry(activity.dimension.clone())
                .or_insert(SubdimensionCount {
                    selected: 0,
                    count: 0,
                });
            entry.count += 1;

            let completed = match completed_title {
                Some(title) => {
                    !teams.is_empty()
                        && teams.iter().all(|team| {
                            store.progress.team_progress_title(&activity.uuid, team)
                                == Some(title)
                        })
                }
                None => false,
            };
            if completed {
                entry.selected += 1;
            }
        }

        aggregate.insert(format!("Level {}", level), dimensions);
    }

    aggregate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActivityStore, MetaStore, ProgressStore};
    use serde_yaml::Value;

    fn leaf(selected: usize, count: usize) -> SubdimensionCount {
        SubdimensionCount { selected, count }
    }

    fn aggregate_of(leaves: Vec<(&str, SubdimensionCount)>) -> SpiderwebAggregate {
        let mut subdimensions = IndexMap::new();
        for (name, counts) in leaves {
            subdimensions.insert(name.to_string(), counts);
        }
        let mut dimensions = IndexMap::new();
        dimensions.insert("Dimension".to_string(), subdimensions);
        let mut aggregate = SpiderwebAggregate::new();
        aggregate.insert("Level 1".to_string(), dimensions);
        aggregate
    }

    #[test]
    fn test_flatten_percentages() {
        let aggregate = aggregate_of(vec![
            ("Nothing selected", leaf(0, 5)),
            ("Half done", leaf(2, 4)),
            ("All done", leaf(3, 3)),
        ]);

        let series = flatten(&aggregate).unwrap();
        assert_eq!(series.labels, vec!["Nothing selected", "Half done", "All done"]);
        assert_eq!(series.values, vec![0.0, 50.0, 100.0]);
    }

    #[test]
    fn test_flatten_empty_subdimension_is_zero() {
        let aggregate = aggregate_of(vec![("Empty", leaf(0, 0))]);
        let series = flatten(&aggregate).unwrap();
        assert_eq!(series.values, vec![0.0]);
    }

    #[test]
    fn test_flatten_rejects_selected_without_count() {
        let aggregate = aggregate_of(vec![("Broken", leaf(1, 0))]);
        assert!(matches!(
            flatten(&aggregate),
            Err(ChartError::MalformedAggregate { .. })
        ));
    }

    fn data_store() -> DataStore {
        let meta_value: Value = serde_yaml::from_str(
            r#"
            teams: [Alpha, Bravo]
            teamGroups: {}
            activityFiles: [a.yaml]
            teamProgressFile: progress.yaml
            progressDefinition:
              Planned: { score: 0 }
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
                Signed artifacts:
                  uuid: uuid-build-2
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
                    Implemented: 2024-02-01
                uuid-build-2:
                  Alpha:
                    Implemented: 2024-01-01
                "#,
            )
            .unwrap(),
        );

        DataStore::new(meta, activities, progress)
    }

    #[test]
    fn test_build_aggregate_counts_per_level() {
        let store = data_store();
        let teams = vec!["Alpha".to_string(), "Bravo".to_string()];

        let aggregate = build_aggregate(&store, &teams);
        assert_eq!(aggregate.len(), 2);

        // Level 1: both Build activities exist, only one is completed by
        // both teams
        let build = &aggregate["Level 1"]["Build and Deployment"]["Build"];
        assert_eq!(*build, leaf(1, 2));

        // Level 2: Deployment has one activity, nothing completed
        let deploy = &aggregate["Level 2"]["Build and Deployment"]["Deployment"];
        assert_eq!(*deploy, leaf(0, 1));

        let series = flatten(&aggregate).unwrap();
        assert_eq!(series.labels, vec!["Build", "Deployment"]);
        assert_eq!(series.values, vec![50.0, 0.0]);
    }

    #[test]
    fn test_build_aggregate_single_team_selection() {
        let store = data_store();
        let teams = vec!["Alpha".to_string()];

        let aggregate = build_aggregate(&store, &teams);
        // Alpha alone completed both Build activities
        assert_eq!(
            aggregate["Level 1"]["Build and Deployment"]["Build"],
            leaf(2, 2)
        );
    }
}
