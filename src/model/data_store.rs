//! Data Store
//!
//! Aggregate root for one loaded dataset: meta index, activity store and
//! progress store. Created once by the loader and shared read-only behind an
//! `Arc` by every consumer.

use indexmap::IndexMap;

use super::activity_store::ActivityStore;
use super::meta::MetaStore;
use super::progress::ProgressStore;

/// All parsed entities of one loaded dataset
#[derive(Debug)]
pub struct DataStore {
    pub meta: MetaStore,
    pub activities: ActivityStore,
    pub progress: ProgressStore,
}

impl DataStore {
    pub fn new(meta: MetaStore, activities: ActivityStore, mut progress: ProgressStore) -> Self {
        // The progress store annotates exports with activity names
        let names: IndexMap<String, String> = activities
            .all_activities()
            .iter()
            .filter(|a| !a.uuid.is_empty())
            .map(|a| (a.uuid.clone(), a.name.clone()))
            .collect();
        progress.set_activity_names(names);

        Self {
            meta,
            activities,
            progress,
        }
    }

    /// Highest activity level in the dataset.
    pub fn max_level(&self) -> u32 {
        self.activities.max_level()
    }

    /// Resolve a team-group selection to team names. A group name expands to
    /// its members; a plain team name passes through when known.
    pub fn resolve_teams(&self, selection: &[String]) -> Vec<String> {
        if selection.is_empty() {
            return self.meta.teams.clone();
        }

        let mut teams = Vec::new();
        for entry in selection {
            if let Some(members) = self.meta.team_groups.get(entry) {
                for member in members {
                    if !teams.contains(member) {
                        teams.push(member.clone());
                    }
                }
            } else if self.meta.teams.contains(entry) && !teams.contains(entry) {
                teams.push(entry.clone());
            }
        }
        teams
    }
}
