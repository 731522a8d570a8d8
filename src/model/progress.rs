//! Progress Store
//!
//! Per-activity, per-team progress: which progress states a team has reached
//! for an activity, and when. States come from the meta file's progress
//! definition and are ordered by their completion score; the first state is
//! "not started" (score 0) and the last is "completed" (score 1).

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Deserialize;

use super::meta::{ProgressDefinition, TeamNames};

/// Progress state name -> date the state was reached
pub type TeamProgress = IndexMap<String, NaiveDate>;
/// Activity uuid -> team name -> team progress
pub type Progress = IndexMap<String, IndexMap<String, TeamProgress>>;

/// Shape of the team progress YAML file
#[derive(Debug, Default, Deserialize)]
pub struct TeamProgressFile {
    #[serde(default)]
    pub progress: Progress,
}

/// One team's progress on one activity, as returned by the team queries
#[derive(Debug, Clone, PartialEq)]
pub struct TeamActivityProgress {
    /// Empty for queries that aggregate over all requested teams
    pub team: String,
    pub activity_uuid: String,
    pub progress: TeamProgress,
}

/// Index over team progress data with score-ordered state titles
#[derive(Debug, Default)]
pub struct ProgressStore {
    progress: Progress,
    definition: ProgressDefinition,
    /// State titles sorted ascending by score
    titles: Vec<String>,
    /// Activity uuid -> name, used for export comments
    activity_names: IndexMap<String, String>,
}

impl ProgressStore {
    /// Create a store for the given progress definition. Titles are ordered
    /// from not-started to completed by their score.
    pub fn new(definition: ProgressDefinition) -> Self {
        let mut titles: Vec<String> = definition.keys().cloned().collect();
        titles.sort_by(|a, b| {
            definition[a]
                .partial_cmp(&definition[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Self {
            progress: Progress::new(),
            definition,
            titles,
            activity_names: IndexMap::new(),
        }
    }

    /// Provide the uuid -> name mapping used to annotate exports.
    pub fn set_activity_names(&mut self, names: IndexMap<String, String>) {
        self.activity_names = names;
    }

    pub fn progress_data(&self) -> &Progress {
        &self.progress
    }

    /// State titles ascending by score.
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// The intermediate states (everything between not-started and completed).
    pub fn in_progress_titles(&self) -> &[String] {
        if self.titles.len() <= 2 {
            return &[];
        }
        &self.titles[1..self.titles.len() - 1]
    }

    /// The 100% state title.
    pub fn completed_title(&self) -> Option<&str> {
        self.titles.last().map(String::as_str)
    }

    /// Merge additional progress data into the store.
    ///
    /// Dates merge per state; when both sides carry a date for the same
    /// state, the earliest one is kept (a state was first reached at the
    /// earliest recorded date).
    pub fn add_progress_data(&mut self, new_progress: Progress) {
        if self.progress.is_empty() {
            self.progress = new_progress;
            return;
        }

        for (uuid, teams) in new_progress {
            let existing_teams = self.progress.entry(uuid).or_default();
            for (team, team_progress) in teams {
                let existing = existing_teams.entry(team).or_default();
                for (title, date) in team_progress {
                    match existing.get(&title) {
                        Some(&current) if current <= date => {}
                        _ => {
                            existing.insert(title, date);
                        }
                    }
                }
            }
        }
    }

    /// A team's raw progress for an activity, if any.
    pub fn team_progress(&self, activity_uuid: &str, team: &str) -> Option<&TeamProgress> {
        self.progress.get(activity_uuid)?.get(team)
    }

    /// The highest-score state the team has reached, defaulting to the
    /// not-started title.
    pub fn team_progress_title(&self, activity_uuid: &str, team: &str) -> Option<&str> {
        let first = self.titles.first().map(String::as_str)?;
        let Some(team_progress) = self.team_progress(activity_uuid, team) else {
            return Some(first);
        };
        for title in self.titles.iter().rev() {
            if team_progress.contains_key(title) {
                return Some(title);
            }
        }
        Some(first)
    }

    /// Numeric completion in [0, 1] for a team's activity.
    pub fn team_progress_value(&self, activity_uuid: &str, team: &str) -> f64 {
        let Some(team_progress) = self.team_progress(activity_uuid, team) else {
            return 0.0;
        };
        for title in self.titles.iter().rev() {
            if team_progress.contains_key(title) {
                return self.definition.get(title).copied().unwrap_or(0.0);
            }
        }
        0.0
    }

    /// Activities where at least one of the teams has moved past not-started.
    pub fn activities_started(&self, teams: &TeamNames) -> Vec<TeamActivityProgress> {
        let Some(initiated) = self.titles.get(1) else {
            return Vec::new();
        };
        self.collect(teams, |team_progress| {
            team_progress.contains_key(initiated)
        })
    }

    /// Activities started but not completed by at least one of the teams.
    pub fn activities_in_progress(&self, teams: &TeamNames) -> Vec<TeamActivityProgress> {
        let (Some(initiated), Some(completed)) = (self.titles.get(1), self.titles.last()) else {
            return Vec::new();
        };
        self.collect(teams, |team_progress| {
            team_progress.contains_key(initiated) && !team_progress.contains_key(completed)
        })
    }

    /// Activities completed by every one of the given teams.
    pub fn activities_completed(&self, teams: &TeamNames) -> Vec<TeamActivityProgress> {
        let Some(completed) = self.titles.last() else {
            return Vec::new();
        };

        let mut result = Vec::new();
        for (uuid, team_map) in &self.progress {
            let all_done = !teams.is_empty()
                && teams.iter().all(|team| {
                    team_map
                        .get(team)
                        .map(|p| p.contains_key(completed))
                        .unwrap_or(false)
                });
            if all_done {
                result.push(TeamActivityProgress {
                    team: String::new(),
                    activity_uuid: uuid.clone(),
                    progress: team_map[&teams[teams.len() - 1]].clone(),
                });
            }
        }
        result
    }

    fn collect(
        &self,
        teams: &TeamNames,
        predicate: impl Fn(&TeamProgress) -> bool,
    ) -> Vec<TeamActivityProgress> {
        let mut result = Vec::new();
        for (uuid, team_map) in &self.progress {
            for team in teams {
                if let Some(team_progress) = team_map.get(team) {
                    if predicate(team_progress) {
                        result.push(TeamActivityProgress {
                            team: team.clone(),
                            activity_uuid: uuid.clone(),
                            progress: team_progress.clone(),
                        });
                    }
                }
            }
        }
        result
    }

    /// Carry a team's progress over to a new name.
    pub fn rename_team(&mut self, old_name: &str, new_name: &str) {
        for team_map in self.progress.values_mut() {
            if let Some(team_progress) = team_map.shift_remove(old_name) {
                team_map.insert(new_name.to_string(), team_progress);
            }
        }
    }

    /// Serialize progress as YAML, annotating each activity uuid with its
    /// name as a trailing comment. The not-started state is implicit and is
    /// not written; teams and activities with nothing to report are skipped.
    pub fn as_yaml_string(&self) -> String {
        let mut out = String::from("progress:\n");
        let skip_title = self.titles.first();

        for (uuid, team_map) in &self.progress {
            let mut activity_block = String::new();

            for (team, team_progress) in team_map {
                let mut team_block = String::new();
                for (title, date) in team_progress {
                    if Some(title) == skip_title {
                        continue;
                    }
                    team_block.push_str(&format!(
                        "      '{}': {}\n",
                        title,
                        date.format("%Y-%m-%d")
                    ));
                }
                if !team_block.is_empty() {
                    activity_block.push_str(&format!("    '{}':\n", team));
                    activity_block.push_str(&team_block);
                }
            }

            if !activity_block.is_empty() {
                let comment = self
                    .activity_names
                    .get(uuid)
                    .map(|name| format!("  # {}", name))
                    .unwrap_or_default();
                out.push_str(&format!("  {}:{}\n", uuid, comment));
                out.push_str(&activity_block);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> ProgressDefinition {
        let mut definition = ProgressDefinition::new();
        definition.insert("Planned".to_string(), 0.0);
        definition.insert("Started".to_string(), 0.3);
        definition.insert("Documented".to_string(), 0.8);
        definition.insert("Implemented".to_string(), 1.0);
        definition
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample_progress() -> Progress {
        serde_yaml::from_str(
            r#"
            uuid-1:
              Alpha:
                Started: 2024-01-10
                Documented: 2024-02-01
              Bravo:
                Started: 2024-01-15
                Documented: 2024-02-20
                Implemented: 2024-03-01
            uuid-2:
              Alpha:
                Started: 2024-02-05
                Documented: 2024-02-06
                Implemented: 2024-02-07
              Bravo:
                Started: 2024-03-01
                Documented: 2024-03-02
                Implemented: 2024-03-03
            "#,
        )
        .unwrap()
    }

    fn store() -> ProgressStore {
        let mut store = ProgressStore::new(definition());
        store.add_progress_data(sample_progress());
        store
    }

    #[test]
    fn test_titles_ordered_by_score() {
        let store = ProgressStore::new(definition());
        assert_eq!(
            store.titles(),
            &["Planned", "Started", "Documented", "Implemented"]
        );
        assert_eq!(store.in_progress_titles(), &["Started", "Documented"]);
        assert_eq!(store.completed_title(), Some("Implemented"));
    }

    #[test]
    fn test_progress_title_and_value() {
        let store = store();

        assert_eq!(store.team_progress_title("uuid-1", "Alpha"), Some("Documented"));
        assert_eq!(store.team_progress_value("uuid-1", "Alpha"), 0.8);
        assert_eq!(store.team_progress_title("uuid-1", "Bravo"), Some("Implemented"));
        assert_eq!(store.team_progress_value("uuid-1", "Bravo"), 1.0);

        // Unknown activity or team falls back to the not-started state
        assert_eq!(store.team_progress_title("uuid-9", "Alpha"), Some("Planned"));
        assert_eq!(store.team_progress_value("uuid-9", "Alpha"), 0.0);
    }

    #[test]
    fn test_merge_keeps_earliest_date() {
        let mut store = store();

        let overlay: Progress = serde_yaml::from_str(
            r#"
            uuid-1:
              Alpha:
                Started: 2023-12-01
                Documented: 2024-06-01
            "#,
        )
        .unwrap();
        store.add_progress_data(overlay);

        let alpha = store.team_progress("uuid-1", "Alpha").unwrap();
        assert_eq!(alpha["Started"], date("2023-12-01"));
        assert_eq!(alpha["Documented"], date("2024-02-01"));
    }

    #[test]
    fn test_team_queries() {
        let store = store();
        let teams: TeamNames = vec!["Alpha".to_string(), "Bravo".to_string()];

        let started = store.activities_started(&teams);
        assert_eq!(started.len(), 4);

        let in_progress = store.activities_in_progress(&teams);
        assert_eq!(in_progress.len(), 1);
        assert_eq!(in_progress[0].team, "Alpha");
        assert_eq!(in_progress[0].activity_uuid, "uuid-1");

        // uuid-2 is the only activity completed by every requested team
        let completed = store.activities_completed(&teams);
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].activity_uuid, "uuid-2");
    }

    #[test]
    fn test_rename_team() {
        let mut store = store();
        store.rename_team("Alpha", "Omega");

        assert!(store.team_progress("uuid-1", "Alpha").is_none());
        assert_eq!(store.team_progress_title("uuid-1", "Omega"), Some("Documented"));
    }

    #[test]
    fn test_yaml_export_round_trip() {
        let mut store = store();
        let mut names = IndexMap::new();
        names.insert("uuid-1".to_string(), "Defined build process".to_string());
        store.set_activity_names(names);

        let yaml = store.as_yaml_string();
        assert!(yaml.contains("# Defined build process"));

        let reparsed: TeamProgressFile = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(&reparsed.progress, store.progress_data());
    }
}
