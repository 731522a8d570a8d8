//! Meta Store
//!
//! Typed view of `meta.yaml`: the dataset index naming the activity files,
//! the team progress file, the team/group lists, and the progress state
//! definition. Decoded and validated once at the load boundary so nothing
//! downstream has to defend against missing keys.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use super::error::{ModelError, ModelResult};

/// Ordered list of team names
pub type TeamNames = Vec<String>;
/// Group name -> ordered team list, source order preserved
pub type TeamGroups = IndexMap<String, TeamNames>;
/// Progress state name -> completion score in [0, 1], source order preserved
pub type ProgressDefinition = IndexMap<String, f64>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMeta {
    #[serde(default)]
    teams: TeamNames,
    #[serde(default)]
    team_groups: TeamGroups,
    activity_files: Option<Vec<String>>,
    team_progress_file: Option<String>,
    #[serde(default)]
    progress_definition: IndexMap<String, RawProgressState>,
    #[serde(flatten)]
    extra: IndexMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawProgressState {
    score: Value,
}

/// Decoded and validated `meta.yaml`
#[derive(Debug, Clone, Default)]
pub struct MetaStore {
    pub teams: TeamNames,
    pub team_groups: TeamGroups,
    pub activity_files: Vec<String>,
    pub team_progress_file: String,
    pub progress_definition: ProgressDefinition,
    /// Free-form string settings (e.g. `allTeamsGroupName`)
    strings: IndexMap<String, String>,
    /// Version reported by the highest-versioned activity file meta document
    pub dataset_version: Option<String>,
}

impl MetaStore {
    /// Decode and validate a parsed `meta.yaml` document.
    pub fn from_value(value: &Value) -> ModelResult<Self> {
        let raw: RawMeta =
            serde_yaml::from_value(value.clone()).map_err(|e| ModelError::Decode {
                context: "meta.yaml".to_string(),
                source: e,
            })?;

        let activity_files = raw
            .activity_files
            .filter(|files| !files.is_empty())
            .ok_or(ModelError::MissingMetaKey("activityFiles"))?;
        let team_progress_file = raw
            .team_progress_file
            .filter(|file| !file.is_empty())
            .ok_or(ModelError::MissingMetaKey("teamProgressFile"))?;

        let progress_definition = normalize_progress_definition(&raw.progress_definition)?;

        let strings = raw
            .extra
            .iter()
            .filter_map(|(key, value)| {
                value.as_str().map(|s| (key.clone(), s.to_string()))
            })
            .collect();

        let mut meta = MetaStore {
            teams: raw.teams,
            team_groups: raw.team_groups,
            activity_files,
            team_progress_file,
            progress_definition,
            strings,
            dataset_version: None,
        };
        meta.filter_team_groups();
        Ok(meta)
    }

    /// Drop group members that are not in the team list.
    fn filter_team_groups(&mut self) {
        let teams = &self.teams;
        for members in self.team_groups.values_mut() {
            members.retain(|team| teams.contains(team));
        }
    }

    /// A free string setting from meta.yaml, if present.
    pub fn string(&self, key: &str) -> Option<&str> {
        self.strings.get(key).map(String::as_str)
    }

    /// Serialize the current teams and groups as a YAML document.
    ///
    /// Re-parsing the output yields an equivalent structure with key and
    /// list order preserved.
    pub fn teams_yaml(&self) -> ModelResult<String> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct TeamsExport<'a> {
            teams: &'a TeamNames,
            team_groups: &'a TeamGroups,
        }

        Ok(serde_yaml::to_string(&TeamsExport {
            teams: &self.teams,
            team_groups: &self.team_groups,
        })?)
    }

    /// Replace the team and group lists (save path; no in-place mutation of
    /// activities is involved).
    pub fn update_teams_and_groups(&mut self, teams: TeamNames, team_groups: TeamGroups) {
        self.teams = teams;
        self.team_groups = team_groups;
        self.filter_team_groups();
    }
}

/// Normalize score values ("50%", "0.5", 1) into fractions in [0, 1] and
/// check that the definition spans 0% and 100%.
fn normalize_progress_definition(
    raw: &IndexMap<String, RawProgressState>,
) -> ModelResult<ProgressDefinition> {
    let mut definition = ProgressDefinition::new();
    let mut messages = Vec::new();

    for (state, raw_state) in raw {
        let score = match &raw_state.score {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => {
                let trimmed = s.trim();
                let (digits, percent) = match trimmed.strip_suffix('%') {
                    Some(digits) => (digits.trim(), true),
                    None => (trimmed, false),
                };
                digits
                    .parse::<f64>()
                    .ok()
                    .map(|v| if percent { v / 100.0 } else { v })
            }
            _ => None,
        };

        match score {
            Some(score) if (0.0..=1.0).contains(&score) => {
                definition.insert(state.clone(), score);
            }
            _ => {
                messages.push(format!(
                    "The progress value for '{}' must be between 0% and 100%",
                    state
                ));
            }
        }
    }

    if !definition.values().any(|&v| v == 0.0) {
        messages.push("The meta.progressDefinition must specify a name for 0% completed".to_string());
    }
    if !definition.values().any(|&v| v == 1.0) {
        messages
            .push("The meta.progressDefinition must specify a name for 100% completed".to_string());
    }

    if messages.is_empty() {
        Ok(definition)
    } else {
        Err(ModelError::Validation {
            file: "meta.yaml (progressDefinition)".to_string(),
            messages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta_yaml() -> Value {
        serde_yaml::from_str(
            r#"
            teams:
              - Alpha
              - Bravo
              - Charlie
            teamGroups:
              Frontend:
                - Alpha
                - Bravo
              Backend:
                - Charlie
                - Ghost Team
            activityFiles:
              - generated/dimensions.yaml
              - custom/overrides.yaml
            teamProgressFile: progress/teams.yaml
            allTeamsGroupName: Everyone
            progressDefinition:
              Planned:
                score: 0
              Started:
                score: "30%"
              Documented:
                score: "80%"
              Implemented:
                score: 1
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_decode_meta() {
        let meta = MetaStore::from_value(&meta_yaml()).unwrap();

        assert_eq!(meta.teams, vec!["Alpha", "Bravo", "Charlie"]);
        assert_eq!(
            meta.activity_files,
            vec!["generated/dimensions.yaml", "custom/overrides.yaml"]
        );
        assert_eq!(meta.team_progress_file, "progress/teams.yaml");
        assert_eq!(meta.string("allTeamsGroupName"), Some("Everyone"));
    }

    #[test]
    fn test_unknown_group_members_are_dropped() {
        let meta = MetaStore::from_value(&meta_yaml()).unwrap();
        assert_eq!(meta.team_groups["Backend"], vec!["Charlie"]);
        assert_eq!(meta.team_groups["Frontend"], vec!["Alpha", "Bravo"]);
    }

    #[test]
    fn test_percent_scores_are_normalized() {
        let meta = MetaStore::from_value(&meta_yaml()).unwrap();
        let scores: Vec<f64> = meta.progress_definition.values().copied().collect();
        assert_eq!(scores, vec![0.0, 0.3, 0.8, 1.0]);
    }

    #[test]
    fn test_missing_activity_files_is_an_error() {
        let value: Value = serde_yaml::from_str(
            r#"
            teams: [Alpha]
            teamProgressFile: progress.yaml
            progressDefinition:
              Planned: { score: 0 }
              Done: { score: 1 }
            "#,
        )
        .unwrap();

        let result = MetaStore::from_value(&value);
        assert!(matches!(
            result,
            Err(ModelError::MissingMetaKey("activityFiles"))
        ));
    }

    #[test]
    fn test_progress_definition_must_span_zero_and_one() {
        let value: Value = serde_yaml::from_str(
            r#"
            teams: [Alpha]
            activityFiles: [a.yaml]
            teamProgressFile: progress.yaml
            progressDefinition:
              Started: { score: "30%" }
              Done: { score: 1 }
            "#,
        )
        .unwrap();

        let err = MetaStore::from_value(&value).unwrap_err();
        assert!(err.to_string().contains("0% completed"));
    }

    #[test]
    fn test_out_of_range_score_is_an_error() {
        let value: Value = serde_yaml::from_str(
            r#"
            teams: [Alpha]
            activityFiles: [a.yaml]
            teamProgressFile: progress.yaml
            progressDefinition:
              Planned: { score: 0 }
              Odd: { score: "150%" }
              Done: { score: 1 }
            "#,
        )
        .unwrap();

        let err = MetaStore::from_value(&value).unwrap_err();
        assert!(err.to_string().contains("'Odd'"));
    }

    #[test]
    fn test_teams_yaml_round_trip() {
        let meta = MetaStore::from_value(&meta_yaml()).unwrap();
        let yaml = meta.teams_yaml().unwrap();

        let reparsed: Value = serde_yaml::from_str(&yaml).unwrap();
        let teams: Vec<String> =
            serde_yaml::from_value(reparsed["teams"].clone()).unwrap();
        let groups: TeamGroups =
            serde_yaml::from_value(reparsed["teamGroups"].clone()).unwrap();

        assert_eq!(teams, meta.teams);
        assert_eq!(groups, meta.team_groups);
        // Key order survives the round trip
        let keys: Vec<&String> = groups.keys().collect();
        assert_eq!(keys, vec!["Frontend", "Backend"]);
    }
}
