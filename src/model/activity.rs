//! Activity Types
//!
//! Typed representation of one maturity-model entry as it appears in the
//! activity YAML files. The YAML nests activities three levels deep
//! (category -> dimension -> activity name); the position keys are folded
//! into the decoded [`Activity`] so consumers never walk the raw document.

use serde::{Deserialize, Serialize};

/// How hard an activity is to implement, per resource axis (1-5 scales)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    #[serde(default)]
    pub knowledge: u32,
    #[serde(default)]
    pub time: u32,
    #[serde(default)]
    pub resources: u32,
}

/// A concrete tool or practice that implements an activity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Implementation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
}

/// Cross-references into external security frameworks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameworkReferences {
    /// The YAML uses dashed keys (`iso27001-2017`); the alias accepts both.
    #[serde(default, alias = "iso27001-2017", rename = "iso27001_2017")]
    pub iso27001_2017: Vec<String>,
    #[serde(default, alias = "iso27001-2022", rename = "iso27001_2022")]
    pub iso27001_2022: Vec<String>,
    #[serde(default)]
    pub samm2: Vec<String>,
    #[serde(default, rename = "openCRE")]
    pub open_cre: Vec<String>,
}

/// One activity as written in a YAML file.
///
/// Every field is optional so that a later file can override an earlier one
/// field by field: an absent field means "keep the existing value", which is
/// not expressible with plain defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawActivity {
    /// Marks the activity as removed when merging dataset overlays
    #[serde(default)]
    pub ignore: bool,
    pub uuid: Option<String>,
    pub level: Option<u32>,
    pub description: Option<String>,
    pub risk: Option<String>,
    pub measure: Option<String>,
    pub tags: Option<Vec<String>>,
    pub implementation_guide: Option<String>,
    pub difficulty_of_implementation: Option<Difficulty>,
    pub usefulness: Option<u32>,
    pub depends_on: Option<Vec<String>>,
    pub comments: Option<String>,
    pub implementation: Option<Vec<Implementation>>,
    pub evidence: Option<String>,
    pub assessment: Option<String>,
    pub references: Option<FrameworkReferences>,
}

/// A fully decoded maturity-model entry. Immutable once the load completes.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub uuid: String,
    pub name: String,
    pub category: String,
    pub dimension: String,
    pub level: u32,
    pub description: String,
    pub risk: String,
    pub measure: String,
    pub tags: Vec<String>,
    pub implementation_guide: String,
    pub difficulty_of_implementation: Difficulty,
    pub usefulness: u32,
    pub depends_on: Vec<String>,
    pub comments: String,
    pub implementation: Vec<Implementation>,
    pub evidence: String,
    pub assessment: String,
    pub references: FrameworkReferences,
}

impl Activity {
    /// Build an activity from its raw form plus the position keys of the
    /// document it came from.
    pub fn from_raw(raw: RawActivity, category: &str, dimension: &str, name: &str) -> Self {
        let mut activity = Activity {
            category: category.to_string(),
            dimension: dimension.to_string(),
            name: name.to_string(),
            ..Default::default()
        };
        activity.apply(raw);
        activity
    }

    /// Override fields present in `raw`, keeping existing values for the rest.
    pub fn apply(&mut self, raw: RawActivity) {
        if let Some(uuid) = raw.uuid {
            self.uuid = uuid;
        }
        if let Some(level) = raw.level {
            self.level = level;
        }
        if let Some(description) = raw.description {
            self.description = description;
        }
        if let Some(risk) = raw.risk {
            self.risk = risk;
        }
        if let Some(measure) = raw.measure {
            self.measure = measure;
        }
        if let Some(tags) = raw.tags {
            self.tags = tags;
        }
        if let Some(guide) = raw.implementation_guide {
            self.implementation_guide = guide;
        }
        if let Some(difficulty) = raw.difficulty_of_implementation {
            self.difficulty_of_implementation = difficulty;
        }
        if let Some(usefulness) = raw.usefulness {
            self.usefulness = usefulness;
        }
        if let Some(depends_on) = raw.depends_on {
            self.depends_on = depends_on;
        }
        if let Some(comments) = raw.comments {
            self.comments = comments;
        }
        if let Some(implementation) = raw.implementation {
            self.implementation = implementation;
        }
        if let Some(evidence) = raw.evidence {
            self.evidence = evidence;
        }
        if let Some(assessment) = raw.assessment {
            self.assessment = assessment;
        }
        if let Some(references) = raw.references {
            self.references = references;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_fills_position_keys() {
        let raw: RawActivity = serde_yaml::from_str(
            r#"
            uuid: 00000000-1111-1111-1111-000000000000
            level: 2
            description: Base description
            "#,
        )
        .unwrap();

        let activity = Activity::from_raw(raw, "Category 1", "Dimension 11", "Activity 111");
        assert_eq!(activity.category, "Category 1");
        assert_eq!(activity.dimension, "Dimension 11");
        assert_eq!(activity.name, "Activity 111");
        assert_eq!(activity.level, 2);
        assert_eq!(activity.description, "Base description");
    }

    #[test]
    fn test_apply_overrides_only_present_fields() {
        let base: RawActivity = serde_yaml::from_str(
            r#"
            uuid: 00000000-1111-1111-1111-000000000000
            level: 1
            description: Base description
            risk: Base risk
            "#,
        )
        .unwrap();
        let mut activity = Activity::from_raw(base, "C", "D", "A");

        let overlay: RawActivity =
            serde_yaml::from_str("description: Overridden").unwrap();
        activity.apply(overlay);

        assert_eq!(activity.description, "Overridden");
        assert_eq!(activity.risk, "Base risk");
        assert_eq!(activity.level, 1);
        assert_eq!(activity.uuid, "00000000-1111-1111-1111-000000000000");
    }

    #[test]
    fn test_references_accept_dashed_keys() {
        let raw: RawActivity = serde_yaml::from_str(
            r#"
            uuid: abc
            references:
              iso27001-2017:
                - "12.1"
              iso27001-2022:
                - "8.27"
              samm2:
                - "D-SR-1-A"
              openCRE:
                - "155-155"
            "#,
        )
        .unwrap();

        let references = raw.references.unwrap();
        assert_eq!(references.iso27001_2017, vec!["12.1"]);
        assert_eq!(references.iso27001_2022, vec!["8.27"]);
        assert_eq!(references.samm2, vec!["D-SR-1-A"]);
        assert_eq!(references.open_cre, vec!["155-155"]);
    }

    #[test]
    fn test_camel_case_field_names() {
        let raw: RawActivity = serde_yaml::from_str(
            r#"
            uuid: abc
            dependsOn:
              - Defined build process
            difficultyOfImplementation:
              knowledge: 2
              time: 3
              resources: 1
            "#,
        )
        .unwrap();

        assert_eq!(raw.depends_on.unwrap(), vec!["Defined build process"]);
        let difficulty = raw.difficulty_of_implementation.unwrap();
        assert_eq!(difficulty.knowledge, 2);
        assert_eq!(difficulty.time, 3);
        assert_eq!(difficulty.resources, 1);
    }
}
