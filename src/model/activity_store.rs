//! Activity Store
//!
//! In-memory index over the decoded activity list. Built eagerly in one pass
//! per loaded file, so every lookup after construction is a dictionary probe.
//!
//! Activity files stack: the first file establishes the dataset, later files
//! overlay it (matched by uuid, falling back to name) or remove entries via
//! `ignore` markers. Duplicate names and uuids inside one dataset are
//! reported as validation messages; on a name collision the name index keeps
//! the last occurrence (last-write-wins).

use indexmap::IndexMap;
use regex::Regex;
use serde_yaml::Value;
use std::collections::{HashMap, HashSet};

use super::activity::{Activity, RawActivity};
use super::error::{ModelError, ModelResult};

/// Entries scheduled for removal while ingesting an overlay file
#[derive(Debug, Default)]
struct IgnoreList {
    categories: HashSet<String>,
    dimensions: HashSet<String>,
    uuids: HashSet<String>,
    names: HashSet<String>,
}

impl IgnoreList {
    fn is_empty(&self) -> bool {
        self.categories.is_empty()
            && self.dimensions.is_empty()
            && self.uuids.is_empty()
            && self.names.is_empty()
    }

    fn matches(&self, activity: &Activity) -> bool {
        self.categories.contains(&activity.category)
            || self.dimensions.contains(&activity.dimension)
            || self.uuids.contains(&activity.uuid)
            || self.names.contains(&activity.name)
    }
}

/// One decoded activity plus its raw form, kept until merge time so a
/// later file can override an earlier one field by field
#[derive(Debug)]
struct IncomingActivity {
    category: String,
    dimension: String,
    name: String,
    raw: RawActivity,
}

/// Lookup index over activities by uuid, name, and dimension
#[derive(Debug, Default)]
pub struct ActivityStore {
    activities: Vec<Activity>,
    by_uuid: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    dimensions: IndexMap<String, Vec<usize>>,
    categories: Vec<String>,
    max_level: u32,
}

impl ActivityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All activities in source order.
    pub fn all_activities(&self) -> &[Activity] {
        &self.activities
    }

    /// Activities whose level does not exceed `max_level`.
    pub fn activities_up_to_level(&self, max_level: u32) -> Vec<&Activity> {
        self.activities.iter().filter(|a| a.level <= max_level).collect()
    }

    /// Category names in first-seen order.
    pub fn category_names(&self) -> &[String] {
        &self.categories
    }

    /// Dimension names in first-seen order.
    pub fn dimension_names(&self) -> Vec<&str> {
        self.dimensions.keys().map(String::as_str).collect()
    }

    /// Highest level across all activities (0 when the store is empty).
    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Resolve an activity by uuid, falling back to name.
    ///
    /// An empty uuid skips straight to the name index. Returns a typed
    /// not-found error when neither key resolves; callers must not treat the
    /// result as optional.
    pub fn activity(&self, uuid: &str, name: &str) -> ModelResult<&Activity> {
        if !uuid.is_empty() {
            if let Some(activity) = self.activity_by_uuid(uuid) {
                return Ok(activity);
            }
        }
        self.activity_by_name(name)
            .ok_or_else(|| ModelError::ActivityNotFound {
                uuid: uuid.to_string(),
                name: name.to_string(),
            })
    }

    pub fn activity_by_uuid(&self, uuid: &str) -> Option<&Activity> {
        self.by_uuid.get(uuid).map(|&i| &self.activities[i])
    }

    pub fn activity_by_name(&self, name: &str) -> Option<&Activity> {
        self.by_name.get(name).map(|&i| &self.activities[i])
    }

    /// Activities of one dimension at one level, in source order.
    pub fn activities_in(&self, dimension: &str, level: u32) -> Vec<&Activity> {
        match self.dimensions.get(dimension) {
            Some(indices) => indices
                .iter()
                .map(|&i| &self.activities[i])
                .filter(|a| a.level == level)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Ingest one parsed activity document
    /// (category -> dimension -> activity name -> fields).
    ///
    /// The first document populates the store; later documents merge into it.
    /// Validation problems (duplicates, undecodable entries) are appended to
    /// `errors` rather than aborting, so one pass reports every defect.
    pub fn add_activity_file(&mut self, doc: &Value, errors: &mut Vec<String>) {
        let mut incoming: Vec<IncomingActivity> = Vec::new();
        let mut ignores = IgnoreList::default();
        self.prepare_activities(doc, &mut incoming, &mut ignores, errors);

        if self.activities.is_empty() {
            for entry in incoming {
                self.insert(decode(entry), errors);
            }
        } else {
            self.remove_ignored(&ignores);
            self.merge(incoming, errors);
        }

        self.resolve_depends_on();
        self.rebuild_hierarchy();
    }

    /// Walk the raw document, decoding each activity and folding the
    /// position keys (category, dimension, name) into it. `ignore` markers
    /// at any of the three levels land in the ignore list instead.
    fn prepare_activities(
        &self,
        doc: &Value,
        incoming: &mut Vec<IncomingActivity>,
        ignores: &mut IgnoreList,
        errors: &mut Vec<String>,
    ) {
        let Some(categories) = doc.as_mapping() else {
            errors.push("activity document is not a mapping of categories".to_string());
            return;
        };

        for (category_key, dimensions) in categories {
            let Some(category_name) = category_key.as_str() else { continue };
            let Some(dimensions) = dimensions.as_mapping() else { continue };

            for (dimension_key, activities) in dimensions {
                let Some(dimension_name) = dimension_key.as_str() else { continue };
                if dimension_name == "ignore" {
                    ignores.categories.insert(category_name.to_string());
                    continue;
                }
                let Some(activities) = activities.as_mapping() else { continue };

                for (activity_key, fields) in activities {
                    let Some(activity_name) = activity_key.as_str() else { continue };
                    if activity_name == "ignore" {
                        ignores.dimensions.insert(dimension_name.to_string());
                        continue;
                    }

                    let raw: RawActivity = match serde_yaml::from_value(fields.clone()) {
                        Ok(raw) => raw,
                        Err(e) => {
                            errors.push(format!(
                                "Cannot decode activity '{}' in '{}/{}': {}",
                                activity_name, category_name, dimension_name, e
                            ));
                            continue;
                        }
                    };

                    if raw.ignore {
                        match &raw.uuid {
                            Some(uuid) if !uuid.is_empty() => {
                                ignores.uuids.insert(uuid.clone());
                            }
                            _ => {
                                ignores.names.insert(activity_name.to_string());
                            }
                        }
                        continue;
                    }

                    incoming.push(IncomingActivity {
                        category: category_name.to_string(),
                        dimension: dimension_name.to_string(),
                        name: activity_name.to_string(),
                        raw,
                    });
                }
            }
        }
    }

    /// Insert a fresh activity, recording duplicate keys.
    ///
    /// A duplicated name still inserts and re-points the name index at the
    /// newcomer (last-write-wins); a duplicated uuid keeps the original.
    fn insert(&mut self, activity: Activity, errors: &mut Vec<String>) {
        let name_exists = self.by_name.contains_key(&activity.name);
        let uuid_exists =
            !activity.uuid.is_empty() && self.by_uuid.contains_key(&activity.uuid);

        if name_exists && uuid_exists {
            errors.push(format!(
                "Duplicate activity '{}' ({}). Please remove one from your activity yaml files.",
                activity.name, activity.uuid
            ));
            return;
        }
        if uuid_exists {
            let existing = &self.activities[self.by_uuid[&activity.uuid]];
            errors.push(format!(
                "Duplicate activity uuid '{}' ('{}' and '{}').",
                activity.uuid, activity.name, existing.name
            ));
            return;
        }
        if name_exists {
            let existing = &self.activities[self.by_name[&activity.name]];
            errors.push(format!(
                "Duplicate activity name '{}' ({} and {}). Please remove or rename one of the activities.",
                activity.name, activity.uuid, existing.uuid
            ));
            // fall through: the newcomer wins the name index
        }

        let index = self.activities.len();
        self.by_name.insert(activity.name.clone(), index);
        if !activity.uuid.is_empty() {
            self.by_uuid.insert(activity.uuid.clone(), index);
        }
        self.activities.push(activity);
    }

    /// Merge overlay activities into the existing dataset.
    ///
    /// An existing entry is identified by uuid when the overlay carries one,
    /// otherwise by name; matches are updated field by field, everything
    /// else is inserted as new.
    fn merge(&mut self, incoming: Vec<IncomingActivity>, errors: &mut Vec<String>) {
        for entry in incoming {
            let uuid = entry.raw.uuid.clone().unwrap_or_default();
            let existing = if uuid.is_empty() {
                self.by_name.get(&entry.name).copied()
            } else {
                match self.by_uuid.get(&uuid).copied() {
                    Some(index) => Some(index),
                    None => {
                        // New uuid, but the name may already be taken by a
                        // different activity.
                        if let Some(&name_index) = self.by_name.get(&entry.name) {
                            errors.push(format!(
                                "The activity '{}' exists with different uuids ({} and {})",
                                entry.name, uuid, self.activities[name_index].uuid
                            ));
                        }
                        None
                    }
                }
            };

            match existing {
                Some(index) => self.update(index, entry),
                None => {
                    let activity = decode(entry);
                    let index = self.activities.len();
                    self.by_name.insert(activity.name.clone(), index);
                    if !activity.uuid.is_empty() {
                        self.by_uuid.insert(activity.uuid.clone(), index);
                    }
                    self.activities.push(activity);
                }
            }
        }
    }

    /// Apply an overlay to an existing activity field by field, keeping the
    /// indexes aligned when the overlay renames it or changes its uuid.
    fn update(&mut self, index: usize, overlay: IncomingActivity) {
        let existing = &self.activities[index];

        if overlay.name != existing.name {
            self.by_name.remove(&existing.name);
            self.by_name.insert(overlay.name.clone(), index);
        }
        if let Some(uuid) = overlay.raw.uuid.as_deref() {
            if uuid != existing.uuid {
                if !existing.uuid.is_empty() {
                    self.by_uuid.remove(&existing.uuid);
                }
                if !uuid.is_empty() {
                    self.by_uuid.insert(uuid.to_string(), index);
                }
            }
        }

        let existing = &mut self.activities[index];
        existing.category = overlay.category;
        existing.dimension = overlay.dimension;
        existing.name = overlay.name;
        existing.apply(overlay.raw);
    }

    /// Drop entries matched by the overlay's ignore markers and rebuild the
    /// key indexes from what remains.
    fn remove_ignored(&mut self, ignores: &IgnoreList) {
        if ignores.is_empty() {
            return;
        }

        self.activities.retain(|activity| !ignores.matches(activity));

        self.by_uuid.clear();
        self.by_name.clear();
        for (index, activity) in self.activities.iter().enumerate() {
            self.by_name.insert(activity.name.clone(), index);
            if !activity.uuid.is_empty() {
                self.by_uuid.insert(activity.uuid.clone(), index);
            }
        }
    }

    /// Substitute `depends_on` uuids with the referenced activity's name, so
    /// dependency lists read uniformly regardless of how the file wrote them.
    fn resolve_depends_on(&mut self) {
        let uuid_pattern = uuid_regex();
        let names: HashMap<String, String> = self
            .activities
            .iter()
            .filter(|a| !a.uuid.is_empty())
            .map(|a| (a.uuid.clone(), a.name.clone()))
            .collect();

        for activity in &mut self.activities {
            for dependency in &mut activity.depends_on {
                if uuid_pattern.is_match(dependency) {
                    if let Some(name) = names.get(dependency.as_str()) {
                        *dependency = name.clone();
                    }
                }
            }
        }
    }

    /// Recompute the dimension index, category list and max level.
    fn rebuild_hierarchy(&mut self) {
        self.dimensions.clear();
        self.categories.clear();
        self.max_level = 0;

        let mut seen_categories: HashSet<&str> = HashSet::new();
        for (index, activity) in self.activities.iter().enumerate() {
            if seen_categories.insert(&activity.category) {
                self.categories.push(activity.category.clone());
            }
            self.dimensions
                .entry(activity.dimension.clone())
                .or_default()
                .push(index);
            if activity.level > self.max_level {
                self.max_level = activity.level;
            }
        }
    }
}

fn decode(entry: IncomingActivity) -> Activity {
    Activity::from_raw(entry.raw, &entry.category, &entry.dimension, &entry.name)
}

fn uuid_regex() -> Regex {
    // Mirrors the loose uuid shape used in activity files (first and last
    // groups may exceed the canonical length).
    Regex::new(r"(?i)^[0-9a-f]{6,}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{6,}$")
        .expect("uuid regex is valid")
}
