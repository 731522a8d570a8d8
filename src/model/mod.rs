//! Maturity-Model Data Layer
//!
//! Typed stores over the loaded YAML dataset:
//!
//! - [`Activity`] and friends: one decoded maturity-model entry
//! - [`ActivityStore`]: eager uuid/name/dimension indexes over activities
//! - [`MetaStore`]: the validated `meta.yaml` index
//! - [`ProgressStore`]: per-activity, per-team progress states
//! - [`DataStore`]: the aggregate root shared read-only by all consumers

pub mod activity;
pub mod activity_store;
pub mod data_store;
pub mod error;
pub mod meta;
pub mod progress;

pub use activity::{Activity, Difficulty, FrameworkReferences, Implementation, RawActivity};
pub use activity_store::ActivityStore;
pub use data_store::DataStore;
pub use error::{ModelError, ModelResult};
pub use meta::{MetaStore, ProgressDefinition, TeamGroups, TeamNames};
pub use progress::{
    Progress, ProgressStore, TeamActivityProgress, TeamProgress, TeamProgressFile,
};
