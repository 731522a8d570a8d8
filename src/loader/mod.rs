//! Dataset Loader
//!
//! Fetches the dataset exactly once and memoizes the parsed result.
//!
//! The loader is an explicit state machine (`Unloaded` -> `Loading` ->
//! `Loaded`/`Failed`) owned by the composition root; there is no ambient
//! global. Concurrent `load()` calls before the first resolution coalesce
//! into a single fetch sequence and every caller receives the same
//! `Arc<DataStore>`. A failure is reported to all in-flight callers but does
//! not poison the cache: the next call starts a fresh fetch.
//!
//! Load order mirrors the dataset layout: `meta.yaml` first (with `$ref`
//! resolution and validation), then each activity file in declared order,
//! then the team progress file.

pub mod error;
pub mod yaml;

pub use error::{LoaderError, LoaderResult};
pub use yaml::{HttpFetcher, TextFetcher, YamlClient};

use serde_yaml::Value;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

use crate::model::{
    ActivityStore, DataStore, MetaStore, ModelError, ProgressStore, TeamProgressFile,
};

/// Activity files from the pre-uuid dataset era; their validation problems
/// are logged instead of failing the load.
const HISTORIC_FILE_SUFFIX: &str = "generated/generated.yaml";

/// What `load()` hands to every caller
pub type LoadOutcome = Result<Arc<DataStore>, Arc<LoaderError>>;

/// Externally visible loader lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
    Failed(String),
}

enum State {
    Unloaded,
    /// A load is in flight; waiters subscribe to the channel. The
    /// generation lets a stale leader (or a dropped one) be told apart from
    /// a newer attempt.
    Loading(u64, watch::Receiver<Option<LoadOutcome>>),
    Loaded(Arc<DataStore>),
    Failed(Arc<LoaderError>),
}

/// Loads and memoizes the dataset for the lifetime of the process
pub struct Loader {
    client: YamlClient,
    meta_path: String,
    state: Mutex<State>,
    generation: std::sync::atomic::AtomicU64,
}

impl Loader {
    /// Create a loader for the dataset indexed by `meta_path`.
    pub fn new(client: YamlClient, meta_path: impl Into<String>) -> Self {
        Self {
            client,
            meta_path: meta_path.into(),
            state: Mutex::new(State::Unloaded),
            generation: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Current lifecycle state, for health reporting.
    pub async fn state(&self) -> LoadState {
        match &*self.state.lock().await {
            State::Unloaded => LoadState::Unloaded,
            State::Loading(..) => LoadState::Loading,
            State::Loaded(_) => LoadState::Loaded,
            State::Failed(e) => LoadState::Failed(e.to_string()),
        }
    }

    /// Return the loaded dataset, fetching it on first use.
    ///
    /// All callers racing the first fetch share one network pass and observe
    /// the identical `Arc`. Errors are shared (`Arc<LoaderError>`) for the
    /// same reason.
    pub async fn load(&self) -> LoadOutcome {
        loop {
            let mut rx = {
                let mut state = self.state.lock().await;
                match &*state {
                    State::Loaded(store) => return Ok(Arc::clone(store)),
                    State::Loading(_, rx) => rx.clone(),
                    State::Unloaded | State::Failed(_) => {
                        let generation = self
                            .generation
                            .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
                            + 1;
                        let (tx, rx) = watch::channel(None);
                        *state = State::Loading(generation, rx);
                        drop(state);
                        return self.lead_load(generation, tx).await;
                    }
                }
            };

            // Follower: wait for the leader to publish
            loop {
                if let Some(outcome) = rx.borrow().as_ref() {
                    return outcome.clone();
                }
                if rx.changed().await.is_err() {
                    // The leader was dropped mid-load. Reset the slot (if it
                    // is still ours to reset) and retry from the top.
                    self.clear_stale_loading(&rx).await;
                    break;
                }
            }
        }
    }

    /// Perform the fetch as the loading leader and publish the outcome.
    async fn lead_load(
        &self,
        generation: u64,
        tx: watch::Sender<Option<LoadOutcome>>,
    ) -> LoadOutcome {
        let outcome: LoadOutcome = match self.load_dataset().await {
            Ok(store) => Ok(Arc::new(store)),
            Err(e) => {
                tracing::error!(error = %e, "dataset load failed");
                Err(Arc::new(e))
            }
        };

        let mut state = self.state.lock().await;
        // Only publish into the slot if no newer attempt has replaced it
        if matches!(&*state, State::Loading(g, _) if *g == generation) {
            *state = match &outcome {
                Ok(store) => State::Loaded(Arc::clone(store)),
                Err(e) => State::Failed(Arc::clone(e)),
            };
        }
        drop(state);

        let _ = tx.send(Some(outcome.clone()));
        outcome
    }

    /// Reset a Loading slot whose leader disappeared without publishing.
    async fn clear_stale_loading(&self, dead_rx: &watch::Receiver<Option<LoadOutcome>>) {
        let mut state = self.state.lock().await;
        if let State::Loading(_, rx) = &*state {
            if rx.same_channel(dead_rx) {
                *state = State::Unloaded;
            }
        }
    }

    /// Drop the cached dataset and load it again.
    pub async fn force_reload(&self) -> LoadOutcome {
        {
            let mut state = self.state.lock().await;
            if !matches!(&*state, State::Loading(..)) {
                *state = State::Unloaded;
            }
        }
        self.load().await
    }

    /// The actual fetch sequence: meta, activity files, team progress.
    async fn load_dataset(&self) -> LoaderResult<DataStore> {
        let meta_value = self.client.load_yaml_with_refs(&self.meta_path).await?;
        let mut meta = MetaStore::from_value(&meta_value)?;

        // Paths in meta.yaml are relative to meta.yaml itself
        meta.team_progress_file = self
            .client
            .make_full_path(&meta.team_progress_file, &self.meta_path)?;
        meta.activity_files = meta
            .activity_files
            .iter()
            .map(|file| self.client.make_full_path(file, &self.meta_path))
            .collect::<LoaderResult<Vec<_>>>()?;

        tracing::info!(teams = ?meta.teams, "meta loaded");

        let mut activities = ActivityStore::new();
        let mut errors: Vec<String> = Vec::new();
        let mut using_historic_file = false;

        for file in &meta.activity_files {
            tracing::debug!(file = %file, "loading activity file");
            using_historic_file |= file.ends_with(HISTORIC_FILE_SUFFIX);

            let docs = self.client.load_yaml_multi(file).await?;
            let (version, data) = split_activity_file(file, docs)?;
            activities.add_activity_file(&data, &mut errors);

            if let Some(version) = version {
                let newer = meta
                    .dataset_version
                    .as_deref()
                    .map(|existing| version.as_str() > existing)
                    .unwrap_or(true);
                if newer {
                    meta.dataset_version = Some(version);
                }
            }

            if !errors.is_empty() {
                for error in &errors {
                    tracing::error!(file = %file, "{}", error);
                }
                // Pre-uuid datasets are riddled with duplicates; keep them
                // loadable and only log.
                if !using_historic_file {
                    return Err(ModelError::Validation {
                        file: file.clone(),
                        messages: std::mem::take(&mut errors),
                    }
                    .into());
                }
                errors.clear();
            }
        }

        let progress_value = self.client.load_yaml(&meta.team_progress_file).await?;
        let progress_file: TeamProgressFile =
            serde_yaml::from_value(progress_value).map_err(|e| ModelError::Decode {
                context: meta.team_progress_file.clone(),
                source: e,
            })?;

        let mut progress = ProgressStore::new(meta.progress_definition.clone());
        progress.add_progress_data(progress_file.progress);

        tracing::info!(
            activities = activities.len(),
            version = meta.dataset_version.as_deref().unwrap_or("unknown"),
            "dataset loaded"
        );

        Ok(DataStore::new(meta, activities, progress))
    }
}

/// Split an activity file's document stream into its optional meta document
/// (carrying the dataset version) and the activity data document.
fn split_activity_file(file: &str, mut docs: Vec<Value>) -> LoaderResult<(Option<String>, Value)> {
    match docs.len() {
        1 => Ok((None, docs.remove(0))),
        2 if docs[0].get("meta").is_some() => {
            let version = docs[0]["meta"]["version"].as_str().map(str::to_string);
            Ok((version, docs.remove(1)))
        }
        _ => Err(LoaderError::BadActivityFile(file.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const META: &str = r#"
teams: [Alpha, Bravo]
teamGroups:
  All: [Alpha, Bravo]
activityFiles:
  - generated/dimensions.yaml
teamProgressFile: progress.yaml
progressDefinition:
  Planned: { score: 0 }
  Implemented: { score: 1 }
"#;

    const ACTIVITIES: &str = r#"
---
meta:
  version: "3.0"
---
Build and Deployment:
  Build:
    Defined build process:
      uuid: 00000000-1111-1111-1111-000000000000
      level: 1
      description: Builds are repeatable
"#;

    const PROGRESS: &str = r#"
progress:
  00000000-1111-1111-1111-000000000000:
    Alpha:
      Implemented: 2024-02-01
"#;

    /// Stub fetcher with a per-path call counter and an optional artificial
    /// delay so tests can race concurrent loads.
    struct CountingFetcher {
        files: HashMap<String, String>,
        fetches: AtomicUsize,
        delay: Duration,
        fail: bool,
    }

    impl CountingFetcher {
        fn dataset() -> HashMap<String, String> {
            let mut files = HashMap::new();
            files.insert("assets/YAML/meta.yaml".to_string(), META.to_string());
            files.insert(
                "assets/YAML/generated/dimensions.yaml".to_string(),
                ACTIVITIES.to_string(),
            );
            files.insert("assets/YAML/progress.yaml".to_string(), PROGRESS.to_string());
            files
        }

        fn new() -> Self {
            Self {
                files: Self::dataset(),
                fetches: AtomicUsize::new(0),
                delay: Duration::from_millis(20),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                files: HashMap::new(),
                fetches: AtomicUsize::new(0),
                delay: Duration::ZERO,
                fail: true,
            }
        }
    }

    #[async_trait]
    impl TextFetcher for CountingFetcher {
        async fn fetch_text(&self, path: &str) -> LoaderResult<String> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(LoaderError::HttpStatus {
                    url: path.to_string(),
                    status: 500,
                });
            }
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| LoaderError::HttpStatus {
                    url: path.to_string(),
                    status: 404,
                })
        }
    }

    fn loader_with(fetcher: Arc<CountingFetcher>) -> Arc<Loader> {
        let client = YamlClient::new(fetcher as Arc<dyn TextFetcher>);
        Arc::new(Loader::new(client, "assets/YAML/meta.yaml"))
    }

    #[tokio::test]
    async fn test_load_builds_data_store() {
        let loader = loader_with(Arc::new(CountingFetcher::new()));
        let store = loader.load().await.unwrap();

        assert_eq!(store.meta.teams, vec!["Alpha", "Bravo"]);
        assert_eq!(store.meta.dataset_version.as_deref(), Some("3.0"));
        let activity = store
            .activities
            .activity("00000000-1111-1111-1111-000000000000", "")
            .unwrap();
        assert_eq!(activity.name, "Defined build process");
        assert_eq!(
            store
                .progress
                .team_progress_title("00000000-1111-1111-1111-000000000000", "Alpha"),
            Some("Implemented")
        );
        assert_eq!(loader.state().await, LoadState::Loaded);
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_fetch_pass() {
        let fetcher = Arc::new(CountingFetcher::new());
        let loader = loader_with(Arc::clone(&fetcher));

        let a = tokio::spawn({
            let loader = Arc::clone(&loader);
            async move { loader.load().await }
        });
        let b = tokio::spawn({
            let loader = Arc::clone(&loader);
            async move { loader.load().await }
        });

        let store_a = a.await.unwrap().unwrap();
        let store_b = b.await.unwrap().unwrap();

        // Identical Arc, not merely equal contents
        assert!(Arc::ptr_eq(&store_a, &store_b));
        // meta + activities + progress = 3 fetches, not 6
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_second_load_returns_cache() {
        let fetcher = Arc::new(CountingFetcher::new());
        let loader = loader_with(Arc::clone(&fetcher));

        let first = loader.load().await.unwrap();
        let second = loader.load().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failure_does_not_poison_the_cache() {
        let failing = Arc::new(CountingFetcher::failing());
        let loader = loader_with(Arc::clone(&failing));

        let result = loader.load().await;
        assert!(result.is_err());
        assert!(matches!(loader.state().await, LoadState::Failed(_)));

        // A later call retries the fetch instead of replaying the failure
        let _ = loader.load().await;
        assert_eq!(failing.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_force_reload_fetches_again() {
        let fetcher = Arc::new(CountingFetcher::new());
        let loader = loader_with(Arc::clone(&fetcher));

        let first = loader.load().await.unwrap();
        let second = loader.force_reload().await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_validation_errors_fail_the_load() {
        let mut files = CountingFetcher::dataset();
        files.insert(
            "assets/YAML/generated/dimensions.yaml".to_string(),
            r#"
Category 1:
  Dimension 11:
    Dup:
      uuid: aaaaaa-1111-1111-1111-000000000000
      level: 1
  Dimension 12:
    Dup:
      uuid: bbbbbb-2222-2222-2222-000000000000
      level: 1
"#
            .to_string(),
        );
        let fetcher = Arc::new(CountingFetcher {
            files,
            fetches: AtomicUsize::new(0),
            delay: Duration::ZERO,
            fail: false,
        });
        let loader = loader_with(fetcher);

        let err = loader.load().await.unwrap_err();
        assert!(err.to_string().contains("Duplicate activity name"));
    }

    #[test]
    fn test_split_activity_file() {
        let single = vec![serde_yaml::from_str::<Value>("A: {}").unwrap()];
        let (version, _) = split_activity_file("f.yaml", single).unwrap();
        assert!(version.is_none());

        let double = vec![
            serde_yaml::from_str::<Value>("meta:\n  version: '2.1'").unwrap(),
            serde_yaml::from_str::<Value>("A: {}").unwrap(),
        ];
        let (version, data) = split_activity_file("f.yaml", double).unwrap();
        assert_eq!(version.as_deref(), Some("2.1"));
        assert!(data.get("A").is_some());

        let bad = vec![
            serde_yaml::from_str::<Value>("x: 1").unwrap(),
            serde_yaml::from_str::<Value>("y: 2").unwrap(),
            serde_yaml::from_str::<Value>("z: 3").unwrap(),
        ];
        assert!(matches!(
            split_activity_file("f.yaml", bad),
            Err(LoaderError::BadActivityFile(_))
        ));
    }
}
