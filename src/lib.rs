//! # DSOMM
//!
//! DevSecOps Maturity Model data service - loads the DSOMM YAML dataset,
//! indexes its activities, teams and progress, and serves chart aggregates
//! and YAML exports over a REST API and a CLI.
//!
//! ## Features
//!
//! - **Typed dataset model**: activities, teams, team groups and progress
//!   decoded and validated at the load boundary
//! - **Memoized loading**: one fetch pass per process, shared by all
//!   consumers; concurrent first loads coalesce
//! - **`$ref` resolution**: YAML references across and within asset files
//! - **Chart transforms**: spiderweb series and circular-heatmap sectors
//! - **Round-trip exports**: teams and progress YAML, order preserved
//!
//! ## Modules
//!
//! - [`model`]: Activity, meta, progress and data stores
//! - [`loader`]: YAML fetching, `$ref` resolution, memoized dataset loading
//! - [`chart`]: Spiderweb and sector-grid transforms
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dsomm::loader::{HttpFetcher, Loader, TextFetcher, YamlClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = HttpFetcher::new("https://dsomm.example.org", 10_000)?;
//!     let client = YamlClient::new(Arc::new(fetcher) as Arc<dyn TextFetcher>);
//!     let loader = Loader::new(client, "assets/YAML/meta.yaml");
//!
//!     let store = loader.load().await.map_err(|e| e.to_string())?;
//!     println!("{} activities loaded", store.activities.len());
//!
//!     let activity = store.activities.activity("", "Defined build process")?;
//!     println!("{} is level {}", activity.name, activity.level);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chart;
pub mod config;
pub mod loader;
pub mod model;

// Re-export top-level types for convenience
pub use model::{
    Activity, ActivityStore, DataStore, MetaStore, ModelError, ModelResult, ProgressStore,
    TeamActivityProgress,
};

pub use loader::{HttpFetcher, Loader, LoaderError, LoaderResult, TextFetcher, YamlClient};

pub use chart::{build_aggregate, build_sectors, flatten, ChartError, ChartResult, Sector};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{Config, ConfigError, LoggingConfig};
