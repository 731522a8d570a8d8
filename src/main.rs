//! DSOMM API Server
//!
//! Run with: cargo run --bin dsomm-api
//!
//! # Configuration
//!
//! Loaded from `config.toml` (see `config::Config::load_default` for the
//! search order) with environment overrides:
//! - `DSOMM_BASE_URL`: Base URL of the YAML assets
//! - `DSOMM_META_FILE`: Meta file path below the base URL
//! - `DSOMM_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `DSOMM_API_PORT`: Port to listen on (default: 8084)
//! - `RUST_LOG`: Log level (default: info)

use dsomm::api::{serve, ApiConfig, AppState};
use dsomm::config::Config;
use dsomm::loader::{HttpFetcher, Loader, TextFetcher, YamlClient};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_default();
    init_tracing(&config);

    tracing::info!("Starting DSOMM API server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Dataset source: {}/{}",
        config.dataset.base_url,
        config.dataset.meta_file
    );

    let fetcher = HttpFetcher::new(
        config.dataset.base_url.clone(),
        config.dataset.request_timeout_ms,
    )?;
    let client = YamlClient::new(Arc::new(fetcher) as Arc<dyn TextFetcher>);
    let loader = Arc::new(Loader::new(client, config.dataset.meta_file.clone()));

    // Warm the cache; a failure is logged, not fatal, since the first
    // request (or a reload) retries.
    match loader.load().await {
        Ok(store) => tracing::info!(
            activities = store.activities.len(),
            teams = store.meta.teams.len(),
            "dataset preloaded"
        ),
        Err(e) => tracing::warn!("initial dataset load failed: {} (will retry on demand)", e),
    }

    let api_config = ApiConfig {
        host: config.api.host.clone(),
        port: config.api.port,
        request_timeout_ms: config.api.request_timeout_secs * 1000,
    };

    let state = AppState::new(loader, api_config.clone());
    serve(state, &api_config).await?;

    tracing::info!("DSOMM API server stopped");
    Ok(())
}

/// Initialize tracing from the logging config
fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("dsomm={},tower_http=debug", config.logging.level).into());

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
