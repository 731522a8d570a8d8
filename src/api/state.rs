//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::api::error::ApiResult;
use crate::loader::Loader;
use crate::model::DataStore;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Dataset loader, memoizing the parsed YAML dataset
    pub loader: Arc<Loader>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(loader: Arc<Loader>, config: ApiConfig) -> Self {
        Self {
            loader,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// The loaded dataset, fetching it on first use.
    pub async fn dataset(&self) -> ApiResult<Arc<DataStore>> {
        Ok(self.loader.load().await?)
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8084,
            request_timeout_ms: 30_000,
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
