use std::sync::Arc;

use crate::config::ServerConfig;
use crate::telemetry::TelemetryClient;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Constructed once at startup and cheaply cloneable (inner data is behind
/// `Arc`); there is no process-wide singleton.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: sigrelay_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Downstream telemetry client. `None` when `ENDPOINT` is not configured.
    pub telemetry: Option<Arc<TelemetryClient>>,
}

impl AppState {
    /// Build the shared state from a pool and configuration.
    pub fn new(pool: sigrelay_db::DbPool, config: ServerConfig) -> Self {
        let telemetry = config
            .telemetry_endpoint
            .as_ref()
            .map(|endpoint| Arc::new(TelemetryClient::new(endpoint.clone())));

        Self {
            pool,
            config: Arc::new(config),
            telemetry,
        }
    }
}
