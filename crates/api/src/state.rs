use std::sync::Arc;

use aether_core::storage::MediaStore;
use aether_sonauto::api::SonautoApi;
use aether_sonauto::orchestrator::GenerationOrchestrator;

use crate::config::ServerConfig;

/// Orchestrator type used by the server.
pub type Orchestrator = GenerationOrchestrator<SonautoApi>;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Generation lifecycle driver; owns the media store.
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Wire the Sonauto client, media store and orchestrator from config.
    pub fn from_config(config: ServerConfig, api: SonautoApi) -> Self {
        let store = MediaStore::new(&config.media_dir);
        let orchestrator = GenerationOrchestrator::new(
            Arc::new(api),
            store,
            config.sonauto.orchestrator_config(),
        );

        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
        }
    }
}
