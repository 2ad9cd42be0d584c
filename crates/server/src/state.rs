use std::sync::Arc;

use tagrunner_core::{Config, HealthMonitor, SanitizedConfig, TagOrchestrator, TorrentStore};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn TorrentStore>,
    health: Arc<HealthMonitor>,
    orchestrator: Option<Arc<TagOrchestrator>>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn TorrentStore>,
        health: Arc<HealthMonitor>,
        orchestrator: Option<Arc<TagOrchestrator>>,
    ) -> Self {
        Self {
            config,
            store,
            health,
            orchestrator,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn store(&self) -> &Arc<dyn TorrentStore> {
        &self.store
    }

    pub fn health(&self) -> &Arc<HealthMonitor> {
        &self.health
    }

    /// `None` when the orchestrator is disabled in config.
    pub fn orchestrator(&self) -> Option<&Arc<TagOrchestrator>> {
        self.orchestrator.as_ref()
    }
}
