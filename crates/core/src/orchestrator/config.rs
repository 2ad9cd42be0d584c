//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the tag orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Enable/disable the orchestrator.
    /// When disabled, no sweeps run and the sweep endpoint answers 503.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Seconds between sweeps after a successful one.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Seconds before the next sweep when the torrent list could not be
    /// fetched.
    #[serde(default = "default_retry_interval")]
    pub retry_interval_secs: u64,

    /// Bare tag marking torrents the orchestrator may rename, stop and remove.
    #[serde(default = "default_managed_tag")]
    pub managed_tag: String,

    /// Torrent categories whose removal triggers one more library refresh.
    #[serde(default = "default_library_categories")]
    pub library_categories: Vec<String>,

    /// Seconds to wait after a library refresh before relying on it.
    #[serde(default = "default_refresh_settle")]
    pub refresh_settle_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_interval() -> u64 {
    10
}

fn default_retry_interval() -> u64 {
    5
}

fn default_managed_tag() -> String {
    "tagrunner".to_string()
}

fn default_library_categories() -> Vec<String> {
    vec!["jellyfin".to_string()]
}

fn default_refresh_settle() -> u64 {
    5
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_secs: default_interval(),
            retry_interval_secs: default_retry_interval(),
            managed_tag: default_managed_tag(),
            library_categories: default_library_categories(),
            refresh_settle_secs: default_refresh_settle(),
        }
    }
}

impl OrchestratorConfig {
    pub fn is_library_category(&self, category: Option<&str>) -> bool {
        category.is_some_and(|c| self.library_categories.iter().any(|lc| lc == c))
    }
}
