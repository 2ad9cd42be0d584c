pub mod config;
pub mod error;
pub mod health;
mod http;
pub mod library;
pub mod metrics;
pub mod normalizer;
pub mod notifier;
pub mod orchestrator;
pub mod tags;
pub mod testing;
pub mod torrent_store;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, LogFormat,
    SanitizedConfig,
};
pub use error::ServiceError;
pub use health::{HealthMonitor, HealthStatus};
pub use library::{JellyfinClient, LibraryIndex, LibraryItem};
pub use normalizer::{beautify, is_media_file, media_file_name};
pub use notifier::{NotificationEvent, NotificationLinks, Notifier, SlackNotifier};
pub use orchestrator::{
    OrchestratorConfig, OrchestratorError, OrchestratorStatus, SweepReport, TagOrchestrator,
};
pub use torrent_store::{QBittorrentClient, TorrentSnapshot, TorrentStore};
