use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::orchestrator::OrchestratorConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub qbittorrent: QBittorrentConfig,
    pub jellyfin: JellyfinConfig,
    /// Slack notifications are disabled when absent.
    #[serde(default)]
    pub slack: Option<SlackConfig>,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub health: HealthConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// qBittorrent Web API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QBittorrentConfig {
    /// Web API base URL (e.g., "http://localhost:8080")
    pub url: String,
    /// URL linked from notifications, if different from `url`
    #[serde(default)]
    pub public_url: Option<String>,
    /// Login is skipped when no credentials are configured.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Jellyfin configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JellyfinConfig {
    pub url: String,
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default)]
    pub api_key: String,
    /// Subtitle language requested from Jellyfin (ISO 639-2).
    #[serde(default = "default_subtitle_language")]
    pub subtitle_language: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_subtitle_language() -> String {
    "eng".to_string()
}

/// Slack incoming webhook configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlackConfig {
    pub webhook_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    10
}

/// Health monitor configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthConfig {
    /// Seconds between checks while healthy.
    #[serde(default = "default_health_interval")]
    pub interval_secs: u64,
    /// Seconds between checks while unhealthy.
    #[serde(default = "default_health_retry_interval")]
    pub retry_interval_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_health_interval(),
            retry_interval_secs: default_health_retry_interval(),
        }
    }
}

fn default_health_interval() -> u64 {
    15
}

fn default_health_retry_interval() -> u64 {
    5
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub qbittorrent: SanitizedQBittorrentConfig,
    pub jellyfin: SanitizedJellyfinConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack: Option<SanitizedSlackConfig>,
    pub orchestrator: OrchestratorConfig,
    pub health: HealthConfig,
}

/// Sanitized qBittorrent config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedQBittorrentConfig {
    pub url: String,
    pub public_url: Option<String>,
    pub username: Option<String>,
    pub password_configured: bool,
    pub timeout_secs: u64,
}

/// Sanitized Jellyfin config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedJellyfinConfig {
    pub url: String,
    pub public_url: Option<String>,
    pub api_key_configured: bool,
    pub subtitle_language: String,
    pub timeout_secs: u64,
}

/// Sanitized Slack config (the webhook URL is a credential)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSlackConfig {
    pub webhook_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            logging: config.logging.clone(),
            qbittorrent: SanitizedQBittorrentConfig {
                url: config.qbittorrent.url.clone(),
                public_url: config.qbittorrent.public_url.clone(),
                username: config.qbittorrent.username.clone(),
                password_configured: config
                    .qbittorrent
                    .password
                    .as_ref()
                    .is_some_and(|p| !p.is_empty()),
                timeout_secs: config.qbittorrent.timeout_secs,
            },
            jellyfin: SanitizedJellyfinConfig {
                url: config.jellyfin.url.clone(),
                public_url: config.jellyfin.public_url.clone(),
                api_key_configured: !config.jellyfin.api_key.is_empty(),
                subtitle_language: config.jellyfin.subtitle_language.clone(),
                timeout_secs: config.jellyfin.timeout_secs,
            },
            slack: config.slack.as_ref().map(|s| SanitizedSlackConfig {
                webhook_configured: !s.webhook_url.is_empty(),
                timeout_secs: s.timeout_secs,
            }),
            orchestrator: config.orchestrator.clone(),
            health: config.health.clone(),
        }
    }
}
