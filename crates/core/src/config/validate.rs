use reqwest::Url;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Intervals and timeouts are not 0
/// - Service URLs parse
/// - Jellyfin API key is set when the orchestrator is enabled
/// - Managed tag is non-empty and has no surrounding whitespace
/// - Managed tag cannot be mistaken for an action tag
/// - Subtitle language is set
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    validate_url("qbittorrent.url", &config.qbittorrent.url)?;
    if let Some(public_url) = &config.qbittorrent.public_url {
        validate_url("qbittorrent.public_url", public_url)?;
    }
    non_zero("qbittorrent.timeout_secs", config.qbittorrent.timeout_secs)?;

    validate_url("jellyfin.url", &config.jellyfin.url)?;
    if let Some(public_url) = &config.jellyfin.public_url {
        validate_url("jellyfin.public_url", public_url)?;
    }
    non_zero("jellyfin.timeout_secs", config.jellyfin.timeout_secs)?;
    if config.jellyfin.subtitle_language.trim().is_empty() {
        return Err(invalid("jellyfin.subtitle_language cannot be empty"));
    }

    if let Some(slack) = &config.slack {
        validate_url("slack.webhook_url", &slack.webhook_url)?;
        non_zero("slack.timeout_secs", slack.timeout_secs)?;
    }

    let orchestrator = &config.orchestrator;
    non_zero("orchestrator.interval_secs", orchestrator.interval_secs)?;
    non_zero(
        "orchestrator.retry_interval_secs",
        orchestrator.retry_interval_secs,
    )?;
    if orchestrator.enabled && config.jellyfin.api_key.is_empty() {
        return Err(invalid(
            "jellyfin.api_key is required when the orchestrator is enabled",
        ));
    }
    let tag = orchestrator.managed_tag.as_str();
    if tag.trim().is_empty() {
        return Err(invalid("orchestrator.managed_tag cannot be empty"));
    }
    if tag.trim() != tag {
        return Err(invalid(
            "orchestrator.managed_tag cannot have leading or trailing whitespace",
        ));
    }
    if tag.contains(':') || tag.contains('=') {
        return Err(invalid(
            "orchestrator.managed_tag cannot contain ':' or '='",
        ));
    }

    non_zero("health.interval_secs", config.health.interval_secs)?;
    non_zero("health.retry_interval_secs", config.health.retry_interval_secs)?;

    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

fn non_zero(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(invalid(format!("{} cannot be 0", field)));
    }
    Ok(())
}

fn validate_url(field: &str, value: &str) -> Result<(), ConfigError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| invalid(format!("{} is not a valid URL ({}): {}", field, value, e)))
}
