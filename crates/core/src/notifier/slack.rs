//! Slack incoming-webhook notifier.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::SlackConfig;
use crate::error::ServiceError;
use crate::http::{build_client, read_success_body, transport_error};

use super::{NotificationEvent, Notifier, TorrentNotice};

const SERVICE: &str = "slack";

/// Public URLs linked from messages.
#[derive(Debug, Clone, Default)]
pub struct NotificationLinks {
    pub torrents_url: Option<String>,
    pub library_url: Option<String>,
}

pub struct SlackNotifier {
    client: Client,
    webhook_url: String,
    links: NotificationLinks,
}

impl SlackNotifier {
    pub fn new(config: &SlackConfig, links: NotificationLinks) -> Result<Self, ServiceError> {
        let client = build_client(SERVICE, config.timeout_secs, false)?;
        Ok(Self {
            client,
            webhook_url: config.webhook_url.clone(),
            links,
        })
    }

    fn payload(&self, event: NotificationEvent, notice: &TorrentNotice) -> Value {
        build_payload(event, notice, &self.links)
    }
}

fn build_payload(event: NotificationEvent, notice: &TorrentNotice, links: &NotificationLinks) -> Value {
    let headline = match event {
        NotificationEvent::Started => format!("Download started: {}", notice.name),
        NotificationEvent::Completed => format!("Download completed: {}", notice.name),
    };

    let mut details = format!("*{}*", notice.name);
    if let Some(category) = &notice.category {
        details.push_str(&format!("\nCategory: `{}`", category));
    }

    let mut blocks = vec![
        json!({
            "type": "header",
            "text": { "type": "plain_text", "text": headline },
        }),
        json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": details },
        }),
    ];

    let mut link_parts = Vec::new();
    if let Some(url) = &links.torrents_url {
        link_parts.push(format!("<{}|qBittorrent>", url));
    }
    if event == NotificationEvent::Completed {
        if let Some(url) = &links.library_url {
            link_parts.push(format!("<{}|Jellyfin>", url));
        }
    }
    if !link_parts.is_empty() {
        blocks.push(json!({
            "type": "context",
            "elements": [{ "type": "mrkdwn", "text": link_parts.join(" | ") }],
        }));
    }

    json!({
        "text": headline,
        "blocks": blocks,
    })
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn send(
        &self,
        event: NotificationEvent,
        notice: &TorrentNotice,
    ) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&self.payload(event, notice))
            .send()
            .await
            .map_err(transport_error(SERVICE))?;
        read_success_body(SERVICE, response).await?;
        Ok(())
    }
}
