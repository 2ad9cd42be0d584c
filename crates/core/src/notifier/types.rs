//! Types for user notifications.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::torrent_store::TorrentSnapshot;

/// Lifecycle events that produce a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    /// The download has been picked up.
    Started,
    /// The download finished.
    Completed,
}

impl NotificationEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationEvent::Started => "started",
            NotificationEvent::Completed => "completed",
        }
    }
}

impl fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a notification is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentNotice {
    pub hash: String,
    pub name: String,
    pub category: Option<String>,
}

impl From<&TorrentSnapshot> for TorrentNotice {
    fn from(torrent: &TorrentSnapshot) -> Self {
        Self {
            hash: torrent.hash.clone(),
            name: torrent.name.clone(),
            category: torrent.category.clone(),
        }
    }
}

/// Delivery channel for user notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn send(
        &self,
        event: NotificationEvent,
        notice: &TorrentNotice,
    ) -> Result<(), ServiceError>;
}
