//! Mock notifier for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::ServiceError;
use crate::notifier::{NotificationEvent, Notifier, TorrentNotice};

/// Mock implementation of the Notifier trait that records what was sent.
#[derive(Debug, Default)]
pub struct MockNotifier {
    sent: Arc<RwLock<Vec<(NotificationEvent, TorrentNotice)>>>,
    error: Arc<RwLock<Option<ServiceError>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send fail until cleared with `None`.
    pub async fn set_error(&self, error: Option<ServiceError>) {
        *self.error.write().await = error;
    }

    pub async fn sent(&self) -> Vec<(NotificationEvent, TorrentNotice)> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(
        &self,
        event: NotificationEvent,
        notice: &TorrentNotice,
    ) -> Result<(), ServiceError> {
        if let Some(err) = self.error.read().await.as_ref() {
            return Err(err.clone());
        }
        self.sent.write().await.push((event, notice.clone()));
        Ok(())
    }
}
