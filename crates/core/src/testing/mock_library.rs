//! Mock library index for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::ServiceError;
use crate::library::{ItemFilter, LibraryIndex, LibraryItem, SubtitleOutcome};

/// A recorded subtitle request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSubtitleRequest {
    pub item_id: String,
    pub language: String,
}

/// Mock implementation of the LibraryIndex trait.
///
/// Subtitle requests succeed with `Downloaded` unless an outcome is set for
/// the item.
#[derive(Debug, Default)]
pub struct MockLibraryIndex {
    items: Arc<RwLock<Vec<LibraryItem>>>,
    outcomes: Arc<RwLock<HashMap<String, Result<SubtitleOutcome, ServiceError>>>>,
    refreshes: Arc<RwLock<usize>>,
    list_calls: Arc<RwLock<usize>>,
    subtitle_requests: Arc<RwLock<Vec<RecordedSubtitleRequest>>>,
    refresh_error: Arc<RwLock<Option<ServiceError>>>,
    list_error: Arc<RwLock<Option<ServiceError>>>,
}

impl MockLibraryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_item(&self, item: LibraryItem) {
        self.items.write().await.push(item);
    }

    /// Outcome of subtitle requests for one item.
    pub async fn set_subtitle_outcome(
        &self,
        item_id: &str,
        outcome: Result<SubtitleOutcome, ServiceError>,
    ) {
        self.outcomes
            .write()
            .await
            .insert(item_id.to_string(), outcome);
    }

    /// Make refreshes fail until cleared with `None`.
    pub async fn set_refresh_error(&self, error: Option<ServiceError>) {
        *self.refresh_error.write().await = error;
    }

    /// Make item listing fail until cleared with `None`.
    pub async fn set_list_error(&self, error: Option<ServiceError>) {
        *self.list_error.write().await = error;
    }

    pub async fn refresh_count(&self) -> usize {
        *self.refreshes.read().await
    }

    pub async fn list_count(&self) -> usize {
        *self.list_calls.read().await
    }

    pub async fn subtitle_requests(&self) -> Vec<RecordedSubtitleRequest> {
        self.subtitle_requests.read().await.clone()
    }
}

#[async_trait]
impl LibraryIndex for MockLibraryIndex {
    fn name(&self) -> &str {
        "mock"
    }

    async fn refresh(&self) -> Result<(), ServiceError> {
        *self.refreshes.write().await += 1;
        match self.refresh_error.read().await.as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn list_items(&self, _filter: &ItemFilter) -> Result<Vec<LibraryItem>, ServiceError> {
        *self.list_calls.write().await += 1;
        if let Some(err) = self.list_error.read().await.as_ref() {
            return Err(err.clone());
        }
        Ok(self.items.read().await.clone())
    }

    async fn download_subtitles(
        &self,
        item_id: &str,
        language: &str,
    ) -> Result<SubtitleOutcome, ServiceError> {
        self.subtitle_requests
            .write()
            .await
            .push(RecordedSubtitleRequest {
                item_id: item_id.to_string(),
                language: language.to_string(),
            });

        let outcome = self
            .outcomes
            .read()
            .await
            .get(item_id)
            .cloned()
            .unwrap_or(Ok(SubtitleOutcome::Downloaded));

        if let Ok(SubtitleOutcome::Downloaded) = outcome {
            let mut items = self.items.write().await;
            if let Some(item) = items.iter_mut().find(|i| i.id == item_id) {
                item.subtitle_languages.push(language.to_string());
            }
        }

        outcome
    }
}
