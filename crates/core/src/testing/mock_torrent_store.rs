//! Mock torrent store for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::ServiceError;
use crate::torrent_store::{ContentFile, TorrentSnapshot, TorrentState, TorrentStore};

/// Store operations, for targeted failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Ping,
    List,
    AddTags,
    RemoveTags,
    Stop,
    ContentFiles,
    Remove,
}

/// A recorded call for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Ping,
    List,
    AddTags { hash: String, tags: Vec<String> },
    RemoveTags { hash: String, tags: Vec<String> },
    Stop { hash: String },
    ContentFiles { hash: String },
    Remove { hash: String, delete_files: bool },
}

impl StoreCall {
    /// Whether the call changes store state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            StoreCall::AddTags { .. }
                | StoreCall::RemoveTags { .. }
                | StoreCall::Stop { .. }
                | StoreCall::Remove { .. }
        )
    }

    pub fn hash(&self) -> Option<&str> {
        match self {
            StoreCall::Ping | StoreCall::List => None,
            StoreCall::AddTags { hash, .. }
            | StoreCall::RemoveTags { hash, .. }
            | StoreCall::Stop { hash }
            | StoreCall::ContentFiles { hash }
            | StoreCall::Remove { hash, .. } => Some(hash),
        }
    }
}

/// Mock implementation of the TorrentStore trait.
///
/// Provides controllable behavior for testing:
/// - Tag mutations are applied to the stored torrents
/// - Every call is recorded
/// - Failures can be injected once or per operation
///
/// # Example
///
/// ```rust,ignore
/// let store = MockTorrentStore::new();
/// store.add_torrent(snapshot).await;
/// store.set_files("abc123", vec![ContentFile::new("a.mkv", 1.0)]).await;
///
/// store.fail_operation(StoreOperation::RemoveTags, ServiceError::upstream(..)).await;
/// ```
#[derive(Debug, Default)]
pub struct MockTorrentStore {
    torrents: Arc<RwLock<Vec<TorrentSnapshot>>>,
    files: Arc<RwLock<HashMap<String, Vec<ContentFile>>>>,
    calls: Arc<RwLock<Vec<StoreCall>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<ServiceError>>>,
    /// Operations that keep failing until cleared.
    failing: Arc<RwLock<HashMap<StoreOperation, ServiceError>>>,
    /// Operations whose next call fails.
    failing_once: Arc<RwLock<HashMap<StoreOperation, ServiceError>>>,
}

impl MockTorrentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a torrent.
    pub async fn add_torrent(&self, torrent: TorrentSnapshot) {
        let mut torrents = self.torrents.write().await;
        torrents.retain(|t| t.hash != torrent.hash);
        torrents.push(torrent);
    }

    pub async fn set_files(&self, hash: &str, files: Vec<ContentFile>) {
        self.files.write().await.insert(hash.to_string(), files);
    }

    pub async fn set_progress(&self, hash: &str, progress: f64) {
        if let Some(torrent) = self.torrents.write().await.iter_mut().find(|t| t.hash == hash) {
            torrent.progress = progress;
        }
    }

    /// Current snapshot of a torrent, if still present.
    pub async fn torrent(&self, hash: &str) -> Option<TorrentSnapshot> {
        self.torrents
            .read()
            .await
            .iter()
            .find(|t| t.hash == hash)
            .cloned()
    }

    /// Current tags of a torrent, sorted.
    pub async fn tags(&self, hash: &str) -> Vec<String> {
        let mut tags = self
            .torrent(hash)
            .await
            .map(|t| t.tags)
            .unwrap_or_default();
        tags.sort();
        tags
    }

    pub async fn has_torrent(&self, hash: &str) -> bool {
        self.torrent(hash).await.is_some()
    }

    pub async fn calls(&self) -> Vec<StoreCall> {
        self.calls.read().await.clone()
    }

    /// Recorded calls touching `hash`.
    pub async fn calls_for(&self, hash: &str) -> Vec<StoreCall> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.hash() == Some(hash))
            .cloned()
            .collect()
    }

    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: ServiceError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every call of `operation` fail until cleared.
    pub async fn fail_operation(&self, operation: StoreOperation, error: ServiceError) {
        self.failing.write().await.insert(operation, error);
    }

    /// Make only the next call of `operation` fail.
    pub async fn fail_operation_once(&self, operation: StoreOperation, error: ServiceError) {
        self.failing_once.write().await.insert(operation, error);
    }

    pub async fn clear_failures(&self) {
        self.failing.write().await.clear();
        self.failing_once.write().await.clear();
        *self.next_error.write().await = None;
    }

    async fn begin(&self, operation: StoreOperation, call: StoreCall) -> Result<(), ServiceError> {
        self.calls.write().await.push(call);
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if let Some(err) = self.failing_once.write().await.remove(&operation) {
            return Err(err);
        }
        if let Some(err) = self.failing.read().await.get(&operation) {
            return Err(err.clone());
        }
        Ok(())
    }
}

fn not_found(hash: &str) -> ServiceError {
    ServiceError::upstream("mock", 404, format!("torrent {} not found", hash))
}

#[async_trait]
impl TorrentStore for MockTorrentStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn ping(&self) -> Result<(), ServiceError> {
        self.begin(StoreOperation::Ping, StoreCall::Ping).await
    }

    async fn list_torrents(&self) -> Result<Vec<TorrentSnapshot>, ServiceError> {
        self.begin(StoreOperation::List, StoreCall::List).await?;
        Ok(self.torrents.read().await.clone())
    }

    async fn add_tags(&self, hash: &str, tags: &[String]) -> Result<(), ServiceError> {
        self.begin(
            StoreOperation::AddTags,
            StoreCall::AddTags {
                hash: hash.to_string(),
                tags: tags.to_vec(),
            },
        )
        .await?;

        let mut torrents = self.torrents.write().await;
        let torrent = torrents
            .iter_mut()
            .find(|t| t.hash == hash)
            .ok_or_else(|| not_found(hash))?;
        for tag in tags {
            if !torrent.tags.contains(tag) {
                torrent.tags.push(tag.clone());
            }
        }
        Ok(())
    }

    async fn remove_tags(&self, hash: &str, tags: &[String]) -> Result<(), ServiceError> {
        self.begin(
            StoreOperation::RemoveTags,
            StoreCall::RemoveTags {
                hash: hash.to_string(),
                tags: tags.to_vec(),
            },
        )
        .await?;

        let mut torrents = self.torrents.write().await;
        let torrent = torrents
            .iter_mut()
            .find(|t| t.hash == hash)
            .ok_or_else(|| not_found(hash))?;
        torrent.tags.retain(|t| !tags.contains(t));
        Ok(())
    }

    async fn stop_torrent(&self, hash: &str) -> Result<(), ServiceError> {
        self.begin(
            StoreOperation::Stop,
            StoreCall::Stop {
                hash: hash.to_string(),
            },
        )
        .await?;

        let mut torrents = self.torrents.write().await;
        let torrent = torrents
            .iter_mut()
            .find(|t| t.hash == hash)
            .ok_or_else(|| not_found(hash))?;
        torrent.state = TorrentState::Stopped;
        Ok(())
    }

    async fn content_files(&self, hash: &str) -> Result<Vec<ContentFile>, ServiceError> {
        self.begin(
            StoreOperation::ContentFiles,
            StoreCall::ContentFiles {
                hash: hash.to_string(),
            },
        )
        .await?;

        Ok(self
            .files
            .read()
            .await
            .get(hash)
            .cloned()
            .unwrap_or_default())
    }

    async fn remove_torrent(&self, hash: &str, delete_files: bool) -> Result<(), ServiceError> {
        self.begin(
            StoreOperation::Remove,
            StoreCall::Remove {
                hash: hash.to_string(),
                delete_files,
            },
        )
        .await?;

        let mut torrents = self.torrents.write().await;
        let before = torrents.len();
        torrents.retain(|t| t.hash != hash);
        if torrents.len() == before {
            return Err(not_found(hash));
        }
        Ok(())
    }
}
