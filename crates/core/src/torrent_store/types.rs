//! Types for the torrent store abstraction.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Coarse torrent state as reported by the download client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorrentState {
    Downloading,
    Seeding,
    Stopped,
    Checking,
    Queued,
    Stalled,
    Error,
    Unknown,
}

/// Point-in-time view of a torrent, as returned by one list call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentSnapshot {
    /// Info hash (lowercase).
    pub hash: String,
    pub name: String,
    pub state: TorrentState,
    pub category: Option<String>,
    /// Tags, split and trimmed.
    pub tags: Vec<String>,
    /// Download progress (0.0 - 1.0).
    pub progress: f64,
    pub size_bytes: u64,
    pub save_path: String,
    /// Top-level file or directory of the content, when known.
    pub content_path: Option<String>,
    pub added_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TorrentSnapshot {
    /// Progress as a percentage.
    ///
    /// Values at or above 97% are floored to two decimals so an almost-done
    /// torrent never reports 100.
    pub fn progress_percentage(&self) -> f64 {
        progress_to_percentage(self.progress)
    }

    pub fn is_complete(&self) -> bool {
        self.progress_percentage() >= 100.0
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Convert a 0.0 - 1.0 progress value to a percentage with two decimals.
pub fn progress_to_percentage(progress: f64) -> f64 {
    if progress >= 1.0 {
        return 100.0;
    }
    if progress <= 0.0 {
        return 0.0;
    }

    let percent = progress * 100.0;
    if progress >= 0.97 {
        (percent * 100.0).floor() / 100.0
    } else {
        (percent * 100.0).round() / 100.0
    }
}

/// A file belonging to a torrent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentFile {
    /// Path relative to the torrent's save path.
    pub path: String,
    pub progress: f64,
}

impl ContentFile {
    pub fn new(path: impl Into<String>, progress: f64) -> Self {
        Self {
            path: path.into(),
            progress,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= 1.0
    }

    /// Final path component.
    pub fn file_name(&self) -> &str {
        Path::new(&self.path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.path)
    }
}

/// Download client holding the torrents and their tags.
///
/// The tag set is the only workflow state; every mutation the orchestrator
/// makes goes through here.
#[async_trait]
pub trait TorrentStore: Send + Sync {
    /// Store name for logging.
    fn name(&self) -> &str;

    /// Cheap reachability probe.
    async fn ping(&self) -> Result<(), ServiceError>;

    async fn list_torrents(&self) -> Result<Vec<TorrentSnapshot>, ServiceError>;

    async fn add_tags(&self, hash: &str, tags: &[String]) -> Result<(), ServiceError>;

    async fn remove_tags(&self, hash: &str, tags: &[String]) -> Result<(), ServiceError>;

    /// Stop (pause) a torrent. Stopping a stopped torrent is a no-op.
    async fn stop_torrent(&self, hash: &str) -> Result<(), ServiceError>;

    async fn content_files(&self, hash: &str) -> Result<Vec<ContentFile>, ServiceError>;

    /// Remove the torrent record, optionally deleting its data.
    async fn remove_torrent(&self, hash: &str, delete_files: bool) -> Result<(), ServiceError>;
}
