//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external service traits,
//! allowing sweeps to be tested end to end without real infrastructure.
//!
//! # Example
//!
//! ```rust,ignore
//! use tagrunner_core::testing::{fixtures, MockLibraryIndex, MockNotifier, MockTorrentStore};
//!
//! let store = MockTorrentStore::new();
//! store.add_torrent(fixtures::torrent("abc", "The.Matrix.1999.1080p", 1.0, &["tagrunner"])).await;
//!
//! // Use in TagOrchestrator::new(...)
//! ```

mod mock_library;
mod mock_notifier;
mod mock_torrent_store;

pub use mock_library::{MockLibraryIndex, RecordedSubtitleRequest};
pub use mock_notifier::MockNotifier;
pub use mock_torrent_store::{MockTorrentStore, StoreCall, StoreOperation};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::library::LibraryItem;
    use crate::torrent_store::{TorrentSnapshot, TorrentState};

    /// Create a test torrent with reasonable defaults.
    pub fn torrent(hash: &str, name: &str, progress: f64, tags: &[&str]) -> TorrentSnapshot {
        TorrentSnapshot {
            hash: hash.to_string(),
            name: name.to_string(),
            state: if progress >= 1.0 {
                TorrentState::Seeding
            } else {
                TorrentState::Downloading
            },
            category: Some("jellyfin".to_string()),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            progress,
            size_bytes: 1024 * 1024 * 100, // 100 MB
            save_path: "/mock/downloads".to_string(),
            content_path: None,
            added_at: None,
            completed_at: None,
        }
    }

    /// Create a library item backed by `path`.
    pub fn library_item(id: &str, path: &str, subtitle_languages: &[&str]) -> LibraryItem {
        LibraryItem {
            id: id.to_string(),
            name: format!("Item {}", id),
            path: Some(path.to_string()),
            subtitle_languages: subtitle_languages.iter().map(|l| l.to_string()).collect(),
        }
    }
}
