//! Types for the library index abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Kinds of indexed items the orchestrator cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemType {
    Movie,
    Episode,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Movie => "Movie",
            ItemType::Episode => "Episode",
        }
    }
}

/// Filter for `list_items`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFilter {
    pub item_types: Vec<ItemType>,
}

impl ItemFilter {
    /// Movies and episodes.
    pub fn videos() -> Self {
        Self {
            item_types: vec![ItemType::Movie, ItemType::Episode],
        }
    }
}

impl Default for ItemFilter {
    fn default() -> Self {
        Self::videos()
    }
}

/// An item indexed by the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryItem {
    pub id: String,
    pub name: String,
    /// Backing file as seen by the library server.
    pub path: Option<String>,
    /// Languages of the subtitle streams already attached.
    pub subtitle_languages: Vec<String>,
}

impl LibraryItem {
    /// Whether a subtitle track in `lang` exists (case-insensitive).
    pub fn has_subtitles_in(&self, lang: &str) -> bool {
        self.subtitle_languages
            .iter()
            .any(|l| l.eq_ignore_ascii_case(lang))
    }

    /// Final component of the backing path.
    ///
    /// Both separators are accepted since the library may run on another OS.
    pub fn file_name(&self) -> Option<&str> {
        self.path
            .as_deref()
            .and_then(|p| p.rsplit(['/', '\\']).next())
            .filter(|name| !name.is_empty())
    }
}

/// Result of a subtitle download request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleOutcome {
    Downloaded,
    /// The remote search returned nothing.
    NotFound,
}

/// Media library that indexes finished downloads.
#[async_trait]
pub trait LibraryIndex: Send + Sync {
    fn name(&self) -> &str;

    /// Ask the library to rescan its folders.
    async fn refresh(&self) -> Result<(), ServiceError>;

    async fn list_items(&self, filter: &ItemFilter) -> Result<Vec<LibraryItem>, ServiceError>;

    /// Search and download the first remote subtitle for an item.
    async fn download_subtitles(
        &self,
        item_id: &str,
        language: &str,
    ) -> Result<SubtitleOutcome, ServiceError>;
}
