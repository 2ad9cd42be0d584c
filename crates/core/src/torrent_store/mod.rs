//! Torrent store abstraction.
//!
//! The `TorrentStore` trait covers the download-client operations the
//! orchestrator needs: listing, tag mutation, stopping, file listing and
//! removal. qBittorrent is the only backend.

mod qbittorrent;
mod types;

pub use qbittorrent::QBittorrentClient;
pub use types::*;
