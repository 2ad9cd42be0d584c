//! Library index abstraction (Jellyfin).

mod jellyfin;
mod types;

pub use jellyfin::JellyfinClient;
pub use types::*;
