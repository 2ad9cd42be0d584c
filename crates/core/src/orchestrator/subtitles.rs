//! Subtitle lookup for a torrent's library items.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::library::{LibraryIndex, LibraryItem, SubtitleOutcome};
use crate::normalizer::{is_media_file, media_file_name};
use crate::torrent_store::ContentFile;

use super::types::SubtitleTally;

/// File names a library item may be backed by: the original and the
/// renamed name of every complete media file.
///
/// The store keeps reporting original names after an on-disk rename, so
/// both are accepted.
pub(crate) fn candidate_file_names(files: &[ContentFile]) -> HashSet<String> {
    let mut names = HashSet::new();
    for file in files
        .iter()
        .filter(|f| f.is_complete() && is_media_file(&f.path))
    {
        let original = file.file_name();
        names.insert(media_file_name(original));
        names.insert(original.to_string());
    }
    names
}

/// Library items backed by one of `names`.
pub(crate) fn eligible_items<'a>(
    items: &'a [LibraryItem],
    names: &HashSet<String>,
) -> Vec<&'a LibraryItem> {
    items
        .iter()
        .filter(|item| item.file_name().is_some_and(|name| names.contains(name)))
        .collect()
}

/// Request subtitles for every eligible item lacking `language`.
pub(crate) async fn fetch_missing(
    library: &dyn LibraryIndex,
    items: &[&LibraryItem],
    language: &str,
) -> SubtitleTally {
    let mut tally = SubtitleTally {
        eligible: items.len(),
        ..Default::default()
    };

    for item in items {
        if item.has_subtitles_in(language) {
            debug!(item = %item.name, language, "Subtitles already present");
            tally.already_present += 1;
            continue;
        }

        match library.download_subtitles(&item.id, language).await {
            Ok(SubtitleOutcome::Downloaded) => {
                info!(item = %item.name, language, "Subtitles downloaded");
                tally.downloaded += 1;
            }
            Ok(SubtitleOutcome::NotFound) => {
                info!(item = %item.name, language, "No subtitles found");
            }
            Err(e) => {
                warn!(item = %item.name, language, error = %e, "Subtitle download failed");
            }
        }
    }

    tally
}
