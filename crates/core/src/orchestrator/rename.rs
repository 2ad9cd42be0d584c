//! On-disk renaming of a torrent's content into library names.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use crate::normalizer::{beautify, is_media_file, media_file_name};
use crate::torrent_store::ContentFile;

use super::types::FileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RenameResult {
    Renamed,
    /// Source and target are the same path.
    Unchanged,
    /// Only the target exists, from an earlier run.
    AlreadyRenamed,
}

/// What a rename pass did.
#[derive(Debug, Default)]
pub(crate) struct RenameReport {
    pub renamed: usize,
    pub skipped: usize,
    pub deleted: usize,
    pub failures: Vec<FileError>,
}

impl RenameReport {
    fn record(&mut self, result: Result<RenameResult, FileError>) {
        match result {
            Ok(RenameResult::Renamed) => self.renamed += 1,
            Ok(RenameResult::Unchanged | RenameResult::AlreadyRenamed) => self.skipped += 1,
            Err(e) => self.failures.push(e),
        }
    }
}

/// Delete partial files, rename complete media files and then the shared
/// top-level directory.
///
/// `files` are relative to `save_path`, as reported by the torrent store.
pub(crate) async fn rename_content(save_path: &Path, files: &[ContentFile]) -> RenameReport {
    let mut report = RenameReport::default();
    let top_dir = shared_top_dir(files);
    let renamed_dir = match top_dir {
        Some(dir) => already_renamed_dir(save_path, dir).await,
        None => None,
    };
    let locate = |relative: &str| -> PathBuf {
        match (top_dir, renamed_dir.as_deref()) {
            (Some(dir), Some(renamed)) => match relative.strip_prefix(dir) {
                Some(rest) => save_path.join(renamed).join(rest.trim_start_matches('/')),
                None => save_path.join(relative),
            },
            _ => save_path.join(relative),
        }
    };

    for file in files.iter().filter(|f| !f.is_complete()) {
        let path = locate(&file.path);
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Deleted partial file");
                report.deleted += 1;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                let err = FileError::Delete { path, error: e };
                warn!(error = %err, "Failed to delete partial file");
            }
        }
    }

    for file in files
        .iter()
        .filter(|f| f.is_complete() && is_media_file(&f.path))
    {
        let from = locate(&file.path);
        let to = from.with_file_name(media_file_name(file.file_name()));
        report.record(rename_path(&from, &to).await);
    }

    if let Some(dir) = top_dir {
        let pretty = beautify(dir);
        if !pretty.is_empty() {
            report.record(rename_path(&save_path.join(dir), &save_path.join(&pretty)).await);
        }
    }

    for failure in &report.failures {
        warn!(error = %failure, "Rename failed");
    }
    info!(
        renamed = report.renamed,
        skipped = report.skipped,
        deleted = report.deleted,
        failed = report.failures.len(),
        "Rename pass finished"
    );

    report
}

/// Rename `from` to `to` without overwriting anything.
pub(crate) async fn rename_path(from: &Path, to: &Path) -> Result<RenameResult, FileError> {
    if from == to {
        return Ok(RenameResult::Unchanged);
    }

    let source_exists = fs::try_exists(from).await.unwrap_or(false);
    let target_exists = fs::try_exists(to).await.unwrap_or(false);

    match (source_exists, target_exists) {
        (false, true) => Ok(RenameResult::AlreadyRenamed),
        (true, true) => Err(FileError::TargetExists {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        }),
        (false, false) => Err(FileError::SourceMissing {
            from: from.to_path_buf(),
        }),
        (true, false) => {
            fs::rename(from, to).await.map_err(|error| FileError::Rename {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
                error,
            })?;
            debug!(from = %from.display(), to = %to.display(), "Renamed");
            Ok(RenameResult::Renamed)
        }
    }
}

/// First path component shared by every file, when all files live under one.
fn shared_top_dir(files: &[ContentFile]) -> Option<&str> {
    let mut shared: Option<&str> = None;

    for file in files {
        let (first, rest) = file.path.split_once('/')?;
        if first.is_empty() || rest.is_empty() {
            return None;
        }
        match shared {
            None => shared = Some(first),
            Some(dir) if dir == first => {}
            Some(_) => return None,
        }
    }

    shared
}

/// The beautified directory name, if a previous run already renamed `dir`.
async fn already_renamed_dir(save_path: &Path, dir: &str) -> Option<String> {
    let pretty = beautify(dir);
    if pretty.is_empty() || pretty == dir {
        return None;
    }

    let original = fs::try_exists(save_path.join(dir)).await.unwrap_or(false);
    let renamed = fs::try_exists(save_path.join(&pretty)).await.unwrap_or(false);
    if !original && renamed {
        Some(pretty)
    } else {
        None
    }
}
