//! Types for the tag orchestrator.

use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ServiceError;
use crate::tags::ActionStatus;

/// Errors that abort a whole sweep.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The torrent list could not be fetched; nothing was mutated.
    #[error("failed to list torrents: {0}")]
    ListFailed(#[from] ServiceError),

    /// Another sweep holds the single-flight guard.
    #[error("a sweep is already in progress")]
    SweepInProgress,
}

/// Local filesystem failure while renaming or cleaning up content.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("cannot rename {from} to {to}: target already exists")]
    TargetExists { from: PathBuf, to: PathBuf },

    #[error("cannot rename {from}: source does not exist")]
    SourceMissing { from: PathBuf },

    #[error("failed to rename {from} to {to}: {error}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("failed to delete {path}: {error}")]
    Delete {
        path: PathBuf,
        #[source]
        error: io::Error,
    },
}

/// Subtitle tally for one find_subs run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleTally {
    /// Library items backed by one of the torrent's media files.
    pub eligible: usize,
    /// Eligible items that already had subtitles in the wanted language.
    pub already_present: usize,
    /// Eligible items for which a subtitle was downloaded now.
    pub downloaded: usize,
}

impl SubtitleTally {
    /// Status to record on the tag. Never `failed`.
    pub fn status(&self) -> ActionStatus {
        if self.already_present == self.eligible {
            ActionStatus::AlreadyPresent
        } else if self.already_present + self.downloaded == self.eligible {
            ActionStatus::Completed
        } else {
            ActionStatus::PartiallyCompleted
        }
    }
}

/// Counters collected over one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub torrents_seen: usize,
    /// Complete torrents carrying the membership marker.
    pub managed: usize,
    pub actions_dispatched: usize,
    pub tags_swapped: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
    pub torrents_removed: usize,
}

/// Current status of the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Whether the periodic loop is running.
    pub running: bool,
    /// When the last sweep finished.
    pub last_check: Option<DateTime<Utc>>,
    /// When the loop will sweep next.
    pub next_check: Option<DateTime<Utc>>,
    /// Error of the last sweep, if it failed.
    pub last_error: Option<String>,
    /// Report of the last successful sweep.
    pub last_report: Option<SweepReport>,
}
