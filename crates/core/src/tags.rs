//! Tag grammar for persisted workflow state.
//!
//! A scheduled action is stored on the torrent as `category:action=status`,
//! e.g. `jellyfin:rename=pending`. Anything else (including the bare
//! membership marker) is not an action and is ignored by the decoder.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category of library actions.
pub const LIBRARY_CATEGORY: &str = "jellyfin";
/// Category of notification actions.
pub const NOTIFY_CATEGORY: &str = "slack";

pub const RENAME_ACTION: &str = "rename";
pub const FIND_SUBS_ACTION: &str = "find_subs";
pub const NOTIFY_ACTION: &str = "notify";

/// Status of a scheduled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// Waiting to run.
    Pending,
    /// First notification sent, waiting for the download to complete.
    Initial,
    Completed,
    Failed,
    PartiallyCompleted,
    /// Nothing to do: the outcome already existed (e.g. subtitles).
    AlreadyPresent,
}

impl ActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Pending => "pending",
            ActionStatus::Initial => "initial",
            ActionStatus::Completed => "completed",
            ActionStatus::Failed => "failed",
            ActionStatus::PartiallyCompleted => "partially_completed",
            ActionStatus::AlreadyPresent => "already_present",
        }
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ActionStatus::Pending),
            "initial" => Ok(ActionStatus::Initial),
            "completed" => Ok(ActionStatus::Completed),
            "failed" => Ok(ActionStatus::Failed),
            "partially_completed" => Ok(ActionStatus::PartiallyCompleted),
            "already_present" => Ok(ActionStatus::AlreadyPresent),
            _ => Err(()),
        }
    }
}

/// The actions the orchestrator knows how to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionKind {
    Rename,
    FindSubs,
    Notify,
    Unknown,
}

impl ActionKind {
    /// Dispatch order within one torrent (lower runs first).
    ///
    /// Renames must land before subtitle lookup so the library sees the
    /// final names.
    pub fn priority(&self) -> u8 {
        match self {
            ActionKind::Notify => 0,
            ActionKind::Rename => 1,
            ActionKind::FindSubs => 2,
            ActionKind::Unknown => 3,
        }
    }

    /// Label used for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Rename => "rename",
            ActionKind::FindSubs => "find_subs",
            ActionKind::Notify => "notify",
            ActionKind::Unknown => "unknown",
        }
    }

    /// Whether this is a library action (rename, subtitles).
    pub fn is_library(&self) -> bool {
        matches!(self, ActionKind::Rename | ActionKind::FindSubs)
    }
}

/// A `(category, action, status)` triple decoded from a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledAction {
    pub category: String,
    pub name: String,
    pub status: ActionStatus,
}

impl ScheduledAction {
    pub fn new(category: impl Into<String>, name: impl Into<String>, status: ActionStatus) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            status,
        }
    }

    /// Decode a tag, returning `None` for markers and malformed tags.
    pub fn parse(tag: &str) -> Option<Self> {
        let (category, rest) = tag.trim().split_once(':')?;
        let (name, status) = rest.split_once('=')?;

        if category.is_empty() || name.is_empty() {
            return None;
        }

        let status = status.parse().ok()?;
        Some(Self::new(category, name, status))
    }

    /// Encode back into tag form.
    pub fn tag(&self) -> String {
        format!("{}:{}={}", self.category, self.name, self.status)
    }

    /// Same action with a different status.
    pub fn with_status(&self, status: ActionStatus) -> Self {
        Self {
            category: self.category.clone(),
            name: self.name.clone(),
            status,
        }
    }

    pub fn kind(&self) -> ActionKind {
        match (self.category.as_str(), self.name.as_str()) {
            (LIBRARY_CATEGORY, RENAME_ACTION) => ActionKind::Rename,
            (LIBRARY_CATEGORY, FIND_SUBS_ACTION) => ActionKind::FindSubs,
            (NOTIFY_CATEGORY, NOTIFY_ACTION) => ActionKind::Notify,
            _ => ActionKind::Unknown,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ActionStatus::Pending
    }
}

impl fmt::Display for ScheduledAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}={}", self.category, self.name, self.status)
    }
}

/// Decode every scheduled action present in a tag set.
pub fn decode_actions<S: AsRef<str>>(tags: &[S]) -> Vec<ScheduledAction> {
    tags.iter()
        .filter_map(|tag| ScheduledAction::parse(tag.as_ref()))
        .collect()
}
