//! Tag-driven post-processing orchestrator.
//!
//! Workflow state lives only in torrent tags (`category:action=status`).
//! Every sweep re-derives what to do from the tags, so a restart or a failed
//! tag update simply means the work is picked up again on the next sweep.

mod config;
mod rename;
mod runner;
mod subtitles;
mod types;

pub use config::OrchestratorConfig;
pub use runner::TagOrchestrator;
pub use types::{FileError, OrchestratorError, OrchestratorStatus, SubtitleTally, SweepReport};
