//! Tag orchestrator implementation.
//!
//! One sweep fetches the torrent list once and walks it sequentially:
//! notifications first, then pending library actions for complete managed
//! torrents, then removal once nothing is left to do.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::library::{ItemFilter, LibraryIndex};
use crate::metrics;
use crate::notifier::{NotificationEvent, Notifier, TorrentNotice};
use crate::tags::{decode_actions, ActionKind, ActionStatus, ScheduledAction};
use crate::torrent_store::{TorrentSnapshot, TorrentStore};

use super::config::OrchestratorConfig;
use super::rename::rename_content;
use super::subtitles::{candidate_file_names, eligible_items, fetch_missing};
use super::types::{OrchestratorError, OrchestratorStatus, SweepReport};

const DEFAULT_SUBTITLE_LANGUAGE: &str = "eng";

/// The tag orchestrator - turns pending tags into side effects.
pub struct TagOrchestrator {
    config: OrchestratorConfig,
    subtitle_language: String,
    store: Arc<dyn TorrentStore>,
    library: Arc<dyn LibraryIndex>,
    notifier: Option<Arc<dyn Notifier>>,

    // Runtime state
    running: Arc<AtomicBool>,
    status: Arc<RwLock<OrchestratorStatus>>,
    sweep_guard: Mutex<()>,
    shutdown_tx: broadcast::Sender<()>,
}

impl TagOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: OrchestratorConfig,
        store: Arc<dyn TorrentStore>,
        library: Arc<dyn LibraryIndex>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            subtitle_language: DEFAULT_SUBTITLE_LANGUAGE.to_string(),
            store,
            library,
            notifier,
            running: Arc::new(AtomicBool::new(false)),
            status: Arc::new(RwLock::new(OrchestratorStatus::default())),
            sweep_guard: Mutex::new(()),
            shutdown_tx,
        }
    }

    /// Language requested for subtitle downloads.
    pub fn with_subtitle_language(mut self, language: impl Into<String>) -> Self {
        self.subtitle_language = language.into();
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run the first sweep, then spawn the periodic loop.
    pub async fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Orchestrator already running");
            return;
        }

        info!(
            interval_secs = self.config.interval_secs,
            managed_tag = %self.config.managed_tag,
            "Starting tag orchestrator"
        );
        self.status.write().await.running = true;

        let first_delay = self.sweep_and_schedule().await;
        self.spawn_sweep_loop(first_delay);

        info!("Tag orchestrator started");
    }

    /// Stop the orchestrator. A sweep in progress runs to completion.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Orchestrator not running");
            return;
        }

        info!("Stopping tag orchestrator");
        let _ = self.shutdown_tx.send(());

        let mut status = self.status.write().await;
        status.running = false;
        status.next_check = None;
    }

    /// Get current orchestrator status.
    pub async fn status(&self) -> OrchestratorStatus {
        self.status.read().await.clone()
    }

    fn spawn_sweep_loop(self: &Arc<Self>, first_delay: Duration) {
        let this = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Sweep loop started");
            let mut delay = first_delay;
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Sweep loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(delay) => {
                        if !this.running.load(Ordering::Relaxed) {
                            break;
                        }
                        delay = this.sweep_and_schedule().await;
                    }
                }
            }
            info!("Sweep loop stopped");
        });
    }

    /// Sweep once and return the delay before the next sweep.
    async fn sweep_and_schedule(&self) -> Duration {
        let delay = match self.run_sweep().await {
            Err(OrchestratorError::ListFailed(_)) => {
                Duration::from_secs(self.config.retry_interval_secs)
            }
            _ => Duration::from_secs(self.config.interval_secs),
        };

        if self.running.load(Ordering::Relaxed) {
            let next = chrono::Duration::from_std(delay)
                .ok()
                .map(|d| Utc::now() + d);
            self.status.write().await.next_check = next;
        }

        delay
    }

    /// Run one sweep over all torrents.
    ///
    /// Rejected with `SweepInProgress` if another sweep is running.
    pub async fn run_sweep(&self) -> Result<SweepReport, OrchestratorError> {
        let _guard = self
            .sweep_guard
            .try_lock()
            .map_err(|_| OrchestratorError::SweepInProgress)?;

        let started = Instant::now();
        let result = self.sweep().await;
        let elapsed = started.elapsed().as_secs_f64();

        let label = if result.is_ok() { "ok" } else { "list_failed" };
        metrics::SWEEPS.with_label_values(&[label]).inc();
        metrics::SWEEP_DURATION
            .with_label_values(&[label])
            .observe(elapsed);

        let mut status = self.status.write().await;
        status.last_check = Some(Utc::now());
        match &result {
            Ok(report) => {
                status.last_error = None;
                status.last_report = Some(report.clone());
            }
            Err(e) => status.last_error = Some(e.to_string()),
        }

        result
    }

    async fn sweep(&self) -> Result<SweepReport, OrchestratorError> {
        let torrents = self.store.list_torrents().await.map_err(|e| {
            error!(store = self.store.name(), error = %e, "Failed to list torrents, skipping sweep");
            OrchestratorError::ListFailed(e)
        })?;

        let mut report = SweepReport::default();
        for torrent in &torrents {
            self.process_torrent(torrent, &mut report).await;
        }

        debug!(
            torrents = report.torrents_seen,
            managed = report.managed,
            dispatched = report.actions_dispatched,
            removed = report.torrents_removed,
            "Sweep finished"
        );
        Ok(report)
    }

    async fn process_torrent(&self, torrent: &TorrentSnapshot, report: &mut SweepReport) {
        report.torrents_seen += 1;

        let actions = decode_actions(&torrent.tags);
        let complete = torrent.is_complete();

        if let Some(notify) = actions.iter().find(|a| a.kind() == ActionKind::Notify) {
            self.handle_notify(torrent, notify, complete, report).await;
        }

        if !complete || !torrent.has_tag(&self.config.managed_tag) {
            return;
        }
        report.managed += 1;

        let mut pending: Vec<&ScheduledAction> = actions
            .iter()
            .filter(|a| a.is_pending() && a.kind() != ActionKind::Notify)
            .collect();
        pending.sort_by_key(|a| a.kind().priority());

        let found_pending = !pending.is_empty();
        let mut library_failed = actions
            .iter()
            .any(|a| a.kind().is_library() && a.status == ActionStatus::Failed);

        for action in pending {
            self.stop_torrent(torrent).await;
            report.actions_dispatched += 1;

            let outcome = match action.kind() {
                ActionKind::Rename => self.run_rename(torrent).await,
                ActionKind::FindSubs => self.run_find_subs(torrent).await,
                ActionKind::Notify | ActionKind::Unknown => {
                    warn!(
                        hash = %torrent.hash,
                        tag = %action,
                        "Unknown action, leaving it pending"
                    );
                    metrics::ACTIONS
                        .with_label_values(&[ActionKind::Unknown.as_str(), "ignored"])
                        .inc();
                    continue;
                }
            };

            let Some(status) = outcome else {
                metrics::ACTIONS
                    .with_label_values(&[action.kind().as_str(), "deferred"])
                    .inc();
                continue;
            };

            metrics::ACTIONS
                .with_label_values(&[action.kind().as_str(), status.as_str()])
                .inc();
            if status == ActionStatus::Failed {
                library_failed = true;
            }
            self.swap_tag(torrent, action, status, report).await;
        }

        if found_pending {
            return;
        }
        if library_failed {
            debug!(hash = %torrent.hash, "Failed library action, keeping torrent");
            return;
        }

        self.remove_torrent(torrent, report).await;
    }

    /// Send the notification matching the torrent's progress.
    async fn handle_notify(
        &self,
        torrent: &TorrentSnapshot,
        action: &ScheduledAction,
        complete: bool,
        report: &mut SweepReport,
    ) {
        let Some(notifier) = &self.notifier else {
            return;
        };

        let event = match (action.status, complete) {
            (ActionStatus::Pending, false) => NotificationEvent::Started,
            (ActionStatus::Pending, true) | (ActionStatus::Initial, true) => {
                NotificationEvent::Completed
            }
            _ => return,
        };

        let notice = TorrentNotice::from(torrent);
        let status = match notifier.send(event, &notice).await {
            Ok(()) => {
                info!(hash = %torrent.hash, name = %torrent.name, event = %event, "Notification sent");
                metrics::NOTIFICATIONS
                    .with_label_values(&[event.as_str(), "success"])
                    .inc();
                report.notifications_sent += 1;
                match event {
                    NotificationEvent::Started => ActionStatus::Initial,
                    NotificationEvent::Completed => ActionStatus::Completed,
                }
            }
            Err(e) => {
                warn!(
                    hash = %torrent.hash,
                    event = %event,
                    notifier = notifier.name(),
                    error = %e,
                    "Notification failed"
                );
                metrics::NOTIFICATIONS
                    .with_label_values(&[event.as_str(), "failure"])
                    .inc();
                report.notifications_failed += 1;
                ActionStatus::Failed
            }
        };

        self.swap_tag(torrent, action, status, report).await;
    }

    /// Returns `None` when the action must be retried next sweep.
    async fn run_rename(&self, torrent: &TorrentSnapshot) -> Option<ActionStatus> {
        let files = match self.store.content_files(&torrent.hash).await {
            Ok(files) => files,
            Err(e) => {
                warn!(hash = %torrent.hash, error = %e, "Failed to list content files, deferring rename");
                return None;
            }
        };

        info!(hash = %torrent.hash, name = %torrent.name, files = files.len(), "Renaming content");
        let result = rename_content(Path::new(&torrent.save_path), &files).await;

        self.refresh_library().await;
        self.settle().await;

        if result.failures.is_empty() {
            Some(ActionStatus::Completed)
        } else {
            Some(ActionStatus::Failed)
        }
    }

    /// Returns `None` when the action must be retried next sweep.
    async fn run_find_subs(&self, torrent: &TorrentSnapshot) -> Option<ActionStatus> {
        self.refresh_library().await;
        self.settle().await;

        let files = match self.store.content_files(&torrent.hash).await {
            Ok(files) => files,
            Err(e) => {
                warn!(hash = %torrent.hash, error = %e, "Failed to list content files, deferring subtitles");
                return None;
            }
        };

        let items = match self.library.list_items(&ItemFilter::videos()).await {
            Ok(items) => items,
            Err(e) => {
                warn!(hash = %torrent.hash, error = %e, "Failed to list library items, deferring subtitles");
                return None;
            }
        };

        let names = candidate_file_names(&files);
        let eligible = eligible_items(&items, &names);
        let tally = fetch_missing(self.library.as_ref(), &eligible, &self.subtitle_language).await;

        info!(
            hash = %torrent.hash,
            eligible = tally.eligible,
            already_present = tally.already_present,
            downloaded = tally.downloaded,
            "Subtitle lookup finished"
        );
        Some(tally.status())
    }

    /// Replace an action's tag with its new status.
    ///
    /// The new tag is only added once the old one is gone. If adding fails
    /// the old tag is put back so the action is seen again next sweep.
    async fn swap_tag(
        &self,
        torrent: &TorrentSnapshot,
        action: &ScheduledAction,
        status: ActionStatus,
        report: &mut SweepReport,
    ) {
        let old_tag = action.tag();
        let new_tag = action.with_status(status).tag();

        if let Err(e) = self
            .store
            .remove_tags(&torrent.hash, std::slice::from_ref(&old_tag))
            .await
        {
            warn!(hash = %torrent.hash, tag = %old_tag, error = %e, "Failed to remove tag");
            return;
        }

        if let Err(e) = self
            .store
            .add_tags(&torrent.hash, std::slice::from_ref(&new_tag))
            .await
        {
            warn!(hash = %torrent.hash, tag = %new_tag, error = %e, "Failed to add tag, restoring previous tag");
            match self
                .store
                .add_tags(&torrent.hash, std::slice::from_ref(&old_tag))
                .await
            {
                Ok(()) => info!(hash = %torrent.hash, tag = %old_tag, "Previous tag restored"),
                Err(e) => error!(
                    hash = %torrent.hash,
                    tag = %old_tag,
                    error = %e,
                    "Failed to restore previous tag, action state lost"
                ),
            }
            return;
        }

        debug!(hash = %torrent.hash, from = %old_tag, to = %new_tag, "Tag updated");
        report.tags_swapped += 1;
    }

    async fn stop_torrent(&self, torrent: &TorrentSnapshot) {
        if let Err(e) = self.store.stop_torrent(&torrent.hash).await {
            warn!(hash = %torrent.hash, error = %e, "Failed to stop torrent");
        }
    }

    async fn remove_torrent(&self, torrent: &TorrentSnapshot, report: &mut SweepReport) {
        if let Err(e) = self.store.remove_torrent(&torrent.hash, false).await {
            warn!(hash = %torrent.hash, error = %e, "Failed to remove torrent");
            return;
        }

        info!(hash = %torrent.hash, name = %torrent.name, "Removed processed torrent");
        metrics::TORRENTS_REMOVED.inc();
        report.torrents_removed += 1;

        if self
            .config
            .is_library_category(torrent.category.as_deref())
        {
            self.refresh_library().await;
        }
    }

    async fn refresh_library(&self) {
        if let Err(e) = self.library.refresh().await {
            warn!(library = self.library.name(), error = %e, "Library refresh failed");
        }
    }

    async fn settle(&self) {
        if self.config.refresh_settle_secs > 0 {
            tokio::time::sleep(Duration::from_secs(self.config.refresh_settle_secs)).await;
        }
    }
}
