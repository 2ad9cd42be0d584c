//! Sweep lifecycle integration tests.
//!
//! These tests drive the orchestrator against mock services and a real
//! temporary directory:
//! pending -> {initial ->} completed | failed | partially_completed | already_present

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use tagrunner_core::{
    library::{LibraryIndex, SubtitleOutcome},
    notifier::{NotificationEvent, Notifier},
    testing::{
        fixtures, MockLibraryIndex, MockNotifier, MockTorrentStore, StoreCall, StoreOperation,
    },
    torrent_store::{ContentFile, TorrentStore},
    OrchestratorConfig, OrchestratorError, ServiceError, TagOrchestrator,
};

const MARKER: &str = "tagrunner";

/// Test helper to create all dependencies for orchestrator testing.
struct TestHarness {
    store: Arc<MockTorrentStore>,
    library: Arc<MockLibraryIndex>,
    notifier: Arc<MockNotifier>,
    temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        Self {
            store: Arc::new(MockTorrentStore::new()),
            library: Arc::new(MockLibraryIndex::new()),
            notifier: Arc::new(MockNotifier::new()),
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    fn config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            interval_secs: 60,
            retry_interval_secs: 60,
            refresh_settle_secs: 0,
            ..Default::default()
        }
    }

    fn orchestrator(&self) -> TagOrchestrator {
        self.orchestrator_with(self.config(), true)
    }

    fn orchestrator_with(&self, config: OrchestratorConfig, with_notifier: bool) -> TagOrchestrator {
        let notifier = if with_notifier {
            Some(Arc::clone(&self.notifier) as Arc<dyn Notifier>)
        } else {
            None
        };
        TagOrchestrator::new(
            config,
            Arc::clone(&self.store) as Arc<dyn TorrentStore>,
            Arc::clone(&self.library) as Arc<dyn LibraryIndex>,
            notifier,
        )
    }

    fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Add a torrent saved under the temp dir.
    async fn add_torrent(&self, hash: &str, name: &str, progress: f64, tags: &[&str]) {
        let mut torrent = fixtures::torrent(hash, name, progress, tags);
        torrent.save_path = self.root().display().to_string();
        self.store.add_torrent(torrent).await;
    }

    /// Create files on disk and register them with the store.
    async fn add_files(&self, hash: &str, files: &[(&str, f64)]) {
        for (path, _) in files {
            let full = self.root().join(path);
            if let Some(parent) = full.parent() {
                tokio::fs::create_dir_all(parent).await.unwrap();
            }
            tokio::fs::write(&full, b"data").await.unwrap();
        }
        self.store
            .set_files(
                hash,
                files
                    .iter()
                    .map(|(path, progress)| ContentFile::new(*path, *progress))
                    .collect(),
            )
            .await;
    }

    fn exists(&self, relative: &str) -> bool {
        self.root().join(relative).exists()
    }
}

fn tags(list: &[&str]) -> Vec<String> {
    let mut tags: Vec<String> = list.iter().map(|t| t.to_string()).collect();
    tags.sort();
    tags
}

// =============================================================================
// Notifications
// =============================================================================

#[tokio::test]
async fn test_incomplete_torrent_sends_started_notification() {
    let harness = TestHarness::new();
    harness
        .add_torrent("h1", "The.Matrix.1999.1080p", 0.4, &[MARKER, "slack:notify=pending"])
        .await;

    let report = harness.orchestrator().run_sweep().await.unwrap();

    let sent = harness.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, NotificationEvent::Started);
    assert_eq!(sent[0].1.name, "The.Matrix.1999.1080p");
    assert_eq!(
        harness.store.tags("h1").await,
        tags(&[MARKER, "slack:notify=initial"])
    );
    assert_eq!(report.notifications_sent, 1);
    assert_eq!(report.tags_swapped, 1);
}

#[tokio::test]
async fn test_complete_torrent_sends_completed_notification() {
    let harness = TestHarness::new();
    harness
        .add_torrent("h1", "Movie", 1.0, &["slack:notify=initial"])
        .await;

    harness.orchestrator().run_sweep().await.unwrap();

    let sent = harness.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, NotificationEvent::Completed);
    assert_eq!(
        harness.store.tags("h1").await,
        tags(&["slack:notify=completed"])
    );
}

#[tokio::test]
async fn test_pending_notify_on_complete_torrent_goes_straight_to_completed() {
    let harness = TestHarness::new();
    harness
        .add_torrent("h1", "Movie", 1.0, &["slack:notify=pending"])
        .await;

    harness.orchestrator().run_sweep().await.unwrap();

    let sent = harness.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, NotificationEvent::Completed);
    assert_eq!(
        harness.store.tags("h1").await,
        tags(&["slack:notify=completed"])
    );
}

#[tokio::test]
async fn test_notification_failure_marks_failed() {
    let harness = TestHarness::new();
    harness
        .notifier
        .set_error(Some(ServiceError::upstream("slack", 500, "oops".to_string())))
        .await;
    harness
        .add_torrent("h1", "Movie", 0.1, &["slack:notify=pending"])
        .await;

    let report = harness.orchestrator().run_sweep().await.unwrap();

    assert_eq!(report.notifications_failed, 1);
    assert_eq!(harness.store.tags("h1").await, tags(&["slack:notify=failed"]));
}

#[tokio::test]
async fn test_notify_tags_untouched_without_notifier() {
    let harness = TestHarness::new();
    harness
        .add_torrent("h1", "Movie", 0.5, &["slack:notify=pending"])
        .await;

    let orchestrator = harness.orchestrator_with(harness.config(), false);
    orchestrator.run_sweep().await.unwrap();

    assert_eq!(harness.store.tags("h1").await, tags(&["slack:notify=pending"]));
    assert!(harness.store.calls_for("h1").await.is_empty());
}

// =============================================================================
// Gating
// =============================================================================

#[tokio::test]
async fn test_incomplete_torrent_never_dispatches_library_actions() {
    let harness = TestHarness::new();
    harness
        .add_torrent(
            "h1",
            "Movie.2010",
            0.99999,
            &[MARKER, "jellyfin:rename=pending", "jellyfin:find_subs=pending"],
        )
        .await;
    harness.add_files("h1", &[("Movie.2010.mkv", 1.0)]).await;

    let report = harness.orchestrator().run_sweep().await.unwrap();

    assert_eq!(report.actions_dispatched, 0);
    assert!(harness.store.calls_for("h1").await.is_empty());
    assert!(harness.exists("Movie.2010.mkv"));
    assert_eq!(harness.library.refresh_count().await, 0);
}

#[tokio::test]
async fn test_actions_dispatch_once_download_completes() {
    let harness = TestHarness::new();
    harness
        .add_torrent("h1", "Movie.2010", 0.5, &[MARKER, "jellyfin:rename=pending"])
        .await;
    harness.add_files("h1", &[("Movie.2010.mkv", 1.0)]).await;
    let orchestrator = harness.orchestrator();

    orchestrator.run_sweep().await.unwrap();
    assert!(harness.store.calls_for("h1").await.is_empty());

    harness.store.set_progress("h1", 1.0).await;
    harness.store.clear_calls().await;
    let report = orchestrator.run_sweep().await.unwrap();

    assert_eq!(report.actions_dispatched, 1);
    assert_eq!(
        harness.store.calls_for("h1").await.first(),
        Some(&StoreCall::Stop {
            hash: "h1".to_string()
        })
    );
    assert_eq!(
        harness.store.tags("h1").await,
        tags(&[MARKER, "jellyfin:rename=completed"])
    );
}

#[tokio::test]
async fn test_unmanaged_complete_torrent_is_left_alone() {
    let harness = TestHarness::new();
    harness
        .add_torrent("h1", "Movie.2010", 1.0, &["jellyfin:rename=pending"])
        .await;
    harness.add_files("h1", &[("Movie.2010.mkv", 1.0)]).await;

    let report = harness.orchestrator().run_sweep().await.unwrap();

    assert_eq!(report.torrents_seen, 1);
    assert_eq!(report.managed, 0);
    let calls = harness.store.calls_for("h1").await;
    assert!(calls.iter().all(|c| !c.is_mutation()));
    assert!(harness.store.has_torrent("h1").await);
    assert!(harness.exists("Movie.2010.mkv"));
}

// =============================================================================
// Rename
// =============================================================================

#[tokio::test]
async fn test_rename_then_remove_on_next_sweep() {
    let harness = TestHarness::new();
    harness
        .add_torrent(
            "h1",
            "Show.Name.S02.1080p",
            1.0,
            &[MARKER, "jellyfin:rename=pending"],
        )
        .await;
    harness
        .add_files(
            "h1",
            &[
                ("Show.Name.S02.1080p/Show.Name.S02E01.720p.WEB.mkv", 1.0),
                ("Show.Name.S02.1080p/Show.Name.S02E02.720p.WEB.mkv", 0.3),
            ],
        )
        .await;
    let orchestrator = harness.orchestrator();

    let report = orchestrator.run_sweep().await.unwrap();

    assert_eq!(report.actions_dispatched, 1);
    assert_eq!(report.torrents_removed, 0);
    assert_eq!(
        harness.store.tags("h1").await,
        tags(&[MARKER, "jellyfin:rename=completed"])
    );
    assert!(harness.exists("Show Name S02/Show Name S02E01.mkv"));
    assert!(!harness.exists("Show Name S02/Show.Name.S02E02.720p.WEB.mkv"));
    assert!(!harness.exists("Show.Name.S02.1080p"));
    assert!(harness
        .store
        .calls_for("h1")
        .await
        .contains(&StoreCall::Stop { hash: "h1".to_string() }));
    assert_eq!(harness.library.refresh_count().await, 1);

    let report = orchestrator.run_sweep().await.unwrap();

    assert_eq!(report.torrents_removed, 1);
    assert!(!harness.store.has_torrent("h1").await);
    assert!(harness
        .store
        .calls_for("h1")
        .await
        .contains(&StoreCall::Remove {
            hash: "h1".to_string(),
            delete_files: false
        }));
    // files stay on disk, library category triggers one more refresh
    assert!(harness.exists("Show Name S02/Show Name S02E01.mkv"));
    assert_eq!(harness.library.refresh_count().await, 2);
}

#[tokio::test]
async fn test_partial_rename_failure_blocks_removal() {
    let harness = TestHarness::new();
    harness
        .add_torrent("h1", "Pack", 1.0, &[MARKER, "jellyfin:rename=pending"])
        .await;
    harness
        .add_files(
            "h1",
            &[("Pack/Movie.2010.mkv", 1.0), ("Pack/Other.2012.mkv", 1.0)],
        )
        .await;
    // collision for the second file
    tokio::fs::write(harness.root().join("Pack/Other (2012).mkv"), b"x")
        .await
        .unwrap();
    let orchestrator = harness.orchestrator();

    orchestrator.run_sweep().await.unwrap();

    let after_first = harness.store.tags("h1").await;
    assert_eq!(after_first, tags(&[MARKER, "jellyfin:rename=failed"]));
    assert!(harness.exists("Pack/Movie (2010).mkv"));
    assert!(harness.exists("Pack/Other.2012.mkv"));

    for _ in 0..2 {
        let report = orchestrator.run_sweep().await.unwrap();
        assert_eq!(report.torrents_removed, 0);
        assert_eq!(report.actions_dispatched, 0);
    }

    assert!(harness.store.has_torrent("h1").await);
    assert_eq!(harness.store.tags("h1").await, after_first);
}

#[tokio::test]
async fn test_rename_deferred_when_content_listing_fails() {
    let harness = TestHarness::new();
    harness
        .add_torrent("h1", "Movie.2010", 1.0, &[MARKER, "jellyfin:rename=pending"])
        .await;
    harness.add_files("h1", &[("Movie.2010.mkv", 1.0)]).await;
    harness
        .store
        .fail_operation(
            StoreOperation::ContentFiles,
            ServiceError::connection("mock", "timeout"),
        )
        .await;
    let orchestrator = harness.orchestrator();

    let report = orchestrator.run_sweep().await.unwrap();

    assert_eq!(report.actions_dispatched, 1);
    assert_eq!(report.tags_swapped, 0);
    assert_eq!(
        harness.store.tags("h1").await,
        tags(&[MARKER, "jellyfin:rename=pending"])
    );
    assert!(harness.store.has_torrent("h1").await);

    harness.store.clear_failures().await;
    orchestrator.run_sweep().await.unwrap();

    assert_eq!(
        harness.store.tags("h1").await,
        tags(&[MARKER, "jellyfin:rename=completed"])
    );
    assert!(harness.exists("Movie (2010).mkv"));
}

#[tokio::test]
async fn test_stop_failure_does_not_block_action() {
    let harness = TestHarness::new();
    harness
        .add_torrent("h1", "Movie.2010", 1.0, &[MARKER, "jellyfin:rename=pending"])
        .await;
    harness.add_files("h1", &[("Movie.2010.mkv", 1.0)]).await;
    harness
        .store
        .fail_operation(
            StoreOperation::Stop,
            ServiceError::upstream("mock", 500, "nope".to_string()),
        )
        .await;

    harness.orchestrator().run_sweep().await.unwrap();

    assert_eq!(
        harness.store.tags("h1").await,
        tags(&[MARKER, "jellyfin:rename=completed"])
    );
}

#[tokio::test]
async fn test_failed_tag_removal_keeps_old_tag() {
    let harness = TestHarness::new();
    harness
        .add_torrent("h1", "Movie.2010", 1.0, &[MARKER, "jellyfin:rename=pending"])
        .await;
    harness.add_files("h1", &[("Movie.2010.mkv", 1.0)]).await;
    harness
        .store
        .fail_operation(
            StoreOperation::RemoveTags,
            ServiceError::connection("mock", "reset"),
        )
        .await;
    let orchestrator = harness.orchestrator();

    orchestrator.run_sweep().await.unwrap();

    assert_eq!(
        harness.store.tags("h1").await,
        tags(&[MARKER, "jellyfin:rename=pending"])
    );
    assert!(!harness
        .store
        .calls_for("h1")
        .await
        .iter()
        .any(|c| matches!(c, StoreCall::AddTags { .. })));

    // the re-run finds the files already renamed
    harness.store.clear_failures().await;
    orchestrator.run_sweep().await.unwrap();
    assert_eq!(
        harness.store.tags("h1").await,
        tags(&[MARKER, "jellyfin:rename=completed"])
    );
}

#[tokio::test]
async fn test_failed_tag_add_restores_old_tag() {
    let harness = TestHarness::new();
    harness
        .add_torrent("h1", "Movie.2010", 1.0, &[MARKER, "jellyfin:rename=pending"])
        .await;
    harness.add_files("h1", &[("Movie.2010.mkv", 1.0)]).await;
    harness
        .store
        .fail_operation_once(
            StoreOperation::AddTags,
            ServiceError::connection("mock", "reset"),
        )
        .await;
    let orchestrator = harness.orchestrator();

    let report = orchestrator.run_sweep().await.unwrap();

    assert_eq!(report.tags_swapped, 0);
    assert_eq!(
        harness.store.tags("h1").await,
        tags(&[MARKER, "jellyfin:rename=pending"])
    );
    let restored = harness.store.calls_for("h1").await.contains(&StoreCall::AddTags {
        hash: "h1".to_string(),
        tags: vec!["jellyfin:rename=pending".to_string()],
    });
    assert!(restored);
    assert!(harness.store.has_torrent("h1").await);

    orchestrator.run_sweep().await.unwrap();
    assert_eq!(
        harness.store.tags("h1").await,
        tags(&[MARKER, "jellyfin:rename=completed"])
    );
    assert!(harness.exists("Movie (2010).mkv"));
}

#[tokio::test]
async fn test_failed_rename_is_kept_when_tag_add_fails() {
    let harness = TestHarness::new();
    harness
        .add_torrent("h1", "Movie.2010", 1.0, &[MARKER, "jellyfin:rename=pending"])
        .await;
    // registered but never written to disk
    harness
        .store
        .set_files("h1", vec![ContentFile::new("Movie.2010.mkv", 1.0)])
        .await;
    harness
        .store
        .fail_operation_once(
            StoreOperation::AddTags,
            ServiceError::connection("mock", "reset"),
        )
        .await;
    let orchestrator = harness.orchestrator();

    orchestrator.run_sweep().await.unwrap();
    assert_eq!(
        harness.store.tags("h1").await,
        tags(&[MARKER, "jellyfin:rename=pending"])
    );

    let report = orchestrator.run_sweep().await.unwrap();
    assert_eq!(report.torrents_removed, 0);
    assert_eq!(
        harness.store.tags("h1").await,
        tags(&[MARKER, "jellyfin:rename=failed"])
    );

    let report = orchestrator.run_sweep().await.unwrap();
    assert_eq!(report.torrents_removed, 0);
    assert!(harness.store.has_torrent("h1").await);
}

#[tokio::test]
async fn test_library_refresh_failure_does_not_block_rename() {
    let harness = TestHarness::new();
    harness
        .add_torrent("h1", "Movie.2010", 1.0, &[MARKER, "jellyfin:rename=pending"])
        .await;
    harness.add_files("h1", &[("Movie.2010.mkv", 1.0)]).await;
    harness
        .library
        .set_refresh_error(Some(ServiceError::connection("jellyfin", "refused")))
        .await;

    harness.orchestrator().run_sweep().await.unwrap();

    assert_eq!(harness.library.refresh_count().await, 1);
    assert_eq!(
        harness.store.tags("h1").await,
        tags(&[MARKER, "jellyfin:rename=completed"])
    );
    assert!(harness.exists("Movie (2010).mkv"));
}

// =============================================================================
// Subtitles
// =============================================================================

#[tokio::test]
async fn test_find_subs_already_present() {
    let harness = TestHarness::new();
    harness
        .add_torrent("h1", "Movie.2010", 1.0, &[MARKER, "jellyfin:find_subs=pending"])
        .await;
    harness.add_files("h1", &[("Movie (2010).mkv", 1.0)]).await;
    harness
        .library
        .add_item(fixtures::library_item(
            "i1",
            "/media/movies/Movie (2010).mkv",
            &["eng"],
        ))
        .await;

    harness.orchestrator().run_sweep().await.unwrap();

    assert_eq!(
        harness.store.tags("h1").await,
        tags(&[MARKER, "jellyfin:find_subs=already_present"])
    );
    assert!(harness.library.subtitle_requests().await.is_empty());
}

#[tokio::test]
async fn test_find_subs_with_no_eligible_items_is_already_present() {
    let harness = TestHarness::new();
    harness
        .add_torrent("h1", "Movie.2010", 1.0, &[MARKER, "jellyfin:find_subs=pending"])
        .await;
    harness.add_files("h1", &[("Movie (2010).mkv", 1.0)]).await;
    harness
        .library
        .add_item(fixtures::library_item("i1", "/media/movies/Unrelated.mkv", &[]))
        .await;

    harness.orchestrator().run_sweep().await.unwrap();

    assert_eq!(
        harness.store.tags("h1").await,
        tags(&[MARKER, "jellyfin:find_subs=already_present"])
    );
}

#[tokio::test]
async fn test_find_subs_partially_completed() {
    let harness = TestHarness::new();
    harness
        .add_torrent("h1", "Show", 1.0, &[MARKER, "jellyfin:find_subs=pending"])
        .await;
    harness
        .add_files(
            "h1",
            &[("Show/Show S01E01.mkv", 1.0), ("Show/Show S01E02.mkv", 1.0)],
        )
        .await;
    harness
        .library
        .add_item(fixtures::library_item("e1", "/tv/Show/Show S01E01.mkv", &[]))
        .await;
    harness
        .library
        .add_item(fixtures::library_item("e2", "/tv/Show/Show S01E02.mkv", &[]))
        .await;
    harness
        .library
        .set_subtitle_outcome("e2", Ok(SubtitleOutcome::NotFound))
        .await;

    harness.orchestrator().run_sweep().await.unwrap();

    assert_eq!(
        harness.store.tags("h1").await,
        tags(&[MARKER, "jellyfin:find_subs=partially_completed"])
    );
    assert_eq!(harness.library.subtitle_requests().await.len(), 2);
}

#[tokio::test]
async fn test_find_subs_deferred_when_library_listing_fails() {
    let harness = TestHarness::new();
    harness
        .add_torrent("h1", "Movie", 1.0, &[MARKER, "jellyfin:find_subs=pending"])
        .await;
    harness
        .library
        .set_list_error(Some(ServiceError::connection("jellyfin", "refused")))
        .await;
    let orchestrator = harness.orchestrator();

    orchestrator.run_sweep().await.unwrap();

    assert_eq!(harness.library.list_count().await, 1);
    assert_eq!(
        harness.store.tags("h1").await,
        tags(&[MARKER, "jellyfin:find_subs=pending"])
    );
    assert!(harness.store.has_torrent("h1").await);

    harness.library.set_list_error(None).await;
    orchestrator.run_sweep().await.unwrap();
    assert_eq!(harness.library.list_count().await, 2);
    assert_eq!(
        harness.store.tags("h1").await,
        tags(&[MARKER, "jellyfin:find_subs=already_present"])
    );
}

#[tokio::test]
async fn test_rename_runs_before_find_subs() {
    let harness = TestHarness::new();
    harness
        .add_torrent(
            "h1",
            "The.Matrix.1999.1080p",
            1.0,
            &[MARKER, "jellyfin:find_subs=pending", "jellyfin:rename=pending"],
        )
        .await;
    harness
        .add_files("h1", &[("The.Matrix.1999.1080p.BluRay.x264.mkv", 1.0)])
        .await;
    // the library indexed the renamed file
    harness
        .library
        .add_item(fixtures::library_item(
            "m1",
            "/media/movies/The Matrix (1999).mkv",
            &[],
        ))
        .await;

    let report = harness.orchestrator().run_sweep().await.unwrap();

    assert_eq!(report.actions_dispatched, 2);
    assert!(harness.exists("The Matrix (1999).mkv"));
    assert_eq!(
        harness.store.tags("h1").await,
        tags(&[
            MARKER,
            "jellyfin:find_subs=completed",
            "jellyfin:rename=completed"
        ])
    );
    let requests = harness.library.subtitle_requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].item_id, "m1");
    assert_eq!(requests[0].language, "eng");
}

// =============================================================================
// Unknown actions and removal
// =============================================================================

#[tokio::test]
async fn test_unknown_action_stays_pending_and_blocks_removal() {
    let harness = TestHarness::new();
    harness
        .add_torrent("h1", "Movie", 1.0, &[MARKER, "plex:scan=pending"])
        .await;
    let orchestrator = harness.orchestrator();

    for _ in 0..2 {
        orchestrator.run_sweep().await.unwrap();
    }

    assert_eq!(
        harness.store.tags("h1").await,
        tags(&[MARKER, "plex:scan=pending"])
    );
    assert!(harness.store.has_torrent("h1").await);
    assert!(harness
        .store
        .calls_for("h1")
        .await
        .contains(&StoreCall::Stop { hash: "h1".to_string() }));
}

#[tokio::test]
async fn test_resolved_torrent_removed_once() {
    let harness = TestHarness::new();
    harness
        .add_torrent(
            "h1",
            "Movie",
            1.0,
            &[MARKER, "jellyfin:rename=completed", "slack:notify=failed"],
        )
        .await;
    harness
        .add_torrent("h2", "Other", 1.0, &[MARKER, "jellyfin:find_subs=partially_completed"])
        .await;

    let report = harness.orchestrator().run_sweep().await.unwrap();

    assert_eq!(report.torrents_removed, 2);
    let removals = harness
        .store
        .calls()
        .await
        .into_iter()
        .filter(|c| matches!(c, StoreCall::Remove { .. }))
        .count();
    assert_eq!(removals, 2);
}

#[tokio::test]
async fn test_removal_without_library_category_skips_refresh() {
    let harness = TestHarness::new();
    let mut torrent = fixtures::torrent("h1", "Album", 1.0, &[MARKER]);
    torrent.category = Some("music".to_string());
    harness.store.add_torrent(torrent).await;

    harness.orchestrator().run_sweep().await.unwrap();

    assert!(!harness.store.has_torrent("h1").await);
    assert_eq!(harness.library.refresh_count().await, 0);
}

// =============================================================================
// Sweep level
// =============================================================================

#[tokio::test]
async fn test_list_failure_aborts_sweep() {
    let harness = TestHarness::new();
    harness
        .add_torrent("h1", "Movie", 1.0, &[MARKER, "slack:notify=initial"])
        .await;
    harness
        .store
        .set_next_error(ServiceError::connection("mock", "refused"))
        .await;
    let orchestrator = harness.orchestrator();

    let result = orchestrator.run_sweep().await;

    assert!(matches!(result, Err(OrchestratorError::ListFailed(_))));
    assert!(harness.notifier.sent().await.is_empty());
    assert!(harness.store.calls().await.iter().all(|c| !c.is_mutation()));

    let status = orchestrator.status().await;
    assert!(status.last_check.is_some());
    assert!(status.last_error.unwrap().contains("refused"));
}

#[tokio::test]
async fn test_two_sweeps_without_changes_are_idempotent() {
    let harness = TestHarness::new();
    harness
        .add_torrent("h1", "Pack", 1.0, &[MARKER, "jellyfin:rename=failed"])
        .await;
    harness
        .add_torrent("h2", "Movie", 1.0, &["jellyfin:rename=pending"])
        .await;
    harness
        .add_torrent("h3", "Show", 0.2, &[MARKER, "slack:notify=initial"])
        .await;
    let orchestrator = harness.orchestrator();

    orchestrator.run_sweep().await.unwrap();
    let first: Vec<Vec<String>> = vec![
        harness.store.tags("h1").await,
        harness.store.tags("h2").await,
        harness.store.tags("h3").await,
    ];
    orchestrator.run_sweep().await.unwrap();
    let second: Vec<Vec<String>> = vec![
        harness.store.tags("h1").await,
        harness.store.tags("h2").await,
        harness.store.tags("h3").await,
    ];

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_concurrent_sweep_is_rejected() {
    let harness = TestHarness::new();
    harness
        .add_torrent("h1", "Movie", 1.0, &[MARKER, "jellyfin:find_subs=pending"])
        .await;
    let config = OrchestratorConfig {
        refresh_settle_secs: 1,
        ..harness.config()
    };
    let orchestrator = Arc::new(harness.orchestrator_with(config, true));

    let background = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move { orchestrator.run_sweep().await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;

    let result = orchestrator.run_sweep().await;
    assert!(matches!(result, Err(OrchestratorError::SweepInProgress)));

    let report = background.await.unwrap().unwrap();
    assert_eq!(report.actions_dispatched, 1);
}

#[tokio::test]
async fn test_start_runs_first_sweep_eagerly() {
    let harness = TestHarness::new();
    harness
        .add_torrent("h1", "Movie", 0.5, &["slack:notify=pending"])
        .await;
    let orchestrator = Arc::new(harness.orchestrator());

    orchestrator.start().await;

    let status = orchestrator.status().await;
    assert!(status.running);
    assert!(status.last_check.is_some());
    assert!(status.next_check.is_some());
    assert_eq!(status.last_report.unwrap().notifications_sent, 1);
    assert_eq!(harness.notifier.sent().await.len(), 1);

    orchestrator.stop().await;
    let status = orchestrator.status().await;
    assert!(!status.running);
    assert!(status.next_check.is_none());
}

#[tokio::test]
async fn test_start_retries_sooner_after_list_failure() {
    let harness = TestHarness::new();
    harness
        .store
        .fail_operation(
            StoreOperation::List,
            ServiceError::connection("mock", "refused"),
        )
        .await;
    let config = OrchestratorConfig {
        interval_secs: 3600,
        retry_interval_secs: 1,
        ..harness.config()
    };
    let orchestrator = Arc::new(harness.orchestrator_with(config, true));

    orchestrator.start().await;

    let status = orchestrator.status().await;
    assert!(status.last_error.is_some());
    let gap = status.next_check.unwrap() - status.last_check.unwrap();
    assert!(
        (900..=1500).contains(&gap.num_milliseconds()),
        "unexpected retry gap: {:?}",
        gap
    );

    tokio::time::sleep(Duration::from_millis(1600)).await;
    let list_calls = harness
        .store
        .calls()
        .await
        .into_iter()
        .filter(|c| *c == StoreCall::List)
        .count();
    assert!(list_calls >= 2, "expected a retry, saw {} list calls", list_calls);

    orchestrator.stop().await;
}

#[tokio::test]
async fn test_start_uses_regular_interval_after_success() {
    let harness = TestHarness::new();
    let config = OrchestratorConfig {
        interval_secs: 3600,
        retry_interval_secs: 1,
        ..harness.config()
    };
    let orchestrator = Arc::new(harness.orchestrator_with(config, true));

    orchestrator.start().await;

    let status = orchestrator.status().await;
    assert!(status.last_error.is_none());
    let gap = status.next_check.unwrap() - status.last_check.unwrap();
    assert!((3599..=3601).contains(&gap.num_seconds()));

    orchestrator.stop().await;
}
