//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Orchestrator (sweeps, dispatched actions, removals)
//! - Notifications
//! - Health checks against the torrent store

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Orchestrator
// =============================================================================

/// Sweeps total by result.
pub static SWEEPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tagrunner_sweeps_total", "Total orchestrator sweeps"),
        &["result"], // "ok", "list_failed"
    )
    .unwrap()
});

/// Sweep duration in seconds.
pub static SWEEP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tagrunner_sweep_duration_seconds",
            "Duration of an orchestrator sweep",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["result"],
    )
    .unwrap()
});

/// Dispatched actions by action and outcome.
pub static ACTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tagrunner_actions_total", "Total dispatched actions"),
        &["action", "outcome"], // outcome is the resulting status, or "deferred"
    )
    .unwrap()
});

/// Torrents removed from the store.
pub static TORRENTS_REMOVED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tagrunner_torrents_removed_total",
        "Total torrents removed after processing",
    )
    .unwrap()
});

// =============================================================================
// Notifications
// =============================================================================

/// Notifications by event and result.
pub static NOTIFICATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tagrunner_notifications_total", "Total notifications sent"),
        &["event", "result"], // event: "started", "completed"; result: "success", "failure"
    )
    .unwrap()
});

// =============================================================================
// Health
// =============================================================================

/// Torrent store health checks by result.
pub static HEALTH_CHECKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tagrunner_health_checks_total",
            "Total torrent store health checks",
        ),
        &["result"], // "healthy", "unhealthy"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SWEEPS.clone()),
        Box::new(SWEEP_DURATION.clone()),
        Box::new(ACTIONS.clone()),
        Box::new(TORRENTS_REMOVED.clone()),
        Box::new(NOTIFICATIONS.clone()),
        Box::new(HEALTH_CHECKS.clone()),
    ]
}
