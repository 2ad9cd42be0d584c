//! Prometheus metrics for observability.
//!
//! Server-side HTTP metrics plus gauges collected from component status at
//! scrape time. Sweep, action and notification counters live in
//! `tagrunner_core::metrics` and are registered here as well.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use tracing::warn;

use crate::state::AppState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tagrunner_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .expect("valid http duration metric")
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tagrunner_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("valid http requests metric")
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "tagrunner_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .expect("valid in-flight metric")
});

// =============================================================================
// Component Metrics (collected dynamically)
// =============================================================================

/// Orchestrator running state (1 = running, 0 = stopped).
pub static ORCHESTRATOR_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "tagrunner_orchestrator_running",
        "Whether the orchestrator is running (1) or stopped (0)",
    )
    .expect("valid orchestrator gauge")
});

/// Torrent store health (1 = healthy, 0 = unhealthy).
pub static TORRENT_STORE_HEALTHY: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "tagrunner_torrent_store_healthy",
        "Whether the torrent store answered the last health check",
    )
    .expect("valid health gauge")
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    let server_metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()),
        Box::new(ORCHESTRATOR_RUNNING.clone()),
        Box::new(TORRENT_STORE_HEALTHY.clone()),
    ];

    for metric in server_metrics
        .into_iter()
        .chain(tagrunner_core::metrics::all_metrics())
    {
        if let Err(e) = registry.register(metric) {
            warn!(error = %e, "Failed to register metric");
        }
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Update gauges from current component status before a scrape.
pub async fn collect_dynamic_metrics(state: &AppState) {
    let running = match state.orchestrator() {
        Some(orchestrator) => orchestrator.status().await.running,
        None => false,
    };
    ORCHESTRATOR_RUNNING.set(i64::from(running));

    let healthy = state.health().status().await.healthy;
    TORRENT_STORE_HEALTHY.set(i64::from(healthy));
}
