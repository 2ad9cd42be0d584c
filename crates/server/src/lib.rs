//! HTTP surface for tagrunner: health, torrent listing, orchestrator control
//! and Prometheus metrics.

pub mod api;
pub mod metrics;
pub mod state;
