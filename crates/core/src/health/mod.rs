//! Torrent store health monitor.
//!
//! Pings the store on a fixed interval while it is healthy and on the
//! shorter retry interval while it is not.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::config::HealthConfig;
use crate::metrics;
use crate::torrent_store::TorrentStore;

/// Last known health of the torrent store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub last_check: Option<DateTime<Utc>>,
    pub next_check: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

pub struct HealthMonitor {
    config: HealthConfig,
    store: Arc<dyn TorrentStore>,
    running: Arc<AtomicBool>,
    status: Arc<RwLock<HealthStatus>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl HealthMonitor {
    pub fn new(config: HealthConfig, store: Arc<dyn TorrentStore>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            store,
            running: Arc::new(AtomicBool::new(false)),
            status: Arc::new(RwLock::new(HealthStatus::default())),
            shutdown_tx,
        }
    }

    /// Check once, then keep checking in the background.
    pub async fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Health monitor already running");
            return;
        }

        let healthy = self.check().await;
        let mut delay = self.delay_after(healthy);
        self.set_next_check(delay).await;

        let this = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            info!(store = this.store.name(), "Health monitor started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = tokio::time::sleep(delay) => {
                        if !this.running.load(Ordering::Relaxed) {
                            break;
                        }
                        let healthy = this.check().await;
                        delay = this.delay_after(healthy);
                        this.set_next_check(delay).await;
                    }
                }
            }
            info!("Health monitor stopped");
        });
    }

    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let _ = self.shutdown_tx.send(());
        self.status.write().await.next_check = None;
    }

    pub async fn status(&self) -> HealthStatus {
        self.status.read().await.clone()
    }

    /// Ping the store and record the result.
    pub async fn check(&self) -> bool {
        let result = self.store.ping().await;
        let healthy = result.is_ok();

        let was_healthy = {
            let mut status = self.status.write().await;
            let was_healthy = status.healthy;
            status.healthy = healthy;
            status.last_check = Some(Utc::now());
            status.last_error = result.as_ref().err().map(|e| e.to_string());
            was_healthy
        };

        match &result {
            Ok(()) if !was_healthy => info!(store = self.store.name(), "Torrent store is healthy"),
            Ok(()) => debug!(store = self.store.name(), "Torrent store is healthy"),
            Err(e) => warn!(store = self.store.name(), error = %e, "Torrent store health check failed"),
        }

        let label = if healthy { "healthy" } else { "unhealthy" };
        metrics::HEALTH_CHECKS.with_label_values(&[label]).inc();

        healthy
    }

    fn delay_after(&self, healthy: bool) -> Duration {
        if healthy {
            Duration::from_secs(self.config.interval_secs)
        } else {
            Duration::from_secs(self.config.retry_interval_secs)
        }
    }

    async fn set_next_check(&self, delay: Duration) {
        let next = chrono::Duration::from_std(delay).ok().map(|d| Utc::now() + d);
        self.status.write().await.next_check = next;
    }
}
