use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tagrunner_core::{
    config::CONFIG_PATH_ENV, load_config, validate_config, Config, HealthMonitor, JellyfinClient,
    LibraryIndex, LogFormat, NotificationLinks, Notifier, QBittorrentClient, SlackNotifier,
    TagOrchestrator, TorrentStore,
};
use tagrunner_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        eprintln!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Config path is optional; env overrides alone may be enough
    let config_path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);

    let config = load_config(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("Failed to load config from {:?}", path),
        None => "Failed to load config from environment".to_string(),
    })?;

    init_logging(&config);

    validate_config(&config).context("Configuration validation failed")?;
    info!(path = ?config_path, "Configuration loaded");

    let store: Arc<dyn TorrentStore> = Arc::new(
        QBittorrentClient::new(config.qbittorrent.clone())
            .context("Failed to create qBittorrent client")?,
    );
    info!(url = %config.qbittorrent.url, "Using qBittorrent torrent store");

    let library: Arc<dyn LibraryIndex> = Arc::new(
        JellyfinClient::new(config.jellyfin.clone()).context("Failed to create Jellyfin client")?,
    );
    info!(url = %config.jellyfin.url, "Using Jellyfin library");

    let notifier: Option<Arc<dyn Notifier>> = match &config.slack {
        Some(slack) => {
            let links = NotificationLinks {
                torrents_url: config.qbittorrent.public_url.clone(),
                library_url: config.jellyfin.public_url.clone(),
            };
            info!("Slack notifications enabled");
            Some(Arc::new(
                SlackNotifier::new(slack, links).context("Failed to create Slack notifier")?,
            ))
        }
        None => {
            info!("No notifier configured, notify tags are left untouched");
            None
        }
    };

    let health = Arc::new(HealthMonitor::new(
        config.health.clone(),
        Arc::clone(&store),
    ));
    health.start().await;

    let orchestrator = if config.orchestrator.enabled {
        let orch = Arc::new(
            TagOrchestrator::new(
                config.orchestrator.clone(),
                Arc::clone(&store),
                library,
                notifier,
            )
            .with_subtitle_language(config.jellyfin.subtitle_language.clone()),
        );
        orch.start().await;
        Some(orch)
    } else {
        warn!("Orchestrator disabled in config");
        None
    };

    let state = Arc::new(AppState::new(
        config.clone(),
        store,
        Arc::clone(&health),
        orchestrator.clone(),
    ));

    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    if let Some(orch) = &orchestrator {
        orch.stop().await;
        info!("Orchestrator stopped");
    }
    health.stop().await;

    Ok(())
}

/// Install the tracing subscriber. `RUST_LOG` wins over `logging.level`.
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
