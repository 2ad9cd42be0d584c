//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that builds the router in-process
//! with mock dependencies injected.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use tagrunner_core::{
    config::HealthConfig,
    library::LibraryIndex,
    load_config_from_str,
    notifier::Notifier,
    testing::{MockLibraryIndex, MockNotifier, MockTorrentStore},
    Config, HealthMonitor, OrchestratorConfig, TagOrchestrator, TorrentStore,
};
use tagrunner_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use tagrunner_core::testing::fixtures;

const TEST_CONFIG: &str = r#"
[qbittorrent]
url = "http://localhost:8081"
password = "secret"

[jellyfin]
url = "http://localhost:8096"
api_key = "jf-key"
"#;

/// Test fixture with an in-process router and controllable mocks.
pub struct TestFixture {
    pub router: Router,
    pub store: Arc<MockTorrentStore>,
    pub library: Arc<MockLibraryIndex>,
    pub notifier: Arc<MockNotifier>,
    pub health: Arc<HealthMonitor>,
    pub orchestrator: Option<Arc<TagOrchestrator>>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Fixture with the orchestrator enabled but not started.
    pub async fn new() -> Self {
        Self::build(true, 0).await
    }

    /// Fixture without an orchestrator.
    pub async fn without_orchestrator() -> Self {
        Self::build(false, 0).await
    }

    /// Fixture whose library steps wait `secs` after each refresh.
    pub async fn with_settle_secs(secs: u64) -> Self {
        Self::build(true, secs).await
    }

    async fn build(with_orchestrator: bool, settle_secs: u64) -> Self {
        let config: Config = load_config_from_str(TEST_CONFIG).expect("valid test config");

        let store = Arc::new(MockTorrentStore::new());
        let library = Arc::new(MockLibraryIndex::new());
        let notifier = Arc::new(MockNotifier::new());

        let health = Arc::new(HealthMonitor::new(
            HealthConfig::default(),
            Arc::clone(&store) as Arc<dyn TorrentStore>,
        ));

        let orchestrator = with_orchestrator.then(|| {
            Arc::new(TagOrchestrator::new(
                OrchestratorConfig {
                    refresh_settle_secs: settle_secs,
                    ..Default::default()
                },
                Arc::clone(&store) as Arc<dyn TorrentStore>,
                Arc::clone(&library) as Arc<dyn LibraryIndex>,
                Some(Arc::clone(&notifier) as Arc<dyn Notifier>),
            ))
        });

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&store) as Arc<dyn TorrentStore>,
            Arc::clone(&health),
            orchestrator.clone(),
        ));

        Self {
            router: create_router(state),
            store,
            library,
            notifier,
            health,
            orchestrator,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path).await
    }

    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path).await
    }

    async fn request(&self, method: &str, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}
