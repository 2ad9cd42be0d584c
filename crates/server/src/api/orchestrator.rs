//! Orchestrator API handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use tagrunner_core::{OrchestratorError, OrchestratorStatus};
use tracing::info;

use super::handlers::ErrorResponse;
use super::torrents::service_error_response;
use crate::state::AppState;

/// Orchestrator status response
#[derive(Debug, Serialize)]
pub struct OrchestratorStatusResponse {
    /// Whether the orchestrator is enabled in config
    pub available: bool,
    #[serde(flatten)]
    pub status: OrchestratorStatus,
}

/// GET /api/v1/orchestrator/status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<OrchestratorStatusResponse> {
    match state.orchestrator() {
        Some(orch) => Json(OrchestratorStatusResponse {
            available: true,
            status: orch.status().await,
        }),
        None => Json(OrchestratorStatusResponse {
            available: false,
            status: OrchestratorStatus::default(),
        }),
    }
}

/// POST /api/v1/orchestrator/sweep
///
/// Run a sweep now and return its report.
pub async fn trigger_sweep(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let Some(orch) = state.orchestrator() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!(ErrorResponse {
                error: "Orchestrator is disabled".to_string(),
            })),
        );
    };

    info!("Manual sweep requested");
    match orch.run_sweep().await {
        Ok(report) => (StatusCode::OK, Json(serde_json::json!(report))),
        Err(OrchestratorError::SweepInProgress) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!(ErrorResponse {
                error: OrchestratorError::SweepInProgress.to_string(),
            })),
        ),
        Err(OrchestratorError::ListFailed(e)) => {
            let (_, body) = service_error_response(&e);
            (StatusCode::BAD_GATEWAY, body)
        }
    }
}
