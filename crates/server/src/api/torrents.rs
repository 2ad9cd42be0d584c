//! Torrent store API handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::Value;
use tagrunner_core::{ServiceError, TorrentSnapshot};
use tracing::warn;

use crate::state::AppState;

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TorrentListResponse {
    pub total_items: usize,
    pub items: Vec<TorrentSnapshot>,
}

/// Error body for failures reported by the torrent store itself.
#[derive(Debug, Serialize)]
pub struct UpstreamErrorResponse {
    pub error: String,
    pub upstream_response: Value,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/torrents
///
/// Every torrent known to the store, as last reported.
pub async fn list_torrents(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store().list_torrents().await {
        Ok(items) => (
            StatusCode::OK,
            Json(serde_json::json!(TorrentListResponse {
                total_items: items.len(),
                items,
            })),
        ),
        Err(e) => {
            warn!(store = state.store().name(), error = %e, "Failed to list torrents");
            service_error_response(&e)
        }
    }
}

/// Map a store failure to a response.
///
/// Unreachable store gives 500; a store that answered with an error gives
/// 502 and echoes its body.
pub(crate) fn service_error_response(error: &ServiceError) -> (StatusCode, Json<Value>) {
    match error {
        ServiceError::Connection { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": error.to_string() })),
        ),
        ServiceError::Upstream { body, .. } => {
            let upstream_response = error
                .upstream_json()
                .cloned()
                .unwrap_or_else(|| Value::String(body.clone()));
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!(UpstreamErrorResponse {
                    error: error.to_string(),
                    upstream_response,
                })),
            )
        }
    }
}
