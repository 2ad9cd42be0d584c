//! Error taxonomy shared by every HTTP collaborator.

use serde_json::Value;
use thiserror::Error;

/// Failure talking to an external service (torrent store, library, notifier).
///
/// Both variants are transient from the orchestrator's point of view: the
/// affected step is abandoned for the current sweep and naturally retried on
/// the next one. HTTP callers use the distinction to pick a response code.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// The service could not be reached (DNS, refused, reset, timeout).
    #[error("connection to {service} failed: {message}")]
    Connection {
        service: &'static str,
        message: String,
    },

    /// The service answered, but with a non-success status or an
    /// unparseable body.
    #[error("{service} returned HTTP {status}: {reason}")]
    Upstream {
        service: &'static str,
        status: u16,
        reason: String,
        /// Raw response body.
        body: String,
        /// Response body parsed as JSON, when it happens to be JSON.
        json: Option<Value>,
    },
}

impl ServiceError {
    /// Build a connection error from a transport failure.
    pub fn connection(service: &'static str, err: impl std::fmt::Display) -> Self {
        ServiceError::Connection {
            service,
            message: err.to_string(),
        }
    }

    /// Build an upstream error for a rejected request.
    pub fn upstream(service: &'static str, status: u16, body: String) -> Self {
        Self::upstream_with_reason(service, status, "unexpected status code", body)
    }

    /// Build an upstream error with an explicit reason (e.g. a decode failure).
    pub fn upstream_with_reason(
        service: &'static str,
        status: u16,
        reason: impl Into<String>,
        body: String,
    ) -> Self {
        let json = serde_json::from_str(&body).ok();
        ServiceError::Upstream {
            service,
            status,
            reason: reason.into(),
            body,
            json,
        }
    }

    /// Whether this is a transport-level failure.
    pub fn is_connection(&self) -> bool {
        matches!(self, ServiceError::Connection { .. })
    }

    /// HTTP status reported by the upstream, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Connection { .. } => None,
            ServiceError::Upstream { status, .. } => Some(*status),
        }
    }

    /// Parsed upstream body, if any.
    pub fn upstream_json(&self) -> Option<&Value> {
        match self {
            ServiceError::Connection { .. } => None,
            ServiceError::Upstream { json, .. } => json.as_ref(),
        }
    }

    /// Name of the service that failed.
    pub fn service(&self) -> &'static str {
        match self {
            ServiceError::Connection { service, .. } | ServiceError::Upstream { service, .. } => {
                service
            }
        }
    }
}
