//! Small helpers shared by the reqwest-based service clients.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::error::ServiceError;

/// Build a reqwest client with the shared request timeout.
pub(crate) fn build_client(
    service: &'static str,
    timeout_secs: u64,
    cookie_store: bool,
) -> Result<Client, ServiceError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .cookie_store(cookie_store)
        .build()
        .map_err(|e| ServiceError::connection(service, e))
}

/// Map a reqwest transport error to a connection failure.
pub(crate) fn transport_error(service: &'static str) -> impl Fn(reqwest::Error) -> ServiceError {
    move |e| {
        if e.is_timeout() {
            ServiceError::connection(service, format!("request timed out: {}", e))
        } else {
            ServiceError::connection(service, e)
        }
    }
}

/// A 2xx response body and the status it came with.
#[derive(Debug, Clone)]
pub(crate) struct SuccessBody {
    pub status: u16,
    pub text: String,
}

impl SuccessBody {
    pub(crate) fn new(status: u16, text: impl Into<String>) -> Self {
        Self {
            status,
            text: text.into(),
        }
    }
}

/// Read the body of a response, failing with an upstream error on non-2xx.
pub(crate) async fn read_success_body(
    service: &'static str,
    response: Response,
) -> Result<SuccessBody, ServiceError> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error(service))?;

    if !status.is_success() {
        return Err(ServiceError::upstream(service, status.as_u16(), body));
    }

    Ok(SuccessBody::new(status.as_u16(), body))
}

/// Decode a successful JSON body into a schema struct.
///
/// A decode failure is reported as upstream with the status the body came with.
pub(crate) fn decode_json<T: DeserializeOwned>(
    service: &'static str,
    body: SuccessBody,
) -> Result<T, ServiceError> {
    serde_json::from_str(&body.text).map_err(|e| {
        ServiceError::upstream_with_reason(
            service,
            body.status,
            format!("failed to parse response: {}", e),
            body.text,
        )
    })
}

/// Strip trailing slashes from a configured base URL.
pub(crate) fn base_url(url: &str) -> &str {
    url.trim_end_matches('/')
}
