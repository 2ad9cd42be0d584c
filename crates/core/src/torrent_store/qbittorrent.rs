//! qBittorrent Web API torrent store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::QBittorrentConfig;
use crate::error::ServiceError;
use crate::http::{
    base_url, build_client, decode_json, read_success_body, transport_error, SuccessBody,
};

use super::{ContentFile, TorrentSnapshot, TorrentState, TorrentStore};

const SERVICE: &str = "qbittorrent";

/// qBittorrent client implementation.
pub struct QBittorrentClient {
    client: Client,
    config: QBittorrentConfig,
    /// Set once a login succeeded (the cookie jar holds the SID).
    session: Arc<RwLock<Option<String>>>,
}

impl QBittorrentClient {
    /// Create a new qBittorrent client.
    pub fn new(config: QBittorrentConfig) -> Result<Self, ServiceError> {
        let client = build_client(SERVICE, config.timeout_secs, true)?;

        Ok(Self {
            client,
            config,
            session: Arc::new(RwLock::new(None)),
        })
    }

    fn base_url(&self) -> &str {
        base_url(&self.config.url)
    }

    fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.config.username, &self.config.password) {
            (Some(username), Some(password)) if !username.is_empty() => {
                Some((username.as_str(), password.as_str()))
            }
            _ => None,
        }
    }

    /// Login and store session cookie.
    async fn login(&self) -> Result<(), ServiceError> {
        let Some((username, password)) = self.credentials() else {
            return Ok(());
        };

        let url = format!("{}/api/v2/auth/login", self.base_url());
        let params = [("username", username), ("password", password)];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(transport_error(SERVICE))?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error(SERVICE))?;

        if status.is_success() && body.contains("Ok.") {
            debug!("qBittorrent login successful");
            let mut session = self.session.write().await;
            *session = Some("authenticated".to_string());
            Ok(())
        } else {
            Err(ServiceError::upstream_with_reason(
                SERVICE,
                status.as_u16(),
                "login rejected",
                body,
            ))
        }
    }

    /// Ensure we have a valid session, logging in if needed.
    async fn ensure_authenticated(&self) -> Result<(), ServiceError> {
        if self.credentials().is_none() {
            return Ok(());
        }
        let session = self.session.read().await;
        if session.is_some() {
            return Ok(());
        }
        drop(session);
        self.login().await
    }

    /// Send a request, re-authenticating once on HTTP 403.
    async fn send<F>(&self, build: F) -> Result<SuccessBody, ServiceError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        self.ensure_authenticated().await?;

        let response = build(&self.client)
            .send()
            .await
            .map_err(transport_error(SERVICE))?;

        if response.status() == StatusCode::FORBIDDEN && self.credentials().is_some() {
            warn!("qBittorrent session expired, re-authenticating");
            {
                let mut session = self.session.write().await;
                *session = None;
            }
            self.login().await?;

            let response = build(&self.client)
                .send()
                .await
                .map_err(transport_error(SERVICE))?;
            return read_success_body(SERVICE, response).await;
        }

        read_success_body(SERVICE, response).await
    }

    async fn get(&self, endpoint: &str) -> Result<SuccessBody, ServiceError> {
        let url = format!("{}{}", self.base_url(), endpoint);
        self.send(|client| client.get(&url)).await
    }

    async fn post_form(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<SuccessBody, ServiceError> {
        let url = format!("{}{}", self.base_url(), endpoint);
        self.send(|client| client.post(&url).form(params)).await
    }
}

/// qBittorrent torrent info response.
#[derive(Debug, Deserialize)]
struct QBTorrentInfo {
    hash: String,
    name: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    progress: f64,
    #[serde(default)]
    size: i64,
    #[serde(default)]
    save_path: String,
    #[serde(default)]
    content_path: String,
    #[serde(default)]
    category: String,
    /// Comma-separated tag list.
    #[serde(default)]
    tags: String,
    #[serde(default)]
    added_on: i64,
    #[serde(default)]
    completion_on: i64,
}

impl QBTorrentInfo {
    fn into_snapshot(self) -> TorrentSnapshot {
        TorrentSnapshot {
            hash: self.hash.to_lowercase(),
            name: self.name,
            state: parse_qb_state(&self.state),
            category: non_empty(self.category),
            tags: split_tags(&self.tags),
            progress: self.progress,
            size_bytes: self.size.max(0) as u64,
            save_path: self.save_path,
            content_path: non_empty(self.content_path),
            added_at: timestamp_to_datetime(self.added_on),
            completed_at: timestamp_to_datetime(self.completion_on),
        }
    }
}

/// Entry of `/api/v2/torrents/files`.
#[derive(Debug, Deserialize)]
struct QBFile {
    /// Path relative to the save path.
    name: String,
    #[serde(default)]
    progress: f64,
}

/// Parse qBittorrent state string to TorrentState.
fn parse_qb_state(state: &str) -> TorrentState {
    match state {
        "downloading" | "forcedDL" | "metaDL" | "allocating" => TorrentState::Downloading,
        "uploading" | "forcedUP" => TorrentState::Seeding,
        "pausedDL" | "pausedUP" | "stoppedDL" | "stoppedUP" => TorrentState::Stopped,
        "checkingDL" | "checkingUP" | "checkingResumeData" | "moving" => TorrentState::Checking,
        "queuedDL" | "queuedUP" => TorrentState::Queued,
        "stalledDL" | "stalledUP" => TorrentState::Stalled,
        "error" | "missingFiles" => TorrentState::Error,
        _ => TorrentState::Unknown,
    }
}

fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Convert Unix timestamp to DateTime<Utc>.
fn timestamp_to_datetime(ts: i64) -> Option<DateTime<Utc>> {
    if ts > 0 {
        Utc.timestamp_opt(ts, 0).single()
    } else {
        None
    }
}

#[async_trait]
impl TorrentStore for QBittorrentClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn ping(&self) -> Result<(), ServiceError> {
        self.get("/api/v2/app/defaultSavePath").await?;
        Ok(())
    }

    async fn list_torrents(&self) -> Result<Vec<TorrentSnapshot>, ServiceError> {
        let body = self.get("/api/v2/torrents/info").await?;
        let torrents: Vec<QBTorrentInfo> = decode_json(SERVICE, body)?;
        Ok(torrents.into_iter().map(|t| t.into_snapshot()).collect())
    }

    async fn add_tags(&self, hash: &str, tags: &[String]) -> Result<(), ServiceError> {
        let joined = tags.join(",");
        self.post_form(
            "/api/v2/torrents/addTags",
            &[("hashes", hash), ("tags", &joined)],
        )
        .await?;
        Ok(())
    }

    async fn remove_tags(&self, hash: &str, tags: &[String]) -> Result<(), ServiceError> {
        let joined = tags.join(",");
        self.post_form(
            "/api/v2/torrents/removeTags",
            &[("hashes", hash), ("tags", &joined)],
        )
        .await?;
        Ok(())
    }

    async fn stop_torrent(&self, hash: &str) -> Result<(), ServiceError> {
        match self
            .post_form("/api/v2/torrents/stop", &[("hashes", hash)])
            .await
        {
            Ok(_) => Ok(()),
            // qBittorrent 4.x only knows "pause"
            Err(e) if e.status() == Some(404) => {
                debug!(hash = %hash, "stop endpoint missing, falling back to pause");
                self.post_form("/api/v2/torrents/pause", &[("hashes", hash)])
                    .await?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn content_files(&self, hash: &str) -> Result<Vec<ContentFile>, ServiceError> {
        let endpoint = format!("/api/v2/torrents/files?hash={}", urlencoding::encode(hash));
        let body = self.get(&endpoint).await?;
        let files: Vec<QBFile> = decode_json(SERVICE, body)?;
        Ok(files
            .into_iter()
            .map(|f| ContentFile::new(f.name, f.progress))
            .collect())
    }

    async fn remove_torrent(&self, hash: &str, delete_files: bool) -> Result<(), ServiceError> {
        let delete_str = if delete_files { "true" } else { "false" };
        self.post_form(
            "/api/v2/torrents/delete",
            &[("hashes", hash), ("deleteFiles", delete_str)],
        )
        .await?;
        Ok(())
    }
}
