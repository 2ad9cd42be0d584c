//! Jellyfin library index.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::debug;

use crate::config::JellyfinConfig;
use crate::error::ServiceError;
use crate::http::{
    base_url, build_client, decode_json, read_success_body, transport_error, SuccessBody,
};

use super::{ItemFilter, LibraryIndex, LibraryItem, SubtitleOutcome};

const SERVICE: &str = "jellyfin";
const TOKEN_HEADER: &str = "X-Emby-Token";

/// Jellyfin client authenticated with an API key.
pub struct JellyfinClient {
    client: Client,
    config: JellyfinConfig,
}

impl JellyfinClient {
    pub fn new(config: JellyfinConfig) -> Result<Self, ServiceError> {
        let client = build_client(SERVICE, config.timeout_secs, false)?;
        Ok(Self { client, config })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", base_url(&self.config.url), endpoint)
    }

    async fn send(&self, request: RequestBuilder) -> Result<SuccessBody, ServiceError> {
        let response = request
            .header(TOKEN_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(transport_error(SERVICE))?;
        read_success_body(SERVICE, response).await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemsResponse {
    #[serde(default)]
    items: Vec<JellyfinItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JellyfinItem {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    media_streams: Vec<MediaStream>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MediaStream {
    #[serde(rename = "Type", default)]
    stream_type: String,
    #[serde(default)]
    language: Option<String>,
}

impl JellyfinItem {
    fn into_library_item(self) -> LibraryItem {
        let subtitle_languages = self
            .media_streams
            .into_iter()
            .filter(|s| s.stream_type == "Subtitle")
            .filter_map(|s| s.language)
            .collect();

        LibraryItem {
            id: self.id,
            name: self.name,
            path: self.path,
            subtitle_languages,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RemoteSubtitle {
    id: String,
}

#[async_trait]
impl LibraryIndex for JellyfinClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn refresh(&self) -> Result<(), ServiceError> {
        self.send(self.client.post(self.url("/Library/Refresh")))
            .await?;
        debug!("Library refresh requested");
        Ok(())
    }

    async fn list_items(&self, filter: &ItemFilter) -> Result<Vec<LibraryItem>, ServiceError> {
        let types = filter
            .item_types
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let endpoint = format!(
            "/Items?Recursive=true&IncludeItemTypes={}&Fields=Path,MediaStreams",
            types
        );

        let body = self.send(self.client.get(self.url(&endpoint))).await?;
        let response: ItemsResponse = decode_json(SERVICE, body)?;
        Ok(response
            .items
            .into_iter()
            .map(|i| i.into_library_item())
            .collect())
    }

    async fn download_subtitles(
        &self,
        item_id: &str,
        language: &str,
    ) -> Result<SubtitleOutcome, ServiceError> {
        let item_id = urlencoding::encode(item_id);
        let search = format!(
            "/Items/{}/RemoteSearch/Subtitles/{}",
            item_id,
            urlencoding::encode(language)
        );

        let body = self.send(self.client.get(self.url(&search))).await?;
        let results: Vec<RemoteSubtitle> = decode_json(SERVICE, body)?;

        let Some(first) = results.into_iter().next() else {
            return Ok(SubtitleOutcome::NotFound);
        };

        let download = format!(
            "/Items/{}/RemoteSearch/Subtitles/{}",
            item_id,
            urlencoding::encode(&first.id)
        );
        self.send(self.client.post(self.url(&download))).await?;
        Ok(SubtitleOutcome::Downloaded)
    }
}
