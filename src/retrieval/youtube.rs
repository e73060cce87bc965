use serde::{Deserialize, Serialize};

use super::credentials::{CredentialPool, ProviderError};

const PROVIDER: &str = "youtube";
const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

pub const DEFAULT_VIDEO_COUNT: u32 = 3;
pub const VIDEO_COUNT_STEP: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoResult {
    pub title: String,
    pub thumbnail_url: String,
    pub video_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchSnippet {
    title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl SearchItem {
    fn into_video(self) -> Option<VideoResult> {
        let video_id = self.id.video_id?;
        let thumbnails = self.snippet.thumbnails;
        let thumbnail_url = thumbnails
            .high
            .or(thumbnails.medium)
            .or(thumbnails.default)
            .map(|t| t.url)
            .unwrap_or_default();

        Some(VideoResult {
            title: self.snippet.title,
            thumbnail_url,
            video_url: format!("{}{}", WATCH_URL, video_id),
        })
    }
}

/// Medium-length video search over a rotated key pool.
#[derive(Debug, Clone)]
pub struct VideoClient {
    client: reqwest::Client,
    pool: CredentialPool,
    api_url: String,
}

impl VideoClient {
    pub fn new(client: reqwest::Client, pool: CredentialPool, api_url: &str) -> Self {
        Self {
            client,
            pool,
            api_url: api_url.to_string(),
        }
    }

    /// Videos in provider relevance order; empty when every key fails.
    pub async fn search(&self, query: &str, max_results: u32) -> Vec<VideoResult> {
        match self.try_search(query, max_results).await {
            Ok(videos) => videos,
            Err(e) => {
                tracing::warn!(error = %e, query, "video lookup degraded to no results");
                Vec::new()
            }
        }
    }

    pub async fn try_search(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<VideoResult>, ProviderError> {
        self.pool
            .first_success(|key| self.search_with_key(key, query, max_results))
            .await
    }

    async fn search_with_key(
        &self,
        key: String,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<VideoResult>, ProviderError> {
        let max_results = max_results.to_string();
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("q", query),
                ("part", "snippet"),
                ("type", "video"),
                ("order", "relevance"),
                ("videoDuration", "medium"),
                ("maxResults", max_results.as_str()),
                ("key", key.as_str()),
            ])
            .send()
            .await
            .map_err(ProviderError::transport(PROVIDER))?;

        let listing: SearchListResponse = ProviderError::check(PROVIDER, response)
            .await?
            .json()
            .await
            .map_err(ProviderError::decode(PROVIDER))?;

        Ok(listing
            .items
            .into_iter()
            .filter_map(SearchItem::into_video)
            .collect())
    }
}
