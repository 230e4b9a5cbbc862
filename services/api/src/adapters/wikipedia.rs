//! services/api/src/adapters/wikipedia.rs
//!
//! This module contains the encyclopedia adapter. It implements the
//! `EncyclopediaService` port from the `core` crate against the Wikipedia REST
//! summary endpoint and the MediaWiki action API, using `reqwest`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use study_helper_core::domain::PageSummary;
use study_helper_core::ports::{EncyclopediaService, FetchError};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// Endpoints and limits for [`WikipediaAdapter`].
#[derive(Debug, Clone)]
pub struct WikipediaSettings {
    pub rest_base: String,
    pub action_api: String,
    pub user_agent: String,
    pub lookup_timeout: Duration,
    pub search_timeout: Duration,
}

/// An adapter that implements `EncyclopediaService` over HTTP.
#[derive(Clone)]
pub struct WikipediaAdapter {
    client: Client,
    settings: WikipediaSettings,
}

impl WikipediaAdapter {
    /// Creates a new `WikipediaAdapter`. Every request carries the configured User-Agent.
    pub fn new(settings: WikipediaSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self { client, settings })
    }

    fn summary_url(&self, title: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.settings.rest_base)
            .map_err(|e| FetchError::Transport(format!("invalid summary endpoint: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| {
                FetchError::Transport("summary endpoint cannot be a base URL".to_string())
            })?
            .pop_if_empty()
            .extend(["page", "summary", title]);
        Ok(url)
    }

    async fn get_json<T>(&self, request: reqwest::RequestBuilder) -> Result<T, FetchError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = request.send().await.map_err(map_transport)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Decode(e.to_string())
                }
            })
    }
}

//=========================================================================================
// "Impure" Wire Structs
//=========================================================================================

#[derive(Deserialize)]
struct SummaryRecord {
    extract: Option<String>,
    title: Option<String>,
    content_urls: Option<ContentUrls>,
    thumbnail: Option<Thumbnail>,
}

#[derive(Deserialize)]
struct ContentUrls {
    desktop: Option<PageLink>,
}

#[derive(Deserialize)]
struct PageLink {
    page: Option<String>,
}

#[derive(Deserialize)]
struct Thumbnail {
    source: Option<String>,
}

impl From<SummaryRecord> for PageSummary {
    fn from(record: SummaryRecord) -> Self {
        PageSummary {
            extract: record.extract,
            title: record.title,
            page_url: record
                .content_urls
                .and_then(|urls| urls.desktop)
                .and_then(|desktop| desktop.page),
            thumbnail: record.thumbnail.and_then(|t| t.source),
        }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

/// Opensearch answers `[query, [titles], [descriptions], [urls]]`.
fn opensearch_titles(body: serde_json::Value) -> Result<Vec<String>, FetchError> {
    let titles = body
        .get(1)
        .and_then(|v| v.as_array())
        .ok_or_else(|| FetchError::Decode("opensearch response has no title list".to_string()))?;
    Ok(titles
        .iter()
        .filter_map(|t| t.as_str().map(str::to_string))
        .collect())
}

fn map_transport(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(err.to_string())
    }
}

//=========================================================================================
// `EncyclopediaService` Trait Implementation
//=========================================================================================

#[async_trait]
impl EncyclopediaService for WikipediaAdapter {
    async fn page_summary(&self, title: &str) -> Result<PageSummary, FetchError> {
        let url = self.summary_url(title)?;
        debug!(%url, "requesting page summary");
        let request = self
            .client
            .get(url)
            .timeout(self.settings.lookup_timeout);
        let record: SummaryRecord = self.get_json(request).await?;
        Ok(record.into())
    }

    async fn search_titles(&self, query: &str, limit: u32) -> Result<Vec<String>, FetchError> {
        let limit = limit.to_string();
        let request = self
            .client
            .get(&self.settings.action_api)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
            ])
            .timeout(self.settings.search_timeout);
        let response: SearchResponse = self.get_json(request).await?;
        Ok(response
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default())
    }

    async fn suggest_titles(&self, query: &str, limit: u32) -> Result<Vec<String>, FetchError> {
        let limit = limit.to_string();
        let request = self
            .client
            .get(&self.settings.action_api)
            .query(&[
                ("action", "opensearch"),
                ("format", "json"),
                ("search", query),
                ("limit", limit.as_str()),
            ])
            .timeout(self.settings.search_timeout);
        let body: serde_json::Value = self.get_json(request).await?;
        opensearch_titles(body)
    }
}
