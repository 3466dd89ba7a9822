//! HTTP client for the external catalog's search API.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::CatalogError;

/// Which catalog index a search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Album,
    Track,
}

impl SearchKind {
    pub fn as_query_param(&self) -> &'static str {
        match self {
            SearchKind::Album => "album",
            SearchKind::Track => "track",
        }
    }
}

/// One search hit, relevance-ordered by the catalog itself.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSearchResult {
    pub name: Option<String>,
    pub external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    albums: Option<SearchPage>,
    tracks: Option<SearchPage>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    items: Vec<RawSearchResult>,
}

/// Search contract against the external catalog.
///
/// Results come back in the catalog's own relevance order; consumers here
/// only ever look at the head of the list.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        kind: SearchKind,
    ) -> Result<Vec<RawSearchResult>, CatalogError>;
}

/// Client for a Spotify-shaped `/v1/search` endpoint.
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

const SEARCH_RESULT_LIMIT: usize = 5;

impl CatalogClient {
    pub fn new(base_url: &str, bearer_token: &str, timeout_sec: u64) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: bearer_token.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CatalogSearch for CatalogClient {
    async fn search(
        &self,
        query: &str,
        kind: SearchKind,
    ) -> Result<Vec<RawSearchResult>, CatalogError> {
        let url = format!(
            "{}/v1/search?q={}&type={}&limit={}",
            self.base_url,
            urlencoding::encode(query),
            kind.as_query_param(),
            SEARCH_RESULT_LIMIT
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Payload(format!("status {}", status)));
        }

        let envelope: SearchEnvelope = response
            .json()
            .await
            .map_err(|err| CatalogError::Payload(err.to_string()))?;

        let page = match kind {
            SearchKind::Album => envelope.albums,
            SearchKind::Track => envelope.tracks,
        };
        Ok(page.map(|page| page.items).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_slash_from_base_url() {
        let client = CatalogClient::new("https://catalog.example/", "token", 30).unwrap();
        assert_eq!(client.base_url(), "https://catalog.example");
    }

    #[test]
    fn deserializes_album_search_page() {
        let json = r#"{
            "albums": {
                "items": [
                    {"name": "Tago Mago",
                     "external_urls": {"spotify": "https://catalog.example/album/1"}},
                    {"name": "Ege Bamyasi", "external_urls": {}}
                ]
            }
        }"#;

        let envelope: SearchEnvelope = serde_json::from_str(json).unwrap();
        let items = envelope.albums.unwrap().items;
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0]
                .external_urls
                .as_ref()
                .unwrap()
                .spotify
                .as_deref(),
            Some("https://catalog.example/album/1")
        );
        assert!(items[1].external_urls.as_ref().unwrap().spotify.is_none());
    }
}
