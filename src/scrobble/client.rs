//! HTTP client for the scrobbling service's JSON API.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::period::Period;
use super::wire::{
    ApiErrorBody, RecentTrack, RecentTracksEnvelope, TopAlbumsEnvelope, TopArtistsEnvelope,
    TopTracksEnvelope, RawTopAlbum, RawTopArtist, RawTopTrack, ERROR_CODE_UNKNOWN_USER,
};
use super::ScrobbleError;

/// Read-side contract against the scrobbling service.
///
/// Each call is a single outbound request; no timeout beyond the client's
/// own is imposed here and nothing is retried.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait ScrobbleService: Send + Sync {
    /// The raw in-progress track for `handle`, or `None` when idle.
    async fn now_playing(&self, handle: &str) -> Result<Option<RecentTrack>, ScrobbleError>;

    /// Ranked albums for `handle` over `period`, in the service's order.
    async fn top_albums(
        &self,
        handle: &str,
        period: Period,
    ) -> Result<Vec<RawTopAlbum>, ScrobbleError>;

    /// Ranked artists for `handle` over `period`, in the service's order.
    async fn top_artists(
        &self,
        handle: &str,
        period: Period,
    ) -> Result<Vec<RawTopArtist>, ScrobbleError>;

    /// Ranked tracks for `handle` over `period`, in the service's order.
    async fn top_tracks(
        &self,
        handle: &str,
        period: Period,
    ) -> Result<Vec<RawTopTrack>, ScrobbleError>;
}

/// Client for the Last.fm-compatible `2.0` API.
pub struct LastfmClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl LastfmClient {
    pub fn new(base_url: &str, api_key: &str, timeout_sec: u64) -> Result<Self, ScrobbleError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issues one API method call and decodes the enveloped response.
    ///
    /// The service reports domain errors as a JSON `{"error", "message"}`
    /// body, sometimes with a 2xx status, so the body is inspected for an
    /// error document before the expected envelope is parsed.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        handle: &str,
        extra: &str,
    ) -> Result<T, ScrobbleError> {
        let url = format!(
            "{}?method={}&user={}&api_key={}&format=json{}",
            self.base_url,
            method,
            urlencoding::encode(handle),
            self.api_key,
            extra
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if let Ok(error_body) = serde_json::from_slice::<ApiErrorBody>(&bytes) {
            if let Some(code) = error_body.error {
                if code == ERROR_CODE_UNKNOWN_USER {
                    return Err(ScrobbleError::UnknownUser(handle.to_string()));
                }
                return Err(ScrobbleError::Payload(format!(
                    "error {}: {}",
                    code,
                    error_body.message.unwrap_or_default()
                )));
            }
        }

        if !status.is_success() {
            return Err(ScrobbleError::Payload(format!("status {}", status)));
        }

        serde_json::from_slice(&bytes).map_err(|err| ScrobbleError::Payload(err.to_string()))
    }
}

#[async_trait]
impl ScrobbleService for LastfmClient {
    async fn now_playing(&self, handle: &str) -> Result<Option<RecentTrack>, ScrobbleError> {
        let envelope: RecentTracksEnvelope = self
            .call("user.getrecenttracks", handle, "&limit=1")
            .await?;

        // Only the head of the recent list can be in progress; a finished
        // track there means the user is idle.
        Ok(envelope
            .recenttracks
            .map(|list| list.track)
            .unwrap_or_default()
            .into_iter()
            .find(RecentTrack::is_now_playing))
    }

    async fn top_albums(
        &self,
        handle: &str,
        period: Period,
    ) -> Result<Vec<RawTopAlbum>, ScrobbleError> {
        let extra = format!("&period={}", period.as_api_token());
        let envelope: TopAlbumsEnvelope = self.call("user.gettopalbums", handle, &extra).await?;
        Ok(envelope
            .topalbums
            .map(|list| list.album)
            .unwrap_or_default())
    }

    async fn top_artists(
        &self,
        handle: &str,
        period: Period,
    ) -> Result<Vec<RawTopArtist>, ScrobbleError> {
        let extra = format!("&period={}", period.as_api_token());
        let envelope: TopArtistsEnvelope = self.call("user.gettopartists", handle, &extra).await?;
        Ok(envelope
            .topartists
            .map(|list| list.artist)
            .unwrap_or_default())
    }

    async fn top_tracks(
        &self,
        handle: &str,
        period: Period,
    ) -> Result<Vec<RawTopTrack>, ScrobbleError> {
        let extra = format!("&period={}", period.as_api_token());
        let envelope: TopTracksEnvelope = self.call("user.gettoptracks", handle, &extra).await?;
        Ok(envelope
            .toptracks
            .map(|list| list.track)
            .unwrap_or_default())
    }
}
