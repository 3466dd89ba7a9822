//! Scrobbling-service integration: typed time windows, the outbound API
//! client, and the logic that turns the service's heterogeneous payloads
//! into uniform records.

pub mod charts;
pub mod client;
pub mod now_playing;
pub mod period;
pub mod records;
pub mod wire;

pub use client::{LastfmClient, ScrobbleService};
pub use period::Period;
pub use records::{AlbumRef, ArtistRef, PlaybackSnapshot, RankedEntry, TrackRef};

use thiserror::Error;

/// Errors surfaced by the scrobbling-service collaborator.
#[derive(Debug, Error)]
pub enum ScrobbleError {
    /// The service has no account for the requested handle. Read endpoints
    /// degrade to an idle/empty response on this, they do not fail.
    #[error("scrobble service does not know user '{0}'")]
    UnknownUser(String),

    /// Transport-level failure (connect, timeout, TLS). Retryable upstream.
    #[error("scrobble service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered, but not with anything we can interpret.
    #[error("unexpected scrobble service payload: {0}")]
    Payload(String),
}
