//! Best-effort linkage of playback snapshots into an external music catalog.
//!
//! The catalog has no relationship with the scrobbling service, so all we
//! can do is search it and take the top hit. Links produced here are
//! candidates, never verified identities.

pub mod client;
pub mod matcher;

pub use client::{CatalogClient, CatalogSearch, SearchKind};
pub use matcher::find_candidate_link;

use thiserror::Error;

/// A canonical reference into the external catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogLink {
    pub url: String,
}

/// Errors surfaced by the catalog-service collaborator.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Transport-level failure (connect, timeout, TLS). Retryable upstream.
    #[error("catalog service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered, but not with anything we can interpret.
    #[error("unexpected catalog service payload: {0}")]
    Payload(String),
}
