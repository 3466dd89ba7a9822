//! Uniform records produced from scrobble-service payloads.
//!
//! These are per-request value types: each resolution builds a fresh set and
//! hands it to the serialization layer, nothing here is shared or cached.

/// An artist, stripped down to what the rest of the pipeline needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistRef {
    pub name: String,
}

/// An album, with its artist when the source payload carries one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumRef {
    pub artist: Option<String>,
    pub title: String,
}

/// A track, with its artist when the source payload carries one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRef {
    pub artist: Option<String>,
    pub title: String,
}

/// An in-progress playback event.
///
/// Absence of a snapshot altogether means the user is idle; a snapshot is
/// only ever built when the service reports active playback, and it carries
/// at least a track or an album reference. The artist/album/track fields are
/// independently optional because the source reports them independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub artist: Option<ArtistRef>,
    pub album: Option<AlbumRef>,
    pub track: Option<TrackRef>,
    pub cover_url: Option<String>,
}

/// One row of a ranked top-N listing.
///
/// `weight` is the play count exactly as reported by the source; sequences
/// of entries keep the source's rank order and are never re-sorted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry<T> {
    pub item: T,
    pub weight: u64,
}
