//! Projection of the service's ranked top-lists into uniform entries.
//!
//! The service's ranking is authoritative: projection changes shape only.
//! Entries are never reordered, filtered, deduplicated, or rescaled, so the
//! output sequence is the input sequence row for row.

use super::records::{AlbumRef, ArtistRef, RankedEntry, TrackRef};
use super::wire::{parse_weight, RawTopAlbum, RawTopArtist, RawTopTrack};

pub fn project_top_albums(raw: Vec<RawTopAlbum>) -> Vec<RankedEntry<AlbumRef>> {
    raw.into_iter()
        .map(|album| RankedEntry {
            weight: parse_weight(album.playcount),
            item: AlbumRef {
                artist: album.artist.and_then(|artist| artist.name),
                title: album.name.unwrap_or_default(),
            },
        })
        .collect()
}

pub fn project_top_artists(raw: Vec<RawTopArtist>) -> Vec<RankedEntry<ArtistRef>> {
    raw.into_iter()
        .map(|artist| RankedEntry {
            weight: parse_weight(artist.playcount),
            item: ArtistRef {
                name: artist.name.unwrap_or_default(),
            },
        })
        .collect()
}

pub fn project_top_tracks(raw: Vec<RawTopTrack>) -> Vec<RankedEntry<TrackRef>> {
    raw.into_iter()
        .map(|track| RankedEntry {
            weight: parse_weight(track.playcount),
            item: TrackRef {
                artist: track.artist.and_then(|artist| artist.name),
                title: track.name.unwrap_or_default(),
            },
        })
        .collect()
}
