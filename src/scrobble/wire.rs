//! Raw JSON shapes of the scrobbling service's API.
//!
//! The service wraps almost everything in single-key envelopes and encodes
//! numbers as strings; these types match that layout verbatim and convert
//! into the uniform records the rest of the crate works with.

use serde::Deserialize;

use super::records::{AlbumRef, ArtistRef, PlaybackSnapshot, TrackRef};

/// Error body the service returns instead of the requested document.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: Option<i64>,
    pub message: Option<String>,
}

/// The service's error code for an unknown user handle.
pub const ERROR_CODE_UNKNOWN_USER: i64 = 6;

/// A `{"#text": "..."}` node, used for artist and album names on recent
/// tracks.
#[derive(Debug, Deserialize)]
pub struct TextNode {
    #[serde(rename = "#text")]
    pub text: Option<String>,
}

/// A `{"name": "..."}` node, used on top-list entries.
#[derive(Debug, Deserialize)]
pub struct NamedNode {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImageNode {
    pub size: Option<String>,
    #[serde(rename = "#text")]
    pub url: Option<String>,
}

// =============================================================================
// Recent tracks (now playing)
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RecentTracksEnvelope {
    pub recenttracks: Option<RecentTracksList>,
}

#[derive(Debug, Deserialize)]
pub struct RecentTracksList {
    #[serde(default)]
    pub track: Vec<RecentTrack>,
}

#[derive(Debug, Deserialize)]
pub struct RecentTrack {
    pub name: Option<String>,
    pub artist: Option<TextNode>,
    pub album: Option<TextNode>,
    #[serde(default)]
    pub image: Vec<ImageNode>,
    #[serde(rename = "@attr")]
    pub attr: Option<RecentTrackAttr>,
}

#[derive(Debug, Deserialize)]
pub struct RecentTrackAttr {
    pub nowplaying: Option<String>,
}

impl RecentTrack {
    /// The service marks the in-progress track with a string-typed attribute
    /// rather than a boolean.
    pub fn is_now_playing(&self) -> bool {
        self.attr
            .as_ref()
            .and_then(|attr| attr.nowplaying.as_deref())
            .map(|flag| flag == "true")
            .unwrap_or(false)
    }

    /// Converts this raw track into a playback snapshot.
    ///
    /// Empty strings in the payload count as absent. Returns `None` when
    /// neither a track title nor an album title survives, since a snapshot
    /// with no work reference is useless to every consumer.
    pub fn into_snapshot(self) -> Option<PlaybackSnapshot> {
        let artist_name = self.artist.and_then(|node| non_empty(node.text));
        let album_title = self.album.and_then(|node| non_empty(node.text));
        let track_title = non_empty(self.name);

        if album_title.is_none() && track_title.is_none() {
            return None;
        }

        // The image list is ordered smallest first; the last usable URL is
        // the largest rendition.
        let cover_url = self
            .image
            .into_iter()
            .filter_map(|image| non_empty(image.url))
            .last();

        Some(PlaybackSnapshot {
            album: album_title.map(|title| AlbumRef {
                artist: artist_name.clone(),
                title,
            }),
            track: track_title.map(|title| TrackRef {
                artist: artist_name.clone(),
                title,
            }),
            artist: artist_name.map(|name| ArtistRef { name }),
            cover_url,
        })
    }
}

// =============================================================================
// Top lists
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct TopAlbumsEnvelope {
    pub topalbums: Option<TopAlbumsList>,
}

#[derive(Debug, Deserialize)]
pub struct TopAlbumsList {
    #[serde(default)]
    pub album: Vec<RawTopAlbum>,
}

#[derive(Debug, Deserialize)]
pub struct RawTopAlbum {
    pub name: Option<String>,
    pub playcount: Option<String>,
    pub artist: Option<NamedNode>,
}

#[derive(Debug, Deserialize)]
pub struct TopArtistsEnvelope {
    pub topartists: Option<TopArtistsList>,
}

#[derive(Debug, Deserialize)]
pub struct TopArtistsList {
    #[serde(default)]
    pub artist: Vec<RawTopArtist>,
}

#[derive(Debug, Deserialize)]
pub struct RawTopArtist {
    pub name: Option<String>,
    pub playcount: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopTracksEnvelope {
    pub toptracks: Option<TopTracksList>,
}

#[derive(Debug, Deserialize)]
pub struct TopTracksList {
    #[serde(default)]
    pub track: Vec<RawTopTrack>,
}

#[derive(Debug, Deserialize)]
pub struct RawTopTrack {
    pub name: Option<String>,
    pub playcount: Option<String>,
    pub artist: Option<NamedNode>,
}

/// Play counts arrive as decimal strings; anything unparsable counts as 0.
pub(crate) fn parse_weight(playcount: Option<String>) -> u64 {
    playcount
        .as_deref()
        .and_then(|count| count.parse().ok())
        .unwrap_or(0)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_now_playing_track() {
        let json = r##"{
            "recenttracks": {
                "track": [{
                    "artist": {"mbid": "", "#text": "Kate Bush"},
                    "album": {"mbid": "", "#text": "Hounds of Love"},
                    "name": "Running Up That Hill",
                    "image": [
                        {"size": "small", "#text": "https://img/s.png"},
                        {"size": "extralarge", "#text": "https://img/xl.png"}
                    ],
                    "@attr": {"nowplaying": "true"}
                }]
            }
        }"##;

        let envelope: RecentTracksEnvelope = serde_json::from_str(json).unwrap();
        let track = envelope
            .recenttracks
            .unwrap()
            .track
            .into_iter()
            .next()
            .unwrap();
        assert!(track.is_now_playing());

        let snapshot = track.into_snapshot().unwrap();
        assert_eq!(snapshot.artist.unwrap().name, "Kate Bush");
        assert_eq!(snapshot.album.as_ref().unwrap().title, "Hounds of Love");
        assert_eq!(
            snapshot.album.unwrap().artist.as_deref(),
            Some("Kate Bush")
        );
        assert_eq!(snapshot.track.unwrap().title, "Running Up That Hill");
        assert_eq!(snapshot.cover_url.as_deref(), Some("https://img/xl.png"));
    }

    #[test]
    fn finished_track_is_not_now_playing() {
        let json = r##"{"name": "Cloudbusting", "artist": {"#text": "Kate Bush"}}"##;
        let track: RecentTrack = serde_json::from_str(json).unwrap();
        assert!(!track.is_now_playing());
    }

    #[test]
    fn empty_fields_count_as_absent() {
        let json = r##"{
            "name": "Delia's Gone",
            "artist": {"#text": ""},
            "album": {"#text": ""},
            "image": [{"size": "small", "#text": ""}]
        }"##;
        let track: RecentTrack = serde_json::from_str(json).unwrap();
        let snapshot = track.into_snapshot().unwrap();
        assert!(snapshot.artist.is_none());
        assert!(snapshot.album.is_none());
        assert!(snapshot.cover_url.is_none());
        assert_eq!(snapshot.track.unwrap().title, "Delia's Gone");
    }

    #[test]
    fn snapshot_requires_a_work_reference() {
        let json = r##"{"artist": {"#text": "Orphaned Artist"}}"##;
        let track: RecentTrack = serde_json::from_str(json).unwrap();
        assert!(track.into_snapshot().is_none());
    }

    #[test]
    fn deserializes_top_albums_with_string_playcounts() {
        let json = r#"{
            "topalbums": {
                "album": [
                    {"name": "Remain in Light", "playcount": "42",
                     "artist": {"name": "Talking Heads"}},
                    {"name": "Fear of Music", "playcount": "oops",
                     "artist": {"name": "Talking Heads"}}
                ]
            }
        }"#;

        let envelope: TopAlbumsEnvelope = serde_json::from_str(json).unwrap();
        let albums = envelope.topalbums.unwrap().album;
        assert_eq!(albums.len(), 2);
        assert_eq!(parse_weight(albums[0].playcount.clone()), 42);
        assert_eq!(parse_weight(albums[1].playcount.clone()), 0);
    }

    #[test]
    fn missing_list_key_deserializes_as_empty() {
        let envelope: TopArtistsEnvelope = serde_json::from_str(r#"{"topartists": {}}"#).unwrap();
        assert!(envelope.topartists.unwrap().artist.is_empty());
    }
}
