//! Snapshot-to-catalog matching.

use crate::scrobble::records::{AlbumRef, PlaybackSnapshot, TrackRef};

use super::client::{CatalogSearch, SearchKind};
use super::{CatalogError, CatalogLink};

/// Resolves an active playback snapshot to a candidate catalog link.
///
/// The album takes priority over the track: when both are present only the
/// album is searched. With neither present no search is issued at all.
/// Exactly the first result is considered; an empty result list is a normal
/// "no match" outcome, not an error. The returned URL is whatever the
/// catalog ranked first for a name search. It is a best-effort candidate and
/// callers must present it as such.
pub async fn find_candidate_link(
    catalog: &dyn CatalogSearch,
    snapshot: &PlaybackSnapshot,
) -> Result<Option<CatalogLink>, CatalogError> {
    let (query, kind) = if let Some(album) = &snapshot.album {
        (album_query(album), SearchKind::Album)
    } else if let Some(track) = &snapshot.track {
        (track_query(track), SearchKind::Track)
    } else {
        return Ok(None);
    };

    let results = catalog.search(&query, kind).await?;

    Ok(results
        .into_iter()
        .next()
        .and_then(|first| first.external_urls)
        .and_then(|urls| urls.spotify)
        .map(|url| CatalogLink { url }))
}

fn album_query(album: &AlbumRef) -> String {
    match &album.artist {
        Some(artist) => format!("{} {}", artist, album.title),
        None => album.title.clone(),
    }
}

fn track_query(track: &TrackRef) -> String {
    match &track.artist {
        Some(artist) => format!("{} {}", artist, track.title),
        None => track.title.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_link::client::{ExternalUrls, RawSearchResult};
    use crate::scrobble::records::ArtistRef;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingCatalog {
        calls: Mutex<Vec<(String, SearchKind)>>,
        results: Vec<RawSearchResult>,
    }

    impl RecordingCatalog {
        fn returning(results: Vec<RawSearchResult>) -> Self {
            Self {
                calls: Mutex::new(vec![]),
                results,
            }
        }

        fn empty() -> Self {
            Self::returning(vec![])
        }

        fn calls(&self) -> Vec<(String, SearchKind)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CatalogSearch for RecordingCatalog {
        async fn search(
            &self,
            query: &str,
            kind: SearchKind,
        ) -> Result<Vec<RawSearchResult>, CatalogError> {
            self.calls.lock().unwrap().push((query.to_string(), kind));
            Ok(self.results.clone())
        }
    }

    fn hit(url: &str) -> RawSearchResult {
        RawSearchResult {
            name: Some("hit".to_string()),
            external_urls: Some(ExternalUrls {
                spotify: Some(url.to_string()),
            }),
        }
    }

    fn snapshot(album: Option<AlbumRef>, track: Option<TrackRef>) -> PlaybackSnapshot {
        PlaybackSnapshot {
            artist: Some(ArtistRef {
                name: "Can".to_string(),
            }),
            album,
            track,
            cover_url: None,
        }
    }

    #[tokio::test]
    async fn album_wins_over_track_when_both_present() {
        let catalog = RecordingCatalog::returning(vec![hit("https://catalog/album")]);
        let snapshot = snapshot(
            Some(AlbumRef {
                artist: Some("Can".to_string()),
                title: "Tago Mago".to_string(),
            }),
            Some(TrackRef {
                artist: Some("Can".to_string()),
                title: "Halleluhwah".to_string(),
            }),
        );

        let link = find_candidate_link(&catalog, &snapshot).await.unwrap();
        assert_eq!(link.unwrap().url, "https://catalog/album");

        let calls = catalog.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], ("Can Tago Mago".to_string(), SearchKind::Album));
    }

    #[tokio::test]
    async fn falls_back_to_track_when_album_absent() {
        let catalog = RecordingCatalog::returning(vec![hit("https://catalog/track")]);
        let snapshot = snapshot(
            None,
            Some(TrackRef {
                artist: Some("Can".to_string()),
                title: "Vitamin C".to_string(),
            }),
        );

        let link = find_candidate_link(&catalog, &snapshot).await.unwrap();
        assert_eq!(link.unwrap().url, "https://catalog/track");

        let calls = catalog.calls();
        assert_eq!(calls, vec![("Can Vitamin C".to_string(), SearchKind::Track)]);
    }

    #[tokio::test]
    async fn no_searchable_reference_means_no_call() {
        let catalog = RecordingCatalog::empty();
        let snapshot = snapshot(None, None);

        let link = find_candidate_link(&catalog, &snapshot).await.unwrap();
        assert!(link.is_none());
        assert!(catalog.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_result_list_is_absent_not_error() {
        let catalog = RecordingCatalog::empty();
        let snapshot = snapshot(
            Some(AlbumRef {
                artist: None,
                title: "Future Days".to_string(),
            }),
            None,
        );

        let link = find_candidate_link(&catalog, &snapshot).await.unwrap();
        assert!(link.is_none());
        assert_eq!(catalog.calls().len(), 1);
    }

    #[tokio::test]
    async fn takes_only_the_first_result() {
        let catalog = RecordingCatalog::returning(vec![
            hit("https://catalog/first"),
            hit("https://catalog/second"),
        ]);
        let snapshot = snapshot(
            Some(AlbumRef {
                artist: None,
                title: "Soundtracks".to_string(),
            }),
            None,
        );

        let link = find_candidate_link(&catalog, &snapshot).await.unwrap();
        assert_eq!(link.unwrap().url, "https://catalog/first");
    }

    #[tokio::test]
    async fn first_result_without_url_is_absent() {
        let catalog = RecordingCatalog::returning(vec![RawSearchResult {
            name: Some("linkless".to_string()),
            external_urls: None,
        }]);
        let snapshot = snapshot(
            Some(AlbumRef {
                artist: None,
                title: "Monster Movie".to_string(),
            }),
            None,
        );

        let link = find_candidate_link(&catalog, &snapshot).await.unwrap();
        assert!(link.is_none());
    }
}
