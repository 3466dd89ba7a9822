//! Resolution of a user's current playback state.

use super::client::ScrobbleService;
use super::records::PlaybackSnapshot;
use super::ScrobbleError;

/// Fetches and classifies the current playback state for `handle`.
///
/// `None` means idle; `Some` carries whichever artist/album/track fields the
/// service reported, plus a cover URL when one is available. Callers must
/// not do any further resolution work (catalog matching included) on `None`.
///
/// Precondition: `handle` is a bound external identity. Looking it up is the
/// caller's job; this function never sees internal user ids.
pub async fn resolve(
    service: &dyn ScrobbleService,
    handle: &str,
) -> Result<Option<PlaybackSnapshot>, ScrobbleError> {
    let raw = service.now_playing(handle).await?;
    Ok(raw.and_then(|track| track.into_snapshot()))
}
