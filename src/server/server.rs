use anyhow::Result;
use std::time::Duration;

use tracing::error;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::catalog_link::matcher;
use crate::identity::{
    IdentityError, IdentityPayload, IdentityStore, UpsertOutcome,
};
use crate::scrobble::records::PlaybackSnapshot;
use crate::scrobble::{charts, now_playing, Period, ScrobbleError};

use super::state::*;
use super::{log_requests, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

// =============================================================================
// Listening endpoints
// =============================================================================

#[derive(Deserialize, Debug)]
struct ChartQuery {
    period: Option<String>,
}

#[derive(Serialize)]
struct NowPlayingBody {
    is_active: bool,
    lastfm_user: Option<String>,
    artist_name: Option<String>,
    album_name: Option<String>,
    track_name: Option<String>,
    cover: Option<String>,
    /// Best-effort catalog link for the playing work. This is the first hit
    /// of a name search, not a verified identity.
    url_candidate: Option<String>,
}

impl NowPlayingBody {
    fn idle(lastfm_user: Option<String>) -> Self {
        NowPlayingBody {
            is_active: false,
            lastfm_user,
            artist_name: None,
            album_name: None,
            track_name: None,
            cover: None,
            url_candidate: None,
        }
    }

    fn active(
        lastfm_user: String,
        snapshot: PlaybackSnapshot,
        url_candidate: Option<String>,
    ) -> Self {
        NowPlayingBody {
            is_active: true,
            lastfm_user: Some(lastfm_user),
            artist_name: snapshot.artist.map(|artist| artist.name),
            album_name: snapshot.album.map(|album| album.title),
            track_name: snapshot.track.map(|track| track.title),
            cover: snapshot.cover_url,
            url_candidate,
        }
    }
}

async fn get_now_playing(
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
) -> Response {
    let identity = match state.identities.get(user_id) {
        Ok(identity) => identity,
        Err(err) => return identity_failure(err),
    };
    // No bound identity degrades to an idle response, with no outbound call.
    let Some(identity) = identity else {
        return Json(NowPlayingBody::idle(None)).into_response();
    };

    let snapshot = match now_playing::resolve(state.scrobbler.as_ref(), &identity.username).await
    {
        Ok(snapshot) => snapshot,
        Err(ScrobbleError::UnknownUser(_)) => None,
        Err(err) => return upstream_failure(err.to_string()),
    };
    let Some(snapshot) = snapshot else {
        return Json(NowPlayingBody::idle(Some(identity.username))).into_response();
    };

    let url_candidate = match &state.catalog {
        Some(catalog) => {
            match matcher::find_candidate_link(catalog.as_ref(), &snapshot).await {
                Ok(link) => link.map(|link| link.url),
                Err(err) => return upstream_failure(err.to_string()),
            }
        }
        None => None,
    };

    Json(NowPlayingBody::active(
        identity.username,
        snapshot,
        url_candidate,
    ))
    .into_response()
}

#[derive(Serialize)]
struct TopAlbumsBody {
    lastfm_user: Option<String>,
    top_albums: Vec<TopAlbumRow>,
}

#[derive(Serialize)]
struct TopAlbumRow {
    artist: Option<String>,
    title: String,
    scrobbles: u64,
}

async fn get_top_albums(
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
    Query(query): Query<ChartQuery>,
) -> Response {
    let period = Period::normalize(query.period.as_deref());

    let identity = match state.identities.get(user_id) {
        Ok(identity) => identity,
        Err(err) => return identity_failure(err),
    };
    let Some(identity) = identity else {
        return Json(TopAlbumsBody {
            lastfm_user: None,
            top_albums: vec![],
        })
        .into_response();
    };

    let raw = match state.scrobbler.top_albums(&identity.username, period).await {
        Ok(raw) => raw,
        Err(ScrobbleError::UnknownUser(_)) => vec![],
        Err(err) => return upstream_failure(err.to_string()),
    };

    let top_albums = charts::project_top_albums(raw)
        .into_iter()
        .map(|entry| TopAlbumRow {
            artist: entry.item.artist,
            title: entry.item.title,
            scrobbles: entry.weight,
        })
        .collect();

    Json(TopAlbumsBody {
        lastfm_user: Some(identity.username),
        top_albums,
    })
    .into_response()
}

#[derive(Serialize)]
struct TopArtistsBody {
    lastfm_user: Option<String>,
    top_artists: Vec<TopArtistRow>,
}

#[derive(Serialize)]
struct TopArtistRow {
    name: String,
    scrobbles: u64,
}

async fn get_top_artists(
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
    Query(query): Query<ChartQuery>,
) -> Response {
    let period = Period::normalize(query.period.as_deref());

    let identity = match state.identities.get(user_id) {
        Ok(identity) => identity,
        Err(err) => return identity_failure(err),
    };
    let Some(identity) = identity else {
        return Json(TopArtistsBody {
            lastfm_user: None,
            top_artists: vec![],
        })
        .into_response();
    };

    let raw = match state.scrobbler.top_artists(&identity.username, period).await {
        Ok(raw) => raw,
        Err(ScrobbleError::UnknownUser(_)) => vec![],
        Err(err) => return upstream_failure(err.to_string()),
    };

    let top_artists = charts::project_top_artists(raw)
        .into_iter()
        .map(|entry| TopArtistRow {
            name: entry.item.name,
            scrobbles: entry.weight,
        })
        .collect();

    Json(TopArtistsBody {
        lastfm_user: Some(identity.username),
        top_artists,
    })
    .into_response()
}

#[derive(Serialize)]
struct TopTracksBody {
    lastfm_user: Option<String>,
    top_tracks: Vec<TopTrackRow>,
}

#[derive(Serialize)]
struct TopTrackRow {
    artist: Option<String>,
    title: String,
    scrobbles: u64,
}

async fn get_top_tracks(
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
    Query(query): Query<ChartQuery>,
) -> Response {
    let period = Period::normalize(query.period.as_deref());

    let identity = match state.identities.get(user_id) {
        Ok(identity) => identity,
        Err(err) => return identity_failure(err),
    };
    let Some(identity) = identity else {
        return Json(TopTracksBody {
            lastfm_user: None,
            top_tracks: vec![],
        })
        .into_response();
    };

    let raw = match state.scrobbler.top_tracks(&identity.username, period).await {
        Ok(raw) => raw,
        Err(ScrobbleError::UnknownUser(_)) => vec![],
        Err(err) => return upstream_failure(err.to_string()),
    };

    let top_tracks = charts::project_top_tracks(raw)
        .into_iter()
        .map(|entry| TopTrackRow {
            artist: entry.item.artist,
            title: entry.item.title,
            scrobbles: entry.weight,
        })
        .collect();

    Json(TopTracksBody {
        lastfm_user: Some(identity.username),
        top_tracks,
    })
    .into_response()
}

// =============================================================================
// Identity endpoints
// =============================================================================

async fn post_identity(
    State(identities): State<GuardedIdentityManager>,
    Json(payload): Json<IdentityPayload>,
) -> Response {
    match identities.upsert(payload) {
        Ok(UpsertOutcome::Created(identity)) => {
            (StatusCode::CREATED, Json(identity)).into_response()
        }
        Ok(UpsertOutcome::Updated(identity)) => (StatusCode::OK, Json(identity)).into_response(),
        Err(err) => identity_failure(err),
    }
}

async fn get_identity(
    State(identities): State<GuardedIdentityManager>,
    Path(user_id): Path<i64>,
) -> Response {
    match identities.get(user_id) {
        Ok(Some(identity)) => Json(identity).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => identity_failure(err),
    }
}

// =============================================================================
// Error mapping
// =============================================================================

fn identity_failure(err: IdentityError) -> Response {
    match err {
        IdentityError::Validation(message) => {
            (StatusCode::BAD_REQUEST, message).into_response()
        }
        IdentityError::Conflict(detail) => (StatusCode::CONFLICT, detail).into_response(),
        IdentityError::NotFound(_) => StatusCode::NOT_FOUND.into_response(),
        IdentityError::Storage(err) => {
            error!("identity storage failure: {:#}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn upstream_failure(detail: String) -> Response {
    error!("upstream collaborator failure: {}", detail);
    StatusCode::BAD_GATEWAY.into_response()
}

// =============================================================================
// App wiring
// =============================================================================

fn make_app(
    config: ServerConfig,
    scrobbler: GuardedScrobbleService,
    catalog: OptionalCatalogSearch,
    identity_store: std::sync::Arc<dyn IdentityStore>,
) -> Router {
    let state = ServerState::new(config, scrobbler, catalog, identity_store);

    let listening_routes: Router = Router::new()
        .route("/user/{user_id}/now-playing", get(get_now_playing))
        .route("/user/{user_id}/top-albums", get(get_top_albums))
        .route("/user/{user_id}/top-artists", get(get_top_artists))
        .route("/user/{user_id}/top-tracks", get(get_top_tracks))
        .with_state(state.clone());

    let identity_routes: Router = Router::new()
        .route("/identity", post(post_identity))
        .route("/identity/{user_id}", get(get_identity))
        .with_state(state.clone());

    Router::new()
        .route("/", get(home))
        .with_state(state.clone())
        .nest("/v1", listening_routes.merge(identity_routes))
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub async fn run_server(
    config: ServerConfig,
    scrobbler: GuardedScrobbleService,
    catalog: OptionalCatalogSearch,
    identity_store: std::sync::Arc<dyn IdentityStore>,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, scrobbler, catalog, identity_store);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}
