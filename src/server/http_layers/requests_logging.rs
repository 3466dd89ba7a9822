//! Request logging middleware
#![allow(dead_code)] // Used as middleware

use axum::extract::State;
use axum::{
    body::Body,
    http::{HeaderMap, Request, Response},
    middleware::Next,
    response::IntoResponse,
};
use std::time::Instant;
use tracing::{error, info};

use super::super::state::ServerState;

#[derive(PartialEq, PartialOrd, Clone, Debug, clap::ValueEnum)]
pub enum RequestsLoggingLevel {
    None,
    Path,
    Headers,
    Body,
}

impl Default for RequestsLoggingLevel {
    fn default() -> Self {
        Self::Path
    }
}

impl std::fmt::Display for RequestsLoggingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

const MAX_LOGGABLE_BODY_LENGTH: usize = 1024;

fn content_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get("content-length")?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

fn log_headers(label: &str, headers: &HeaderMap) {
    info!("  {} Headers:", label);
    for (name, value) in headers.iter() {
        info!("    {:?}: {:?}", name, value);
    }
}

/// Buffers and logs a body when its declared length is small enough,
/// handing back an equivalent body either way.
async fn log_body(label: &str, headers: &HeaderMap, body: Body) -> Result<Body, ()> {
    let size = match content_length(headers) {
        None => {
            info!("  {} Body: no usable content-length", label);
            return Ok(body);
        }
        Some(size) => size,
    };

    if size >= MAX_LOGGABLE_BODY_LENGTH {
        info!("  {} Body: too big to log ({} bytes)", label, size);
        return Ok(body);
    }

    let bytes = match axum::body::to_bytes(body, size).await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!("Failed to buffer {} body for logging: {:?}", label, err);
            return Err(());
        }
    };
    info!("  {} Body:\n{}", label, String::from_utf8_lossy(&bytes));
    Ok(Body::from(bytes))
}

pub async fn log_requests(
    State(state): State<ServerState>,
    mut request: Request<Body>,
    next: Next,
) -> impl IntoResponse {
    let level = state.config.requests_logging_level.clone();
    let start = Instant::now();

    let method = request.method().to_string();
    let uri = request.uri().to_string();

    if level > RequestsLoggingLevel::None {
        info!(">>> {} {}", method, uri);
    }
    if level >= RequestsLoggingLevel::Headers {
        log_headers("Req", request.headers());
    }
    if level >= RequestsLoggingLevel::Body {
        let (parts, body) = request.into_parts();
        match log_body("Req", &parts.headers, body).await {
            Ok(body) => request = Request::from_parts(parts, body),
            Err(()) => return internal_error(),
        }
    }

    let mut response = next.run(request).await;

    if level >= RequestsLoggingLevel::Headers {
        log_headers("Resp", response.headers());
    }
    if level >= RequestsLoggingLevel::Body {
        let (parts, body) = response.into_parts();
        match log_body("Resp", &parts.headers, body).await {
            Ok(body) => response = Response::from_parts(parts, body),
            Err(()) => return internal_error(),
        }
    }

    if level > RequestsLoggingLevel::None {
        info!(
            "<<< {} ({}ms)",
            response.status().as_u16(),
            start.elapsed().as_millis()
        );
    }

    response
}

fn internal_error() -> Response<Body> {
    Response::builder()
        .status(500)
        .body(Body::from("Internal Server Error"))
        .unwrap()
}
