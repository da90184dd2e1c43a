//! # API Module
//!
//! HTTP endpoints served by `tuneflow serve`, plus the OAuth callback used by
//! `tuneflow auth`.
//!
//! ## Overview
//!
//! Every endpoint speaks JSON with camelCase fields and reports failures as
//! `{"error": message}` with a status derived from [`TuneflowError`]:
//!
//! - **Extraction**: `POST /api/extract` runs the full extraction flow,
//!   `POST /api/playlist-name` asks the model for a playlist name
//! - **YouTube**: comments, description, title, chapters and playlist writes
//! - **Spotify**: search, multi-variant resolution, playlist writes, genres
//! - **Album art**: cached status with background lookups
//! - **SoundCloud**: track search
//! - **Cache maintenance**: parsed-song snapshots and clearing failed songs
//! - **Monitoring**: [`health`]
//!
//! ## Authentication
//!
//! Spotify user routes take `Authorization: Bearer <token>`. Without a header
//! the token stored by `tuneflow auth` is used (refreshed when close to
//! expiry). YouTube playlist writes take a bearer Google OAuth token or fall
//! back to `YOUTUBE_ACCESS_TOKEN`.
//!
//! ## Request Context
//!
//! Each request runs inside a `request` tracing span carrying the caller's IP
//! from `x-forwarded-for` (`unknown-ip` when absent).

use std::sync::Arc;

use axum::{
    Router,
    extract::Request,
    http::HeaderMap,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use tracing::Instrument;

use crate::{
    ai::LlmProvider,
    config::Settings,
    error::{Result, TuneflowError},
    management::{CacheStore, TokenManager},
};

mod album_art;
mod callback;
mod extract;
mod health;
mod songs;
mod soundcloud;
mod spotify;
mod youtube;

pub use callback::callback;
pub use health::health;
pub use songs::parsed_songs_key;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub cache: Arc<dyn CacheStore>,
    pub llm: Arc<dyn LlmProvider>,
}

/// Builds the TuneFlow API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/extract", post(extract::extract))
        .route("/api/playlist-name", post(extract::playlist_name))
        .route("/api/youtube/comments", post(youtube::comments))
        .route("/api/youtube/description", post(youtube::description))
        .route("/api/youtube/title", post(youtube::title))
        .route("/api/youtube/chapters", post(youtube::chapters))
        .route("/api/youtube/playlist", post(youtube::playlist))
        .route("/api/album-art", get(album_art::album_art))
        .route("/api/spotify/search", post(spotify::search))
        .route("/api/spotify/resolve", post(spotify::resolve))
        .route("/api/spotify/playlist", post(spotify::playlist))
        .route("/api/spotify/genres", get(spotify::genres))
        .route("/api/soundcloud/search", get(soundcloud::search))
        .route("/api/update-parsed-songs", post(songs::update_parsed_songs))
        .route("/api/clear-failed-songs", post(songs::clear_failed_songs))
        .layer(middleware::from_fn(request_context))
        .with_state(state)
}

/// Client IP as reported by the proxy in front of us.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or("unknown-ip")
        .to_string()
}

async fn request_context(request: Request, next: Next) -> Response {
    let span = tracing::info_span!(
        "request",
        ip = %client_ip(request.headers()),
        method = %request.method(),
        path = %request.uri().path()
    );

    async move {
        tracing::info!("request received");
        let response = next.run(request).await;
        tracing::debug!(status = response.status().as_u16(), "request finished");
        response
    }
    .instrument(span)
    .await
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Spotify user token from the request, else from the stored CLI login.
async fn spotify_user_token(settings: &Settings, headers: &HeaderMap) -> Result<String> {
    if let Some(token) = bearer_token(headers) {
        return Ok(token);
    }

    match TokenManager::load().await {
        Ok(mut manager) => Ok(manager.get_valid_token(settings).await),
        Err(_) => Err(TuneflowError::unauthorized(
            "No Spotify user access token found. Please connect your Spotify account.",
        )),
    }
}

fn youtube_token(settings: &Settings, headers: &HeaderMap) -> Result<String> {
    bearer_token(headers)
        .or_else(|| settings.youtube_access_token.clone())
        .ok_or_else(|| TuneflowError::unauthorized("Not authenticated with YouTube."))
}
