use axum::{Json, extract::State, http::HeaderMap};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    api::{AppState, spotify_user_token},
    error::{Result, TuneflowError},
    spotify,
    types::Song,
};

#[derive(Debug, Deserialize)]
pub struct SearchBody {
    #[serde(default)]
    q: String,
}

pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SearchBody>,
) -> Result<Json<Value>> {
    if body.q.trim().is_empty() {
        return Err(TuneflowError::invalid_input(
            "Missing or invalid query parameter \"q\".",
        ));
    }

    let token = spotify_user_token(&state.settings, &headers).await?;
    let track = spotify::search::search_track(&state.settings, &token, &body.q).await?;
    Ok(Json(json!({ "track": track })))
}

#[derive(Debug, Deserialize)]
pub struct ResolveBody {
    #[serde(default)]
    songs: Vec<Song>,
}

pub async fn resolve(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ResolveBody>,
) -> Result<Json<Value>> {
    let token = spotify_user_token(&state.settings, &headers).await?;
    let (track_uris, failed) =
        spotify::search::resolve_tracks(&state.settings, &token, &body.songs).await;
    Ok(Json(json!({ "trackUris": track_uris, "failed": failed })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistBody {
    #[serde(default)]
    playlist_name: String,
    #[serde(default)]
    track_uris: Vec<String>,
    public: Option<bool>,
}

pub async fn playlist(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PlaylistBody>,
) -> Result<Json<Value>> {
    let token = spotify_user_token(&state.settings, &headers).await?;
    let playlist = spotify::playlist::create_playlist(
        &state.settings,
        &token,
        &body.playlist_name,
        &body.track_uris,
        body.public.unwrap_or(true),
    )
    .await?;
    Ok(Json(serde_json::to_value(playlist)?))
}

pub async fn genres(State(state): State<AppState>) -> Result<Json<Value>> {
    let genres = spotify::browse::genres(&state.settings).await?;
    Ok(Json(json!({ "genres": genres })))
}
