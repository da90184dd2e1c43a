use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    ai::{ExtractRequest, SongExtractor, generate_playlist_name},
    api::AppState,
    error::Result,
    types::Song,
};

pub async fn extract(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<Value>> {
    let extractor = SongExtractor::new(
        Arc::clone(&state.settings),
        Arc::clone(&state.llm),
        Arc::clone(&state.cache),
    );
    let songs = extractor.extract(&request).await?;
    Ok(Json(json!({ "songs": songs })))
}

#[derive(Debug, Deserialize)]
pub struct PlaylistNameBody {
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    songs: Vec<Song>,
}

pub async fn playlist_name(
    State(state): State<AppState>,
    Json(body): Json<PlaylistNameBody>,
) -> Result<Json<Value>> {
    let name = generate_playlist_name(state.llm.as_ref(), &body.genres, &body.songs).await?;
    Ok(Json(json!({ "name": name })))
}
