use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{api::AppState, art, error::Result, types::AlbumArt};

#[derive(Debug, Deserialize)]
pub struct AlbumArtQuery {
    #[serde(default)]
    title: String,
    #[serde(default)]
    artist: String,
}

pub async fn album_art(
    State(state): State<AppState>,
    Query(query): Query<AlbumArtQuery>,
) -> Result<Json<AlbumArt>> {
    let art = art::album_art_status(&state.settings, &state.cache, &query.title, &query.artist).await?;
    Ok(Json(art))
}
