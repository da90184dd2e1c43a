use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    api::AppState,
    error::{Result, TuneflowError},
    management::PARSED_SONGS_TTL,
};

pub fn parsed_songs_key(video_id: &str) -> String {
    format!("parsed_songs:{video_id}")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedSongsBody {
    #[serde(default)]
    video_id: String,
    songs: Option<Vec<Value>>,
}

/// Stores the client's edited song list for a video.
pub async fn update_parsed_songs(
    State(state): State<AppState>,
    Json(body): Json<ParsedSongsBody>,
) -> Result<Json<Value>> {
    let Some(songs) = body.songs.filter(|_| !body.video_id.trim().is_empty()) else {
        return Err(TuneflowError::invalid_input(
            "Missing videoId or songs in request body.",
        ));
    };

    let value = serde_json::to_string(&songs)?;
    state
        .cache
        .set(&parsed_songs_key(&body.video_id), &value, PARSED_SONGS_TTL)
        .await?;

    Ok(Json(json!({ "message": "Parsed songs cache updated successfully." })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearBody {
    #[serde(default)]
    cache_key: String,
}

/// Deletes a cache entry by key; 404 when there was nothing to delete.
pub async fn clear_failed_songs(
    State(state): State<AppState>,
    Json(body): Json<ClearBody>,
) -> Result<Response> {
    if body.cache_key.trim().is_empty() {
        return Err(TuneflowError::invalid_input("Missing cacheKey in request body."));
    }

    if !state.cache.delete(&body.cache_key).await? {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "No cache entry found for the provided key." })),
        )
            .into_response());
    }

    Ok(Json(json!({ "message": "Failed songs cache cleared successfully." })).into_response())
}
