use axum::{Json, extract::State, http::HeaderMap};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    api::{AppState, youtube_token},
    error::{Result, TuneflowError},
    utils, youtube,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsBody {
    #[serde(default)]
    video_id: String,
    #[serde(default)]
    prioritize_pinned_comments: bool,
}

pub async fn comments(
    State(state): State<AppState>,
    Json(body): Json<CommentsBody>,
) -> Result<Json<Value>> {
    let comments =
        youtube::fetch_comments(&state.settings, &body.video_id, body.prioritize_pinned_comments)
            .await?;
    Ok(Json(json!({ "comments": comments })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoBody {
    #[serde(default)]
    video_id: String,
}

pub async fn description(
    State(state): State<AppState>,
    Json(body): Json<VideoBody>,
) -> Result<Json<Value>> {
    let description = youtube::fetch_description(&state.settings, &body.video_id).await?;
    Ok(Json(json!({ "description": description })))
}

pub async fn title(
    State(state): State<AppState>,
    Json(body): Json<VideoBody>,
) -> Result<Json<Value>> {
    let title = youtube::fetch_title(&state.settings, &body.video_id).await?;
    Ok(Json(json!({ "title": title })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChaptersBody {
    video_id: Option<String>,
    youtube_url: Option<String>,
}

pub async fn chapters(
    State(state): State<AppState>,
    Json(body): Json<ChaptersBody>,
) -> Result<Json<Value>> {
    let input = body
        .video_id
        .filter(|id| !id.trim().is_empty())
        .or(body.youtube_url)
        .unwrap_or_default();
    let video_id = utils::parse_video_id(&input)
        .map_err(|_| TuneflowError::invalid_input("Invalid video ID or URL."))?;

    let chapters = youtube::fetch_chapters(&state.settings, &video_id).await;
    Ok(Json(json!({ "chapters": chapters })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistBody {
    #[serde(default)]
    playlist_name: String,
    description: Option<String>,
    #[serde(default)]
    video_ids: Vec<String>,
}

pub async fn playlist(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PlaylistBody>,
) -> Result<Json<Value>> {
    let token = youtube_token(&state.settings, &headers)?;
    let playlist = youtube::create_playlist(
        &state.settings,
        &token,
        &body.playlist_name,
        body.description.as_deref(),
        &body.video_ids,
    )
    .await?;
    Ok(Json(serde_json::to_value(playlist)?))
}
