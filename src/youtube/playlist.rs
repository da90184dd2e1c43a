use reqwest::Client;
use serde_json::{Value, json};

use crate::{
    config::Settings,
    error::{Result, TuneflowError},
    types::{VideoInsertResult, YoutubePlaylist},
    utils,
};

pub const DEFAULT_PLAYLIST_TITLE: &str = "TuneFlow Playlist";
pub const PLAYLIST_DESCRIPTION: &str = "Created by TuneFlow from the songs mentioned under a YouTube video.";

/// Creates a public YouTube playlist and appends `video_ids` one by one.
///
/// Ids are trimmed; ids that do not look like 11-character video ids are
/// reported but still sent, YouTube has the final word. A failed insert is
/// recorded in the result and does not stop the remaining inserts.
pub async fn create_playlist(
    settings: &Settings,
    access_token: &str,
    name: &str,
    description: Option<&str>,
    video_ids: &[String],
) -> Result<YoutubePlaylist> {
    if access_token.trim().is_empty() {
        return Err(TuneflowError::unauthorized("Not authenticated with YouTube."));
    }

    let title = if name.trim().is_empty() {
        DEFAULT_PLAYLIST_TITLE
    } else {
        name.trim()
    };
    let payload = json!({
        "snippet": {
            "title": title,
            "description": description.filter(|d| !d.trim().is_empty()).unwrap_or(PLAYLIST_DESCRIPTION),
        },
        "status": { "privacyStatus": "public" }
    });

    let client = utils::http_client();
    let response = client
        .post(format!("{}/playlists", settings.youtube_api_url))
        .query(&[("part", "snippet,status")])
        .bearer_auth(access_token)
        .json(&payload)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(TuneflowError::from_response("YouTube", response).await);
    }

    let created: Value = response.json().await?;
    let playlist_id = created["id"]
        .as_str()
        .ok_or_else(|| TuneflowError::Api {
            service: "YouTube",
            status: 502,
            message: "playlist response did not contain an id".to_string(),
        })?
        .to_string();

    tracing::info!(playlist_id, title, videos = video_ids.len(), "created youtube playlist");

    let mut video_insert_results = Vec::with_capacity(video_ids.len());
    for raw_id in video_ids {
        let video_id = raw_id.trim().to_string();
        if !utils::is_valid_video_id(&video_id) {
            tracing::warn!(video_id, "suspicious video id format");
        }
        video_insert_results.push(insert_video(&client, settings, access_token, &playlist_id, video_id).await);
    }

    Ok(YoutubePlaylist {
        playlist_url: format!("https://www.youtube.com/playlist?list={playlist_id}"),
        playlist_id,
        video_insert_results,
    })
}

async fn insert_video(
    client: &Client,
    settings: &Settings,
    access_token: &str,
    playlist_id: &str,
    video_id: String,
) -> VideoInsertResult {
    let payload = json!({
        "snippet": {
            "playlistId": playlist_id,
            "resourceId": { "kind": "youtube#video", "videoId": video_id },
        }
    });

    let response = client
        .post(format!("{}/playlistItems", settings.youtube_api_url))
        .query(&[("part", "snippet")])
        .bearer_auth(access_token)
        .json(&payload)
        .send()
        .await;

    match response {
        Ok(resp) if resp.status().is_success() => VideoInsertResult {
            video_id,
            status: resp.status().as_u16(),
            error: None,
        },
        Ok(resp) => {
            let status = resp.status().as_u16();
            let error = TuneflowError::from_response("YouTube", resp).await;
            tracing::warn!(video_id, status, error = %error, "failed to insert video");
            let message = match error {
                TuneflowError::Api { message, .. } => message,
                other => other.to_string(),
            };
            VideoInsertResult {
                video_id,
                status,
                error: Some(message),
            }
        }
        Err(e) => {
            tracing::warn!(video_id, error = %e, "failed to insert video");
            VideoInsertResult {
                video_id,
                status: 0,
                error: Some(e.to_string()),
            }
        }
    }
}
