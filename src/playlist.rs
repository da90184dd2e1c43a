//! End-to-end playlist creation: extract, name, resolve, write.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    ai::{ExtractRequest, LlmProvider, SongExtractor, generate_playlist_name},
    config::Settings,
    error::{Result, TuneflowError},
    management::CacheStore,
    spotify,
    types::{Song, VideoInsertResult},
    utils, youtube,
};

/// Service the playlist is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistTarget {
    Spotify,
    Youtube,
}

#[derive(Debug, Clone)]
pub struct PlaylistRequest {
    pub extract: ExtractRequest,
    pub name: Option<String>,
    pub ai_name: bool,
    pub target: PlaylistTarget,
    pub public: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistOutcome {
    pub target: PlaylistTarget,
    pub name: String,
    pub playlist_id: String,
    pub playlist_url: Option<String>,
    pub track_count: usize,
    pub failed: Vec<Song>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub video_insert_results: Vec<VideoInsertResult>,
}

/// Extracts songs for the request's video and writes them to a new playlist.
///
/// `access_token` is a Spotify user token or a Google OAuth token, matching
/// the request's target.
pub async fn build_playlist(
    settings: &Arc<Settings>,
    llm: &Arc<dyn LlmProvider>,
    cache: &Arc<dyn CacheStore>,
    access_token: &str,
    request: &PlaylistRequest,
) -> Result<PlaylistOutcome> {
    let extractor = SongExtractor::new(Arc::clone(settings), Arc::clone(llm), Arc::clone(cache));
    let songs = extractor.extract(&request.extract).await?;
    tracing::info!(songs = songs.len(), target = ?request.target, "building playlist");

    let name = playlist_name(settings, llm.as_ref(), request, &songs).await;

    match request.target {
        PlaylistTarget::Spotify => {
            let (uris, failed) = spotify::search::resolve_tracks(settings, access_token, &songs).await;
            if uris.is_empty() {
                return Err(TuneflowError::NotFound("No valid tracks found".to_string()));
            }

            let playlist =
                spotify::playlist::create_playlist(settings, access_token, &name, &uris, request.public)
                    .await?;

            Ok(PlaylistOutcome {
                target: request.target,
                name,
                playlist_id: playlist.playlist_id,
                playlist_url: playlist.playlist_url,
                track_count: uris.len(),
                failed,
                video_insert_results: Vec::new(),
            })
        }
        PlaylistTarget::Youtube => {
            let (video_ids, failed) = resolve_videos(settings, &songs).await;
            if video_ids.is_empty() {
                return Err(TuneflowError::NotFound("No valid tracks found".to_string()));
            }

            let playlist =
                youtube::create_playlist(settings, access_token, &name, None, &video_ids).await?;
            let inserted = playlist
                .video_insert_results
                .iter()
                .filter(|r| r.error.is_none())
                .count();

            Ok(PlaylistOutcome {
                target: request.target,
                name,
                playlist_id: playlist.playlist_id,
                playlist_url: Some(playlist.playlist_url),
                track_count: inserted,
                failed,
                video_insert_results: playlist.video_insert_results,
            })
        }
    }
}

/// Explicit name, else an AI suggestion when asked for, else the video title.
async fn playlist_name(
    settings: &Settings,
    llm: &dyn LlmProvider,
    request: &PlaylistRequest,
    songs: &[Song],
) -> String {
    if let Some(name) = request.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    if request.ai_name {
        let genres = spotify::browse::genres(settings).await.unwrap_or_else(|e| {
            tracing::debug!(error = %e, "no genre hints available");
            Vec::new()
        });
        match generate_playlist_name(llm, &genres, songs).await {
            Ok(name) => return name,
            Err(e) => tracing::warn!(error = %e, "playlist name generation failed"),
        }
    }

    let title = match utils::parse_video_id(&request.extract.youtube_url) {
        Ok(video_id) => youtube::fetch_title(settings, &video_id).await.ok(),
        Err(_) => None,
    };

    match title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
        Some(title) => format!("{title} Playlist"),
        None => youtube::playlist::DEFAULT_PLAYLIST_TITLE.to_string(),
    }
}

/// Video ids for songs, reusing ids the songs already carry.
async fn resolve_videos(settings: &Settings, songs: &[Song]) -> (Vec<String>, Vec<Song>) {
    let mut video_ids = Vec::new();
    let mut failed = Vec::new();

    for song in songs {
        if let Some(id) = song.video_id.as_deref().filter(|id| !id.trim().is_empty()) {
            video_ids.push(id.to_string());
            continue;
        }

        match youtube::search_video(settings, song).await {
            Ok(Some(id)) => video_ids.push(id),
            Ok(None) => failed.push(song.clone()),
            Err(e) => {
                tracing::warn!(song = %song, error = %e, "youtube video search failed");
                failed.push(song.clone());
            }
        }
    }

    (video_ids, failed)
}
