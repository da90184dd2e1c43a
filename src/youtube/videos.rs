use std::sync::LazyLock;

use regex::Regex;

use crate::{
    config::Settings,
    error::{Result, TuneflowError},
    types::{Chapter, Song, VideoListResponse, VideoSearchResponse, VideoSnippet},
    utils,
};

static CHAPTER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}:\d{2}(?::\d{2})?)\s*[-–—.|]*\s*(.+)$").expect("valid chapter regex")
});

/// Snippet of a single video, or `None` when the id matches nothing.
async fn fetch_snippet(settings: &Settings, video_id: &str) -> Result<Option<VideoSnippet>> {
    if video_id.trim().is_empty() {
        return Err(TuneflowError::invalid_input("Video ID is required"));
    }

    let api_key = settings.youtube_api_key()?;
    let response = utils::http_client()
        .get(format!("{}/videos", settings.youtube_api_url))
        .query(&[("part", "snippet"), ("id", video_id), ("key", api_key)])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(TuneflowError::from_response("YouTube", response).await);
    }

    let videos = response.json::<VideoListResponse>().await?;
    Ok(videos.items.into_iter().next().and_then(|v| v.snippet))
}

/// Video description; empty when the video has no snippet.
pub async fn fetch_description(settings: &Settings, video_id: &str) -> Result<String> {
    Ok(fetch_snippet(settings, video_id)
        .await?
        .map(|s| s.description)
        .unwrap_or_default())
}

/// Video title; empty when the video has no snippet.
pub async fn fetch_title(settings: &Settings, video_id: &str) -> Result<String> {
    Ok(fetch_snippet(settings, video_id)
        .await?
        .map(|s| s.title)
        .unwrap_or_default())
}

/// Parses `mm:ss Title` / `h:mm:ss - Title` lines out of a description.
pub fn parse_chapters(description: &str) -> Vec<Chapter> {
    description
        .lines()
        .filter_map(|line| {
            let caps = CHAPTER_LINE.captures(line.trim_end_matches('\r'))?;
            Some(Chapter {
                start: caps[1].to_string(),
                title: caps[2].trim().to_string(),
            })
        })
        .collect()
}

/// Chapter markers from the video description. Lookup failures yield no chapters.
pub async fn fetch_chapters(settings: &Settings, video_id: &str) -> Vec<Chapter> {
    match fetch_description(settings, video_id).await {
        Ok(description) => parse_chapters(&description),
        Err(e) => {
            tracing::warn!(video_id, error = %e, "chapter lookup failed");
            Vec::new()
        }
    }
}

/// Chapter titles, one per line, as fed to the extraction flow.
pub fn chapters_text(chapters: &[Chapter]) -> String {
    chapters
        .iter()
        .map(|c| c.title.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// First video matching `"{title} {artist}"`.
pub async fn search_video(settings: &Settings, song: &Song) -> Result<Option<String>> {
    let api_key = settings.youtube_api_key()?;
    let q = format!("{} {}", song.title, song.artist);

    let response = utils::http_client()
        .get(format!("{}/search", settings.youtube_api_url))
        .query(&[
            ("part", "snippet"),
            ("type", "video"),
            ("maxResults", "1"),
            ("q", q.as_str()),
            ("key", api_key),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(TuneflowError::from_response("YouTube", response).await);
    }

    let results = response.json::<VideoSearchResponse>().await?;
    Ok(results
        .items
        .into_iter()
        .find_map(|item| item.id.and_then(|id| id.video_id)))
}
