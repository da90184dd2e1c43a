use std::sync::LazyLock;

use futures::future::join_all;
use regex::Regex;

use crate::{
    config::Settings,
    error::{Result, TuneflowError},
    spotify::send,
    types::{SearchResponse, Song, SpotifyTrack},
    utils,
};

static ARTIST_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)\s+-\s+(.*)$").expect("valid search query regex"));

/// Turns free text into a Spotify field-filtered query.
///
/// `"A - B"` becomes `track:A artist:B`. Otherwise the last two words of a
/// longer query are taken as the artist, a two-word query is split in half,
/// and anything shorter is searched as a track name.
pub fn build_search_query(q: &str) -> String {
    if let Some(caps) = ARTIST_TITLE.captures(q) {
        return format!("track:{} artist:{}", caps[1].trim(), caps[2].trim());
    }

    let words: Vec<&str> = q.split_whitespace().collect();
    match words.len() {
        n if n > 2 => format!(
            "track:{} artist:{}",
            words[..n - 2].join(" "),
            words[n - 2..].join(" ")
        ),
        2 => format!("track:{} artist:{}", words[0], words[1]),
        _ => format!("track:{q}"),
    }
}

/// First track matching `q`, or `None` when Spotify has nothing.
pub async fn search_track(
    settings: &Settings,
    access_token: &str,
    q: &str,
) -> Result<Option<SpotifyTrack>> {
    if q.trim().is_empty() {
        return Err(TuneflowError::invalid_input(
            "Missing or invalid query parameter \"q\".",
        ));
    }

    let query = build_search_query(q);
    let request = utils::http_client()
        .get(format!("{}/search", settings.spotify_api_url))
        .query(&[("q", query.as_str()), ("type", "track"), ("limit", "1")])
        .bearer_auth(access_token);

    let response = send(request).await?;
    let results = response.json::<SearchResponse>().await?;

    Ok(results.tracks.and_then(|page| page.items.into_iter().next()))
}

/// Phrasings tried, in order, when looking a song up.
pub fn query_variants(song: &Song) -> Vec<String> {
    vec![
        format!("{} {}", song.title, song.artist),
        song.title.clone(),
        format!("{} {}", utils::strip_parenthesized(&song.title), song.artist)
            .trim()
            .to_string(),
        format!("{} (explicit) {}", song.title, song.artist),
        format!("{} (with {})", song.title, song.artist),
        song.artist.clone(),
    ]
}

/// Spotify URI for `song`, trying each query variant until one hits.
///
/// A variant whose search fails is skipped. The first track carrying a URI is
/// accepted even when its name or artists look unrelated; that case is only
/// logged.
pub async fn resolve_track(settings: &Settings, access_token: &str, song: &Song) -> Option<String> {
    for q in query_variants(song) {
        let track = match search_track(settings, access_token, &q).await {
            Ok(Some(track)) => track,
            Ok(None) => continue,
            Err(e) => {
                tracing::debug!(query = %q, error = %e, "spotify search variant failed");
                continue;
            }
        };

        let Some(uri) = track.uri.clone() else {
            continue;
        };

        if !is_plausible_match(&track, song) {
            tracing::info!(
                song = %song,
                matched = %track.name,
                query = %q,
                "accepting loose spotify match"
            );
        }
        return Some(uri);
    }

    None
}

fn is_plausible_match(track: &SpotifyTrack, song: &Song) -> bool {
    let name = track.name.to_lowercase();
    let clean_title = utils::strip_parenthesized(&song.title).to_lowercase();
    let artist = song.artist.to_lowercase();

    name.contains(&clean_title)
        || name.contains(&song.title.to_lowercase())
        || track
            .artists
            .iter()
            .any(|a| a.name.to_lowercase().contains(&artist))
}

/// Resolves every song concurrently.
///
/// Returns the URIs found (in song order) and the songs that had no match.
pub async fn resolve_tracks(
    settings: &Settings,
    access_token: &str,
    songs: &[Song],
) -> (Vec<String>, Vec<Song>) {
    let lookups = songs
        .iter()
        .map(|song| resolve_track(settings, access_token, song));
    let results = join_all(lookups).await;

    let mut uris = Vec::new();
    let mut failed = Vec::new();
    for (song, result) in songs.iter().zip(results) {
        match result {
            Some(uri) => uris.push(uri),
            None => failed.push(song.clone()),
        }
    }

    tracing::info!(
        resolved = uris.len(),
        failed = failed.len(),
        "resolved songs on spotify"
    );
    (uris, failed)
}
