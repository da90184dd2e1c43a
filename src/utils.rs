use std::{sync::LazyLock, time::Duration};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use regex::Regex;
use reqwest::Client;
use sha2::{Digest, Sha256};
use url::Url;

use crate::{
    error::{Result, TuneflowError},
    types::{Song, SongTableRow},
};

static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid video id regex"));

static PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]*\)").expect("valid parenthesis regex"));

/// Upper bound for a single upstream request.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for upstream calls, bounded by [`HTTP_TIMEOUT`].
pub fn http_client() -> Client {
    http_client_with_timeout(HTTP_TIMEOUT)
}

pub fn http_client_with_timeout(timeout: Duration) -> Client {
    Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not build http client, using defaults");
        Client::new()
    })
}

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Stable, filesystem- and key-safe digest of arbitrary text.
pub fn digest(text: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(text.as_bytes()))
}

pub fn is_valid_video_id(candidate: &str) -> bool {
    VIDEO_ID.is_match(candidate)
}

/// Extracts a YouTube video id from a watch/short/embed URL or a bare id.
///
/// A scheme-less `watch?v=` URL gets `https://` prepended before parsing.
pub fn parse_video_id(input: &str) -> Result<String> {
    let input = input.trim();
    if is_valid_video_id(input) {
        return Ok(input.to_string());
    }

    let with_scheme = if input.starts_with("http://") || input.starts_with("https://") {
        input.to_string()
    } else {
        format!("https://{input}")
    };

    let url = Url::parse(&with_scheme)
        .map_err(|_| TuneflowError::invalid_input(format!("Not a YouTube URL: {input}")))?;
    let host = url.host_str().unwrap_or_default().trim_start_matches("www.");
    let host = host.trim_start_matches("m.").trim_start_matches("music.");

    let candidate = match host {
        "youtube.com" => {
            if url.path() == "/watch" {
                url.query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned())
            } else {
                let mut segments = url.path_segments().into_iter().flatten();
                match segments.next() {
                    Some("shorts") | Some("embed") | Some("live") | Some("v") => {
                        segments.next().map(str::to_string)
                    }
                    _ => None,
                }
            }
        }
        "youtu.be" => url
            .path_segments()
            .and_then(|mut s| s.next())
            .map(str::to_string),
        _ => None,
    };

    match candidate {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(TuneflowError::invalid_input(
            "Invalid YouTube video URL: missing video ID. Provide a link like https://www.youtube.com/watch?v=...",
        )),
    }
}

/// Removes every parenthesised part, e.g. `"Song (Remastered 2011)"` -> `"Song"`.
pub fn strip_parenthesized(text: &str) -> String {
    PARENTHESIZED.replace_all(text, "").into_owned()
}

pub fn build_song_rows(songs: &[Song]) -> Vec<SongTableRow> {
    songs
        .iter()
        .enumerate()
        .map(|(i, song)| SongTableRow {
            position: i + 1,
            title: song.title.clone(),
            artist: song.artist.clone(),
            art: if song.image_url.is_some() {
                "yes".to_string()
            } else {
                "-".to_string()
            },
        })
        .collect()
}
