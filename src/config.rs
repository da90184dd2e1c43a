//! Configuration management for TuneFlow.
//!
//! Configuration comes from environment variables, optionally seeded from a
//! `.env` file in the local data directory. Values are read once into a
//! [`Settings`] value that is passed to every client.
//!
//! Resolution order:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Built-in defaults for endpoints and tuning values
//!
//! Credentials have no defaults. A missing credential is only an error when an
//! operation that needs it runs, so `tuneflow chapters` works with nothing but
//! a YouTube key.

use std::{env, path::PathBuf};

use crate::error::{Result, TuneflowError};

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:9002";
pub const DEFAULT_YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_GENAI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GENAI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_SPOTIFY_REDIRECT_URI: &str = "http://127.0.0.1:9002/callback";
pub const DEFAULT_SPOTIFY_SCOPE: &str = "playlist-modify-private playlist-modify-public";
pub const DEFAULT_SOUNDCLOUD_API_URL: &str = "https://api.soundcloud.com";
pub const DEFAULT_ITUNES_API_URL: &str = "https://itunes.apple.com";
pub const DEFAULT_MUSICBRAINZ_API_URL: &str = "https://musicbrainz.org/ws/2";
pub const DEFAULT_COVERART_API_URL: &str = "https://coverartarchive.org";
pub const DEFAULT_COMMENT_PAGES: u32 = 5;

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates `<data dir>/tuneflow/` if needed and loads `.env` from it when the
/// file exists. A missing file is not an error; the process environment and
/// built-in defaults are enough to start.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/tuneflow/.env`
/// - macOS: `~/Library/Application Support/tuneflow/.env`
/// - Windows: `%LOCALAPPDATA%/tuneflow/.env`
///
/// # Errors
///
/// Returns an error if the directory cannot be created or an existing `.env`
/// file cannot be parsed.
pub async fn load_env() -> std::result::Result<(), String> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }

    Ok(())
}

/// Root of everything TuneFlow stores locally (`<data dir>/tuneflow`).
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("tuneflow");
    path
}

/// Which [`crate::management::CacheStore`] backend to build at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    File,
    Memory,
}

/// Runtime settings for every external service TuneFlow talks to.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server_addr: String,

    pub youtube_api_key: Option<String>,
    pub youtube_api_url: String,
    pub youtube_access_token: Option<String>,
    pub comment_pages: u32,

    pub genai_api_key: Option<String>,
    pub genai_api_url: String,
    pub genai_model: String,

    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub spotify_api_url: String,
    pub spotify_auth_url: String,
    pub spotify_token_url: String,
    pub spotify_redirect_uri: String,
    pub spotify_scope: String,

    pub soundcloud_client_id: Option<String>,
    pub soundcloud_api_url: String,

    pub itunes_api_url: String,
    pub musicbrainz_api_url: String,
    pub coverart_api_url: String,

    pub cache_backend: CacheBackend,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_SERVER_ADDRESS.to_string(),
            youtube_api_key: None,
            youtube_api_url: DEFAULT_YOUTUBE_API_URL.to_string(),
            youtube_access_token: None,
            comment_pages: DEFAULT_COMMENT_PAGES,
            genai_api_key: None,
            genai_api_url: DEFAULT_GENAI_API_URL.to_string(),
            genai_model: DEFAULT_GENAI_MODEL.to_string(),
            spotify_client_id: None,
            spotify_client_secret: None,
            spotify_api_url: DEFAULT_SPOTIFY_API_URL.to_string(),
            spotify_auth_url: DEFAULT_SPOTIFY_AUTH_URL.to_string(),
            spotify_token_url: DEFAULT_SPOTIFY_TOKEN_URL.to_string(),
            spotify_redirect_uri: DEFAULT_SPOTIFY_REDIRECT_URI.to_string(),
            spotify_scope: DEFAULT_SPOTIFY_SCOPE.to_string(),
            soundcloud_client_id: None,
            soundcloud_api_url: DEFAULT_SOUNDCLOUD_API_URL.to_string(),
            itunes_api_url: DEFAULT_ITUNES_API_URL.to_string(),
            musicbrainz_api_url: DEFAULT_MUSICBRAINZ_API_URL.to_string(),
            coverart_api_url: DEFAULT_COVERART_API_URL.to_string(),
            cache_backend: CacheBackend::File,
        }
    }
}

impl Settings {
    /// Reads settings from the process environment, falling back to defaults.
    ///
    /// Call [`load_env`] first to pull in the `.env` file.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let or = |name: &str, fallback: String| get(name).unwrap_or(fallback);

        Self {
            server_addr: or("SERVER_ADDRESS", defaults.server_addr),
            youtube_api_key: get("YOUTUBE_API_KEY"),
            youtube_api_url: or("YOUTUBE_API_URL", defaults.youtube_api_url),
            youtube_access_token: get("YOUTUBE_ACCESS_TOKEN"),
            comment_pages: get("YT_COMMENT_PAGES")
                .and_then(|v| v.trim().parse::<u32>().ok())
                // the first page is always read
                .map(|pages| pages.max(1))
                .unwrap_or(defaults.comment_pages),
            genai_api_key: get("GOOGLE_GENAI_API_KEY"),
            genai_api_url: or("GENAI_API_URL", defaults.genai_api_url),
            genai_model: or("GENAI_MODEL", defaults.genai_model),
            spotify_client_id: get("SPOTIFY_API_AUTH_CLIENT_ID"),
            spotify_client_secret: get("SPOTIFY_API_AUTH_CLIENT_SECRET"),
            spotify_api_url: or("SPOTIFY_API_URL", defaults.spotify_api_url),
            spotify_auth_url: or("SPOTIFY_API_AUTH_URL", defaults.spotify_auth_url),
            spotify_token_url: or("SPOTIFY_API_TOKEN_URL", defaults.spotify_token_url),
            spotify_redirect_uri: or("SPOTIFY_API_REDIRECT_URI", defaults.spotify_redirect_uri),
            spotify_scope: or("SPOTIFY_API_AUTH_SCOPE", defaults.spotify_scope),
            soundcloud_client_id: get("SOUNDCLOUD_CLIENT_ID"),
            soundcloud_api_url: or("SOUNDCLOUD_API_URL", defaults.soundcloud_api_url),
            itunes_api_url: or("ITUNES_API_URL", defaults.itunes_api_url),
            musicbrainz_api_url: or("MUSICBRAINZ_API_URL", defaults.musicbrainz_api_url),
            coverart_api_url: or("COVERART_API_URL", defaults.coverart_api_url),
            cache_backend: match get("CACHE_BACKEND").as_deref() {
                Some("memory") => CacheBackend::Memory,
                _ => CacheBackend::File,
            },
        }
    }

    /// YouTube Data API key, required for every YouTube read.
    pub fn youtube_api_key(&self) -> Result<&str> {
        required(&self.youtube_api_key, "YOUTUBE_API_KEY")
    }

    /// Spotify client id, required for the PKCE flow and client credentials.
    pub fn spotify_client_id(&self) -> Result<&str> {
        required(&self.spotify_client_id, "SPOTIFY_API_AUTH_CLIENT_ID")
    }

    /// Spotify client secret, only needed for the client-credentials grant.
    pub fn spotify_client_secret(&self) -> Result<&str> {
        required(&self.spotify_client_secret, "SPOTIFY_API_AUTH_CLIENT_SECRET")
    }

    pub fn soundcloud_client_id(&self) -> Result<&str> {
        required(&self.soundcloud_client_id, "SOUNDCLOUD_CLIENT_ID")
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| TuneflowError::config(format!("{name} must be set")))
}
