//! # YouTube Integration Module
//!
//! Thin client for the parts of the YouTube Data API v3 TuneFlow needs:
//!
//! - [`comments`] - top-level comment threads (relevance ordered or pinned only)
//! - [`videos`] - description, title, chapter markers and video search
//! - [`playlist`] - playlist creation and item insertion with a user token
//!
//! Read operations authenticate with `YOUTUBE_API_KEY`. Playlist writes need a
//! Google OAuth access token with the `youtube` scope.
//!
//! ## Endpoints
//!
//! - `GET /commentThreads` - comments for a video, 100 per page
//! - `GET /videos` - video snippet (title, description)
//! - `GET /search` - first video matching a song
//! - `POST /playlists` - create a playlist
//! - `POST /playlistItems` - append a video to a playlist

pub mod comments;
pub mod playlist;
pub mod videos;

pub use comments::fetch_comments;
pub use playlist::create_playlist;
pub use videos::{
    chapters_text, fetch_chapters, fetch_description, fetch_title, parse_chapters, search_video,
};
