//! # CLI Module
//!
//! User-facing commands of the `tuneflow` binary. Each command loads what it
//! needs from [`crate::config::Settings`], runs the library operation behind a
//! spinner and prints the outcome with the coloured status macros and
//! `tabled` tables.
//!
//! ## Commands
//!
//! - [`auth`] - Spotify OAuth 2.0 PKCE login; the token is stored for later runs
//! - [`extract`] - Songs mentioned in a video's comments, description or chapters
//! - [`chapters`] - Chapter markers parsed from a video description
//! - [`playlist`] - Extract, resolve and write a Spotify or YouTube playlist
//! - [`serve`] - Run the JSON HTTP API
//!
//! ## Usage Patterns
//!
//! ```bash
//! tuneflow auth                                        # Log in to Spotify
//! tuneflow extract https://youtu.be/dQw4w9WgXcQ --art  # List songs with album art
//! tuneflow playlist https://youtu.be/dQw4w9WgXcQ --ai-name
//! tuneflow playlist dQw4w9WgXcQ --target youtube --chapters
//! tuneflow serve                                       # HTTP API on SERVER_ADDRESS
//! ```
//!
//! Fatal problems (missing credentials, invalid URLs, upstream failures) end
//! the process through [`crate::error!`] with exit status 1.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

mod auth;
mod chapters;
mod extract;
mod playlist;
mod serve;

pub use auth::auth;
pub use chapters::chapters;
pub use extract::{ExtractOptions, extract};
pub use playlist::{PlaylistOptions, playlist};
pub use serve::serve;

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}
