//! TuneFlow Library
//!
//! Turns the songs people mention under a YouTube video into a playlist. Song
//! mentions are pulled out of comments, the description or chapter markers by
//! a language model, resolved against Spotify or YouTube, decorated with album
//! art and written to a new playlist.
//!
//! # Modules
//!
//! - `ai` - Extraction flow, model providers and playlist naming
//! - `api` - HTTP endpoints for `tuneflow serve` and the OAuth callback
//! - `art` - Cached album art with Spotify, iTunes and MusicBrainz sources
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `dedup` - Collapsing duplicate song mentions
//! - `error` - Library error type and HTTP status mapping
//! - `management` - Token storage and the TTL key-value cache
//! - `playlist` - End-to-end playlist creation
//! - `server` - HTTP servers for the API and the OAuth callback
//! - `soundcloud` - SoundCloud track search
//! - `spotify` - Spotify Web API client implementation
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//! - `youtube` - YouTube Data API client implementation
//!
//! # Example
//!
//! ```
//! use tuneflow::{config, cli};
//!
//! #[tokio::main]
//! async fn main() -> tuneflow::Res<()> {
//!     config::load_env().await?;
//!     // Use CLI functions...
//!     Ok(())
//! }
//! ```

pub mod ai;
pub mod api;
pub mod art;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod error;
pub mod management;
pub mod playlist;
pub mod server;
pub mod soundcloud;
pub mod spotify;
pub mod types;
pub mod utils;
pub mod youtube;

/// Result alias for the binary and CLI layer, where errors from the library,
/// config loading and terminal I/O meet.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints a status line prefixed with a blue `o`.
///
/// ```ignore
/// info!("Found {} songs", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a status line prefixed with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a red error line and exits with status 1.
///
/// Only for failures the CLI cannot recover from; nothing after it runs.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a status line prefixed with a yellow `!`.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
