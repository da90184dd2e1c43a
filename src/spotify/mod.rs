//! # Spotify Integration Module
//!
//! Interface to the Spotify Web API for everything TuneFlow resolves or writes
//! on Spotify:
//!
//! ```text
//! Playlist orchestration / HTTP API / CLI
//!          ↓
//! Spotify Integration Layer
//!     ├── Authentication (PKCE user flow, client credentials)
//!     ├── Track search and resolution (query variants)
//!     ├── Playlist writing
//!     └── Browse categories (genre hints for playlist names)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//! ```
//!
//! ## Authentication
//!
//! Two kinds of tokens are in play:
//!
//! - **User tokens** come from the OAuth 2.0 PKCE flow started by `tuneflow auth`
//!   (or are passed as a bearer token to the HTTP service). They are required to
//!   search on behalf of the user and to create playlists.
//! - **App tokens** come from the client-credentials grant and are used for
//!   lookups that need no user, such as album art and browse categories. They
//!   are cached in-process until shortly before they expire.
//!
//! ## Rate Limiting
//!
//! Requests go through [`send`], which retries `502 Bad Gateway` after a pause
//! and honours `Retry-After` on `429 Too Many Requests` when the requested
//! delay is at most two minutes.
//!
//! ## API Coverage
//!
//! - `GET /search` - track search (limit 1)
//! - `GET /me` - current user id
//! - `POST /users/{user_id}/playlists` - create a playlist
//! - `POST /playlists/{playlist_id}/tracks` - add tracks in batches of 100
//! - `GET /browse/categories` - category names
//! - `POST /api/token` - code exchange, refresh and client credentials

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use tokio::time::sleep;

use crate::error::{Result, TuneflowError};

pub mod auth;
pub mod browse;
pub mod playlist;
pub mod search;

const MAX_ATTEMPTS: u32 = 3;
const BAD_GATEWAY_PAUSE: Duration = Duration::from_secs(10);
const MAX_RETRY_AFTER_SECS: u64 = 120;

/// Sends a Spotify request, retrying transient failures.
///
/// Returns the response on success, otherwise [`TuneflowError::Api`] carrying
/// Spotify's error message.
pub(crate) async fn send(request: RequestBuilder) -> Result<Response> {
    let mut attempt = 0;

    loop {
        attempt += 1;
        let builder = request
            .try_clone()
            .ok_or_else(|| TuneflowError::invalid_input("request body cannot be retried"))?;
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if attempt < MAX_ATTEMPTS {
            if status == StatusCode::BAD_GATEWAY {
                sleep(BAD_GATEWAY_PAUSE).await;
                continue;
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(0);
                if retry_after <= MAX_RETRY_AFTER_SECS {
                    sleep(Duration::from_secs(retry_after)).await;
                    continue;
                }
                tracing::warn!(retry_after, "spotify asked to back off for an unusually long time");
            }
        }

        return Err(TuneflowError::from_response("Spotify", response).await);
    }
}
