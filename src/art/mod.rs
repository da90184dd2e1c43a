//! # Album Art
//!
//! Cached, best-effort album art for extracted songs.
//!
//! Lookups never block a caller on the upstream sources. A cache miss takes a
//! short-lived fetch lock, starts the lookup in the background and answers
//! `pending`; the next status check finds the URL in the cache once the
//! lookup completes. Found images are cached for a day, misses are not cached
//! so a later request retries them.

use std::{
    sync::{Arc, LazyLock, Mutex, PoisonError},
    time::Duration,
};

use tokio::task::JoinSet;

use crate::{
    config::Settings,
    error::{Result, TuneflowError},
    management::{ALBUM_ART_TTL, CacheStore, FETCH_LOCK_TTL},
    types::{AlbumArt, ArtStatus, Song},
};

pub mod sources;

pub use sources::resolve;

const POLL_ATTEMPTS: u32 = 3;
const POLL_INTERVAL: Duration = Duration::from_secs(2);

// Background lookups started by this process, finished ones reaped on spawn.
static FETCHES: LazyLock<Mutex<JoinSet<()>>> = LazyLock::new(|| Mutex::new(JoinSet::new()));

pub fn art_key(title: &str, artist: &str) -> String {
    format!("albumArt:{title}|||{artist}")
}

pub fn fetch_lock_key(title: &str, artist: &str) -> String {
    format!("albumArt:fetching:{title}|||{artist}")
}

/// Current art state for a song, starting a background lookup on a miss.
pub async fn album_art_status(
    settings: &Settings,
    cache: &Arc<dyn CacheStore>,
    title: &str,
    artist: &str,
) -> Result<AlbumArt> {
    if title.trim().is_empty() || artist.trim().is_empty() {
        return Err(TuneflowError::invalid_input("Missing title or artist"));
    }

    match cache.get(&art_key(title, artist)).await {
        Ok(Some(image_url)) => {
            return Ok(AlbumArt {
                image_url: Some(image_url),
                status: ArtStatus::Ready,
            });
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!(error = %e, title, artist, "album art cache read failed");
            return Ok(AlbumArt {
                image_url: None,
                status: ArtStatus::CacheError,
            });
        }
    }

    let lock_key = fetch_lock_key(title, artist);
    match cache.set_if_absent(&lock_key, "1", FETCH_LOCK_TTL).await {
        Ok(true) => spawn_fetch(settings, cache, title, artist),
        Ok(false) => tracing::debug!(title, artist, "album art fetch already running"),
        Err(e) => tracing::warn!(error = %e, "could not take album art fetch lock"),
    }

    Ok(AlbumArt {
        image_url: None,
        status: ArtStatus::Pending,
    })
}

fn spawn_fetch(settings: &Settings, cache: &Arc<dyn CacheStore>, title: &str, artist: &str) {
    let settings = settings.clone();
    let cache = Arc::clone(cache);
    let title = title.to_string();
    let artist = artist.to_string();

    let mut fetches = FETCHES.lock().unwrap_or_else(PoisonError::into_inner);
    while fetches.try_join_next().is_some() {}
    fetches.spawn(async move {
        if let Some(url) = resolve(&settings, &title, &artist).await {
            if let Err(e) = cache.set(&art_key(&title, &artist), &url, ALBUM_ART_TTL).await {
                tracing::warn!(error = %e, "failed to cache album art");
            }
        } else {
            tracing::debug!(title, artist, "no album art found");
        }

        if let Err(e) = cache.delete(&fetch_lock_key(&title, &artist)).await {
            tracing::warn!(error = %e, "failed to release album art fetch lock");
        }
    });
}

/// Waits up to `limit` for background lookups to cache their result and
/// release their fetch lock.
///
/// Short-lived processes call this before exiting. A lookup cut off by the
/// runtime shutting down leaves its lock behind until `FETCH_LOCK_TTL`
/// expires, and every status check in between answers `pending`.
pub async fn finish_pending_fetches(limit: Duration) {
    let mut fetches = std::mem::take(&mut *FETCHES.lock().unwrap_or_else(PoisonError::into_inner));
    if fetches.is_empty() {
        return;
    }

    tracing::debug!(pending = fetches.len(), "waiting for album art lookups");
    let drain = async { while fetches.join_next().await.is_some() {} };
    if tokio::time::timeout(limit, drain).await.is_err() {
        tracing::warn!("album art lookups still running at exit");
    }
}

/// Cached art for `song`, if any. A miss schedules a background lookup.
pub async fn cached_art(
    settings: &Settings,
    cache: &Arc<dyn CacheStore>,
    song: &Song,
) -> Option<String> {
    match album_art_status(settings, cache, &song.title, &song.artist).await {
        Ok(art) => art.image_url,
        Err(_) => None,
    }
}

/// Checks the art status a few times, two seconds apart.
///
/// Returns `None` when no image turned up; callers report the song as an art
/// failure.
pub async fn poll_album_art(
    settings: &Settings,
    cache: &Arc<dyn CacheStore>,
    title: &str,
    artist: &str,
) -> Option<String> {
    for attempt in 1..=POLL_ATTEMPTS {
        match album_art_status(settings, cache, title, artist).await {
            Ok(AlbumArt {
                image_url: Some(url),
                ..
            }) => return Some(url),
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(error = %e, "album art poll rejected");
                return None;
            }
        }

        if attempt < POLL_ATTEMPTS {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    None
}

/// Fills `image_url` from the cache for every song that has none yet.
pub async fn attach_cached_art(
    settings: &Settings,
    cache: &Arc<dyn CacheStore>,
    songs: Vec<Song>,
) -> Vec<Song> {
    let mut enriched = Vec::with_capacity(songs.len());
    for mut song in songs {
        if song.image_url.is_none() {
            song.image_url = cached_art(settings, cache, &song).await;
        }
        enriched.push(song);
    }
    enriched
}
