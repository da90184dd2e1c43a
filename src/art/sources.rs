//! Album art lookups against Spotify, iTunes and MusicBrainz/Cover Art Archive.
//!
//! Every source is best effort: errors are logged at debug level and reported
//! as "no image" so the next source gets its turn.

use serde_json::Value;

use crate::{
    config::Settings,
    error::Result,
    spotify::{self, auth::app_token},
    types::SearchResponse,
    utils,
};

const USER_AGENT: &str = concat!(
    "TuneFlow/",
    env!("CARGO_PKG_VERSION"),
    " ( https://tuneflow.chron0.tech )"
);

/// First image found for a song, trying Spotify, then iTunes, then MusicBrainz.
pub async fn resolve(settings: &Settings, title: &str, artist: &str) -> Option<String> {
    if let Some(url) = best_effort("spotify", spotify_art(settings, title, artist).await) {
        return Some(url);
    }
    if let Some(url) = best_effort("itunes", itunes_art(settings, title, artist).await) {
        return Some(url);
    }
    best_effort("musicbrainz", musicbrainz_art(settings, title, artist).await)
}

fn best_effort(source: &str, result: Result<Option<String>>) -> Option<String> {
    match result {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!(source, error = %e, "album art source failed");
            None
        }
    }
}

/// Largest album image of the first Spotify search hit.
pub async fn spotify_art(settings: &Settings, title: &str, artist: &str) -> Result<Option<String>> {
    let token = app_token(settings).await?;
    let q = format!("{title} {artist}");
    let request = utils::http_client()
        .get(format!("{}/search", settings.spotify_api_url))
        .query(&[("q", q.as_str()), ("type", "track"), ("limit", "1")])
        .bearer_auth(token);

    let results = spotify::send(request).await?.json::<SearchResponse>().await?;

    Ok(results
        .tracks
        .and_then(|page| page.items.into_iter().next())
        .and_then(|track| track.album)
        .and_then(|album| album.images.into_iter().next())
        .map(|image| image.url))
}

/// iTunes artwork, upscaled from the 100px thumbnail to 600px.
pub async fn itunes_art(settings: &Settings, title: &str, artist: &str) -> Result<Option<String>> {
    let term = format!("{title} {artist}");
    let response = utils::http_client()
        .get(format!("{}/search", settings.itunes_api_url))
        .query(&[("term", term.as_str()), ("entity", "song"), ("limit", "1")])
        .send()
        .await?
        .error_for_status()?;

    let json: Value = response.json().await?;
    Ok(json["results"][0]["artworkUrl100"]
        .as_str()
        .map(|url| url.replace("100x100", "600x600")))
}

/// Front cover from the Cover Art Archive for the best MusicBrainz release match.
pub async fn musicbrainz_art(
    settings: &Settings,
    title: &str,
    artist: &str,
) -> Result<Option<String>> {
    let client = utils::http_client();
    let query = format!("release:{title} AND artist:{artist}");
    let releases: Value = client
        .get(format!("{}/release/", settings.musicbrainz_api_url))
        .query(&[("query", query.as_str()), ("fmt", "json"), ("limit", "1")])
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let Some(mbid) = releases["releases"][0]["id"].as_str() else {
        return Ok(None);
    };

    let archive: Value = client
        .get(format!("{}/release/{}", settings.coverart_api_url, mbid))
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(pick_cover(&archive))
}

fn pick_cover(archive: &Value) -> Option<String> {
    let images = archive["images"].as_array()?;
    let image = images
        .iter()
        .find(|img| img["front"].as_bool().unwrap_or(false))
        .or_else(|| images.first())?;

    ["500", "250"]
        .iter()
        .find_map(|size| image["thumbnails"][*size].as_str())
        .or_else(|| image["image"].as_str())
        .map(str::to_string)
}
