//! SoundCloud track search.

use serde_json::Value;

use crate::{
    config::Settings,
    error::{Result, TuneflowError},
    utils,
};

/// Up to ten SoundCloud tracks matching `q`, as returned by the API.
pub async fn search_tracks(settings: &Settings, q: &str) -> Result<Value> {
    if q.trim().is_empty() {
        return Err(TuneflowError::invalid_input("Missing query"));
    }

    let client_id = settings.soundcloud_client_id()?;
    let response = utils::http_client()
        .get(format!("{}/tracks", settings.soundcloud_api_url))
        .query(&[("q", q), ("client_id", client_id), ("limit", "10")])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(TuneflowError::from_response("SoundCloud", response).await);
    }

    Ok(response.json::<Value>().await?)
}
