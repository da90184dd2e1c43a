use crate::{config::Settings, error::Result, spotify::send, types::CategoriesResponse, utils};

use super::auth::app_token;

/// Names of Spotify's browse categories, used as genre hints.
pub async fn genres(settings: &Settings) -> Result<Vec<String>> {
    let token = app_token(settings).await?;
    let request = utils::http_client()
        .get(format!("{}/browse/categories", settings.spotify_api_url))
        .query(&[("limit", "50")])
        .bearer_auth(token);

    let response = send(request).await?;
    let categories = response.json::<CategoriesResponse>().await?;

    Ok(categories
        .categories
        .map(|page| page.items.into_iter().map(|c| c.name).collect())
        .unwrap_or_default())
}
