use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{api::AppState, error::Result, soundcloud};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>> {
    let tracks = soundcloud::search_tracks(&state.settings, &query.q).await?;
    Ok(Json(json!({ "tracks": tracks })))
}
