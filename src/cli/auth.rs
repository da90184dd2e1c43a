use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{config::Settings, error, info, spotify, success, types::PkceToken};

pub async fn auth(settings: Arc<Settings>, shared_state: Arc<Mutex<Option<PkceToken>>>) {
    info!("Opening the Spotify login in your browser...");

    match spotify::auth::auth(settings, shared_state).await {
        Ok(token) => success!(
            "Authenticated with Spotify (scopes: {}).",
            if token.scope.is_empty() { "-" } else { token.scope.as_str() }
        ),
        Err(e) => error!("{}", e),
    }
}
