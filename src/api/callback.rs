use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::Mutex;

use crate::{config::Settings, spotify::auth::exchange_code_pkce, types::PkceToken};

/// Completes the PKCE flow started by `tuneflow auth`.
///
/// Exchanges the authorization code for a token and stores it in the shared
/// state, where the waiting CLI picks it up.
pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(settings): Extension<Arc<Settings>>,
    Extension(shared_state): Extension<Arc<Mutex<Option<PkceToken>>>>,
) -> Html<&'static str> {
    if let Some(error) = params.get("error") {
        tracing::warn!(error = %error, "spotify authorization was denied");
        return Html("<h4>Login was cancelled.</h4>");
    }

    let Some(code) = params.get("code") else {
        return Html("<h4>Missing authorization code.</h4>");
    };

    let mut state = shared_state.lock().await;
    let Some(pkce_state) = state.as_mut() else {
        return Html("<h4>Missing PKCE code verifier.</h4>");
    };

    match exchange_code_pkce(&settings, code, &pkce_state.code_verifier).await {
        Ok(token) => {
            pkce_state.token = Some(token);
            Html("<h2>Authentication successful.</h2><p>You can close this window and return to TuneFlow.</p>")
        }
        Err(e) => {
            tracing::warn!(error = %e, "token exchange failed");
            Html("<h4>Login failed.</h4>")
        }
    }
}
