use std::{
    collections::HashMap,
    sync::{Arc, LazyLock},
    time::{Duration, Instant},
};

use base64::{Engine, prelude::BASE64_STANDARD};
use chrono::Utc;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{
    config::Settings,
    error::{Result, TuneflowError},
    management::TokenManager,
    server::start_auth_server,
    types::{ClientCredentialsResponse, PkceToken, Token},
    utils,
};

const AUTH_TIMEOUT: Duration = Duration::from_secs(60);

/// Builds the Spotify authorization URL for the PKCE flow.
pub fn authorization_url(settings: &Settings, code_challenge: &str) -> Result<String> {
    let mut url = url::Url::parse(&settings.spotify_auth_url)
        .map_err(|e| TuneflowError::config(format!("SPOTIFY_API_AUTH_URL is invalid: {e}")))?;
    url.query_pairs_mut()
        .append_pair("client_id", settings.spotify_client_id()?)
        .append_pair("response_type", "code")
        .append_pair("redirect_uri", &settings.spotify_redirect_uri)
        .append_pair("code_challenge", code_challenge)
        .append_pair("code_challenge_method", "S256")
        .append_pair("scope", &settings.spotify_scope)
        .append_pair("show_dialog", "true");
    Ok(url.to_string())
}

/// Runs the complete OAuth 2.0 PKCE flow and persists the resulting token.
///
/// 1. Generates a code verifier and its SHA256 challenge
/// 2. Starts the local callback server on `SERVER_ADDRESS`
/// 3. Opens the authorization URL in the default browser (or prints it)
/// 4. Waits up to a minute for the callback to deliver a token
/// 5. Stores the token for later runs and for the HTTP service
pub async fn auth(settings: Arc<Settings>, shared_state: Arc<Mutex<Option<PkceToken>>>) -> Result<Token> {
    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);
    let auth_url = authorization_url(&settings, &code_challenge)?;

    {
        let mut lock = shared_state.lock().await;
        *lock = Some(PkceToken {
            code_verifier,
            token: None,
        });
    }

    let server_state = Arc::clone(&shared_state);
    let server_settings = Arc::clone(&settings);
    tokio::spawn(async move {
        if let Err(e) = start_auth_server(server_settings, server_state).await {
            tracing::error!(error = %e, "callback server stopped");
        }
    });

    if webbrowser::open(&auth_url).is_err() {
        crate::warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let token = wait_for_token(shared_state)
        .await
        .ok_or_else(|| TuneflowError::unauthorized("Authentication failed or timed out."))?;

    TokenManager::new(token.clone())
        .persist()
        .await
        .map_err(|e| TuneflowError::Cache(format!("Failed to save token: {e}")))?;

    Ok(token)
}

/// Polls the shared state once a second until the callback stored a token.
async fn wait_for_token(shared_state: Arc<Mutex<Option<PkceToken>>>) -> Option<Token> {
    let start = Instant::now();

    while start.elapsed() < AUTH_TIMEOUT {
        let lock = shared_state.lock().await;
        if let Some(token) = lock.as_ref().and_then(|pkce| pkce.token.clone()) {
            return Some(token);
        }
        drop(lock);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}

/// Exchanges an authorization code plus PKCE verifier for a user token.
pub async fn exchange_code_pkce(settings: &Settings, code: &str, verifier: &str) -> Result<Token> {
    let client_id = settings.spotify_client_id()?;
    let response = utils::http_client()
        .post(&settings.spotify_token_url)
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", client_id),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", settings.spotify_redirect_uri.as_str()),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(TuneflowError::from_response("Spotify", response).await);
    }

    let json: Value = response.json().await?;
    token_from_json(&json)
}

/// Exchanges a refresh token for a fresh user token.
pub async fn refresh_token(settings: &Settings, refresh_token: &str) -> Result<Token> {
    let client_id = settings.spotify_client_id()?;
    let response = utils::http_client()
        .post(&settings.spotify_token_url)
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(TuneflowError::from_response("Spotify", response).await);
    }

    let json: Value = response.json().await?;
    token_from_json(&json)
}

fn token_from_json(json: &Value) -> Result<Token> {
    let access_token = json["access_token"]
        .as_str()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| TuneflowError::unauthorized("Spotify did not return an access token"))?;

    Ok(Token {
        access_token: access_token.to_string(),
        refresh_token: json["refresh_token"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        scope: json["scope"].as_str().unwrap_or_default().to_string(),
        expires_in: json["expires_in"].as_u64().unwrap_or(3600),
        obtained_at: Utc::now().timestamp() as u64,
    })
}

struct AppToken {
    access_token: String,
    expires_at: Instant,
}

/// Client-credentials tokens keyed by token endpoint and client id.
static APP_TOKENS: LazyLock<Mutex<HashMap<String, AppToken>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// App-level access token from the client-credentials grant.
///
/// Cached until 30 seconds before expiry.
pub async fn app_token(settings: &Settings) -> Result<String> {
    let client_id = settings.spotify_client_id()?;
    let client_secret = settings.spotify_client_secret()?;
    let cache_key = format!("{}|{}", settings.spotify_token_url, client_id);

    let mut tokens = APP_TOKENS.lock().await;
    if let Some(token) = tokens.get(&cache_key) {
        if token.expires_at > Instant::now() {
            return Ok(token.access_token.clone());
        }
    }

    let basic = BASE64_STANDARD.encode(format!("{client_id}:{client_secret}"));
    let response = utils::http_client()
        .post(&settings.spotify_token_url)
        .header(reqwest::header::AUTHORIZATION, format!("Basic {basic}"))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(TuneflowError::from_response("Spotify", response).await);
    }

    let body = response.json::<ClientCredentialsResponse>().await?;
    let lifetime = Duration::from_secs(body.expires_in).saturating_sub(Duration::from_secs(30));
    tokens.insert(
        cache_key,
        AppToken {
            access_token: body.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        },
    );

    Ok(body.access_token)
}
