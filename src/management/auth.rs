use std::path::PathBuf;

use chrono::Utc;

use crate::{config, config::Settings, spotify, types::Token};

/// Persists the Spotify user token obtained by `tuneflow auth` and refreshes it when stale.
pub struct TokenManager {
    token: Token,
}

impl TokenManager {
    pub fn new(token: Token) -> Self {
        TokenManager { token }
    }

    pub async fn load() -> Result<Self, String> {
        let path = Self::token_path();
        let content = async_fs::read_to_string(&path)
            .await
            .map_err(|e| e.to_string())?;
        let token: Token = serde_json::from_str(&content).map_err(|e| e.to_string())?;
        Ok(Self { token })
    }

    pub async fn persist(&self) -> Result<(), String> {
        let path = Self::token_path();
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(&self.token).map_err(|e| e.to_string())?;
        async_fs::write(path, json).await.map_err(|e| e.to_string())
    }

    /// Returns an access token, refreshing and persisting it first when it is about to expire.
    pub async fn get_valid_token(&mut self, settings: &Settings) -> String {
        if self.is_expired() {
            match spotify::auth::refresh_token(settings, &self.token.refresh_token).await {
                Ok(mut new_token) => {
                    // Spotify may omit the refresh token on refresh; keep the old one then.
                    if new_token.refresh_token.is_empty() {
                        new_token.refresh_token = self.token.refresh_token.clone();
                    }
                    self.token = new_token;
                    if let Err(e) = self.persist().await {
                        tracing::warn!(error = %e, "failed to persist refreshed token");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "spotify token refresh failed"),
            }
        }

        self.token.access_token.clone()
    }

    pub fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp() as u64;
        now + 240 >= self.token.obtained_at + self.token.expires_in
    }

    fn token_path() -> PathBuf {
        config::data_dir().join("cache/token.json")
    }
}
