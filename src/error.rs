//! Error types shared by the TuneFlow library and HTTP service.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Library-wide result alias.
pub type Result<T> = std::result::Result<T, TuneflowError>;

/// Everything that can go wrong while extracting, resolving, or writing playlists.
#[derive(Debug, Error)]
pub enum TuneflowError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{service} API error ({status}): {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Cache error: {0}")]
    Cache(String),
}

impl TuneflowError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn llm<S: Into<String>>(message: S) -> Self {
        Self::Llm(message.into())
    }

    /// Turns a non-success upstream response into [`TuneflowError::Api`].
    ///
    /// Understands the error bodies of the services TuneFlow talks to:
    /// `{"error": {"message": ..}}` (Google, Spotify), `{"error_description": ..}`
    /// (OAuth), `{"errors": [{"error_message": ..}]}` (SoundCloud), else raw text.
    pub async fn from_response(service: &'static str, response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|json| {
                json["error"]["message"]
                    .as_str()
                    .or_else(|| json["error_description"].as_str())
                    .or_else(|| json["errors"][0]["error_message"].as_str())
                    .or_else(|| json["error"].as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                } else {
                    body
                }
            });

        TuneflowError::Api {
            service,
            status: status.as_u16(),
            message,
        }
    }

    /// HTTP status the error maps to when returned from an API handler.
    pub fn status_code(&self) -> StatusCode {
        match self {
            TuneflowError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            TuneflowError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            TuneflowError::NotFound(_) => StatusCode::NOT_FOUND,
            TuneflowError::Api { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            TuneflowError::Cache(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TuneflowError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }

        let message = match &self {
            TuneflowError::InvalidInput(m)
            | TuneflowError::Unauthorized(m)
            | TuneflowError::NotFound(m)
            | TuneflowError::Config(m) => m.clone(),
            TuneflowError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
