use std::{convert::Infallible, net::SocketAddr, str::FromStr, sync::Arc};

use axum::{Extension, Router, routing::get};
use tokio::sync::Mutex;

use crate::{
    api::{self, AppState},
    config::Settings,
    error::{Result, TuneflowError},
    types::PkceToken,
};

fn parse_addr(addr: &str) -> Result<SocketAddr> {
    SocketAddr::from_str(addr)
        .map_err(|e| TuneflowError::config(format!("Failed to parse server address {addr}: {e}")))
}

/// Serves the TuneFlow HTTP API until the process is stopped.
pub async fn start_api_server(state: AppState) -> Result<()> {
    let addr = parse_addr(&state.settings.server_addr)?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "tuneflow api listening");

    axum::serve(listener, api::router(state)).await?;
    Ok(())
}

/// Serves the OAuth callback for `tuneflow auth`.
pub async fn start_auth_server(
    settings: Arc<Settings>,
    state: Arc<Mutex<Option<PkceToken>>>,
) -> Result<()> {
    let addr = parse_addr(&settings.server_addr)?;
    let app = Router::new()
        .route("/health", get(api::health))
        .route(
            "/callback",
            get(api::callback)
                .layer::<_, Infallible>(Extension(state))
                .layer::<_, Infallible>(Extension(Arc::clone(&settings))),
        );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
