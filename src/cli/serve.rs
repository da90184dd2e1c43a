use std::sync::Arc;

use crate::{
    ai::GeminiProvider, api::AppState, config::Settings, error, info, management::build_cache,
    server::start_api_server,
};

pub async fn serve(settings: Arc<Settings>) {
    let state = AppState {
        cache: build_cache(settings.cache_backend),
        llm: Arc::new(GeminiProvider::new(&settings)),
        settings: Arc::clone(&settings),
    };

    info!("Serving the TuneFlow API on http://{}", settings.server_addr);
    if let Err(e) = start_api_server(state).await {
        error!("API server stopped: {}", e);
    }
}
