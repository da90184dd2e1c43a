use std::sync::Arc;

use tabled::Table;

use crate::{
    ai::{GeminiProvider, LlmProvider},
    cli::extract::{ExtractOptions, extract_request},
    config::Settings,
    error, info,
    management::{TokenManager, build_cache},
    playlist::{PlaylistRequest, PlaylistTarget, build_playlist},
    success, utils, warning,
};

#[derive(Debug, Clone)]
pub struct PlaylistOptions {
    pub name: Option<String>,
    pub ai_name: bool,
    pub target: PlaylistTarget,
    pub private: bool,
    pub extract: ExtractOptions,
}

async fn access_token(settings: &Settings, target: PlaylistTarget) -> String {
    match target {
        PlaylistTarget::Spotify => match TokenManager::load().await {
            Ok(mut manager) => manager.get_valid_token(settings).await,
            Err(_) => error!("Not authenticated with Spotify. Run `tuneflow auth` first."),
        },
        PlaylistTarget::Youtube => match settings.youtube_access_token.clone() {
            Some(token) => token,
            None => error!("YOUTUBE_ACCESS_TOKEN must be set to write YouTube playlists."),
        },
    }
}

pub async fn playlist(settings: Arc<Settings>, url: &str, opts: PlaylistOptions) {
    let token = access_token(&settings, opts.target).await;
    let cache = build_cache(settings.cache_backend);
    let llm: Arc<dyn LlmProvider> = Arc::new(GeminiProvider::new(&settings));

    let request = PlaylistRequest {
        extract: extract_request(&settings, url, &opts.extract).await,
        name: opts.name,
        ai_name: opts.ai_name,
        target: opts.target,
        public: !opts.private,
    };

    let pb = super::spinner("Extracting songs and building playlist...");
    let outcome = match build_playlist(&settings, &llm, &cache, &token, &request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            pb.finish_and_clear();
            error!("{}", e);
        }
    };
    pb.finish_and_clear();

    success!(
        "Created playlist \"{}\" with {} tracks",
        outcome.name,
        outcome.track_count
    );
    if let Some(url) = &outcome.playlist_url {
        info!("{}", url);
    }

    for result in outcome.video_insert_results.iter().filter(|r| r.error.is_some()) {
        warning!(
            "Could not add video {}: {}",
            result.video_id,
            result.error.as_deref().unwrap_or_default()
        );
    }

    if !outcome.failed.is_empty() {
        warning!("{} songs could not be found:", outcome.failed.len());
        println!("{}", Table::new(utils::build_song_rows(&outcome.failed)));
    }
}
