use std::sync::Arc;

use tabled::Table;

use crate::{
    ai::{ExtractRequest, GeminiProvider, LlmProvider, SongExtractor},
    art,
    config::Settings,
    error, info,
    management::{CacheStore, build_cache},
    success,
    types::Song,
    utils, warning, youtube,
};

#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    pub pinned: bool,
    pub description: bool,
    pub chapters: bool,
    pub art: bool,
}

/// Builds the extraction request for a video, reading chapters up front when asked.
pub(crate) async fn extract_request(
    settings: &Settings,
    url: &str,
    opts: &ExtractOptions,
) -> ExtractRequest {
    let mut request = ExtractRequest {
        youtube_url: url.to_string(),
        prioritize_pinned_comments: opts.pinned,
        scan_description: opts.description,
        ..ExtractRequest::default()
    };

    if opts.chapters {
        let video_id = match utils::parse_video_id(url) {
            Ok(id) => id,
            Err(e) => error!("{}", e),
        };
        let chapters = youtube::fetch_chapters(settings, &video_id).await;
        if chapters.is_empty() {
            warning!("No chapters found, falling back to comments.");
        } else {
            info!("Found {} chapters", chapters.len());
            request.chapters = Some(youtube::chapters_text(&chapters));
        }
    }

    request
}

pub async fn extract(settings: Arc<Settings>, url: &str, opts: ExtractOptions) {
    let cache = build_cache(settings.cache_backend);
    let llm: Arc<dyn LlmProvider> = Arc::new(GeminiProvider::new(&settings));

    let request = extract_request(&settings, url, &opts).await;
    let extractor = SongExtractor::new(Arc::clone(&settings), llm, Arc::clone(&cache));

    let pb = super::spinner("Extracting songs...");
    let songs = match extractor.extract(&request).await {
        Ok(songs) => songs,
        Err(e) => {
            pb.finish_and_clear();
            error!("{}", e);
        }
    };
    pb.finish_and_clear();

    if songs.is_empty() {
        info!("No songs identified in the comments or description.");
        return;
    }

    let songs = if opts.art {
        with_album_art(&settings, &cache, songs).await
    } else {
        songs
    };

    success!("Found {} songs", songs.len());
    println!("{}", Table::new(utils::build_song_rows(&songs)));
}

async fn with_album_art(settings: &Settings, cache: &Arc<dyn CacheStore>, songs: Vec<Song>) -> Vec<Song> {
    let pb = super::spinner("Fetching album art...");
    let mut failed = Vec::new();
    let mut enriched = Vec::with_capacity(songs.len());

    for mut song in songs {
        if song.image_url.is_none() {
            pb.set_message(format!("Fetching album art for {}", song));
            song.image_url = art::poll_album_art(settings, cache, &song.title, &song.artist).await;
            if song.image_url.is_none() {
                failed.push(song.to_string());
            }
        }
        enriched.push(song);
    }
    pb.finish_and_clear();

    if !failed.is_empty() {
        warning!("No album art for {} songs: {}", failed.len(), failed.join("; "));
    }
    enriched
}
