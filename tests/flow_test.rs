use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use serde_json::json;
use tuneflow::ai::{
    ExtractRequest, GenerateRequest, GenerateResponse, LlmProvider, Part, SongExtractor, ToolCall,
    generate_playlist_name,
};
use tuneflow::config::Settings;
use tuneflow::error::{Result, TuneflowError};
use tuneflow::management::{CacheStore, MemoryCache};
use tuneflow::playlist::{PlaylistRequest, PlaylistTarget, build_playlist};
use tuneflow::types::{Comment, Song};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

type Script = dyn Fn(usize, &GenerateRequest) -> Result<GenerateResponse> + Send + Sync;

/// Language model stand-in that answers from a closure and counts calls.
struct ScriptedProvider {
    calls: AtomicUsize,
    script: Box<Script>,
}

impl ScriptedProvider {
    fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(usize, &GenerateRequest) -> Result<GenerateResponse> + Send + Sync + 'static,
    {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: Box::new(script),
        })
    }

    /// Always answers with the same text.
    fn answering(text: &str) -> Arc<Self> {
        let text = text.to_string();
        Self::new(move |_, _| Ok(reply(&text)))
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        (self.script)(call, &request)
    }
}

fn reply(text: &str) -> GenerateResponse {
    GenerateResponse {
        text: Some(text.to_string()),
        tool_calls: Vec::new(),
    }
}

fn songs_json(songs: &[(&str, &str)]) -> String {
    let songs: Vec<_> = songs
        .iter()
        .map(|(title, artist)| json!({ "title": title, "artist": artist }))
        .collect();
    json!({ "songs": songs }).to_string()
}

fn comment(text: &str) -> Comment {
    Comment {
        text: Some(text.to_string()),
        ..Comment::default()
    }
}

// Album art lookups spawned by the flow go nowhere.
fn offline_settings() -> Settings {
    Settings {
        itunes_api_url: "http://127.0.0.1:9".into(),
        musicbrainz_api_url: "http://127.0.0.1:9".into(),
        coverart_api_url: "http://127.0.0.1:9".into(),
        ..Settings::default()
    }
}

fn extractor(llm: Arc<ScriptedProvider>, cache: Arc<dyn CacheStore>) -> SongExtractor {
    SongExtractor::new(Arc::new(offline_settings()), llm, cache)
}

fn memory_cache() -> Arc<dyn CacheStore> {
    Arc::new(MemoryCache::new())
}

#[tokio::test]
async fn comments_go_through_the_tool_loop_and_are_deduplicated() {
    let llm = ScriptedProvider::new(|call, request| match call {
        0 => {
            let prompt = match &request.messages[0].parts[0] {
                Part::Text(text) => text.clone(),
                other => panic!("unexpected first part {other:?}"),
            };
            assert!(prompt.contains("Comment 1:\nMassive Attack - Teardrop"));
            assert!(!prompt.contains("🔥"));
            assert!(!prompt.contains("3:15"));
            assert_eq!(request.tools.len(), 1);

            Ok(GenerateResponse {
                text: None,
                tool_calls: vec![ToolCall {
                    name: "extractSongInfo".into(),
                    arguments: json!({ "text": "Massive Attack - Teardrop" }),
                }],
            })
        }
        1 => {
            assert_eq!(request.messages.len(), 3);
            match &request.messages[2].parts[0] {
                Part::ToolResult { name, response } => {
                    assert_eq!(name, "extractSongInfo");
                    assert_eq!(response["title"], "Teardrop");
                    assert_eq!(response["artist"], "Massive Attack");
                }
                other => panic!("expected a tool result, got {other:?}"),
            }
            Ok(reply(&format!(
                "```json\n{}\n```",
                songs_json(&[
                    ("Teardrop", "Massive Attack"),
                    ("Angel", "Massive Attack"),
                    ("Teardrop", "Massive Attack"),
                ])
            )))
        }
        _ => panic!("unexpected extra model call"),
    });

    let request = ExtractRequest {
        youtube_url: "https://youtu.be/dQw4w9WgXcQ".into(),
        comments: Some(vec![
            comment("🔥 3:15 Massive Attack - Teardrop 🔥"),
            comment("what a set"),
            Comment::default(),
        ]),
        ..ExtractRequest::default()
    };

    let songs = extractor(Arc::clone(&llm), memory_cache())
        .extract(&request)
        .await
        .unwrap();

    assert_eq!(
        songs,
        vec![
            Song::new("Teardrop", "Massive Attack"),
            Song::new("Angel", "Massive Attack"),
        ]
    );
    assert_eq!(llm.calls(), 2);
}

#[tokio::test]
async fn repeated_extraction_is_served_from_cache() {
    let llm = ScriptedProvider::answering(&songs_json(&[("Roygbiv", "Boards of Canada")]));
    let cache = memory_cache();
    let request = ExtractRequest {
        youtube_url: "dQw4w9WgXcQ".into(),
        comments: Some(vec![comment("Boards of Canada - Roygbiv")]),
        ..ExtractRequest::default()
    };

    let first = extractor(Arc::clone(&llm), Arc::clone(&cache))
        .extract(&request)
        .await
        .unwrap();
    let second = extractor(Arc::clone(&llm), Arc::clone(&cache))
        .extract(&request)
        .await
        .unwrap();

    assert_eq!(first, vec![Song::new("Roygbiv", "Boards of Canada")]);
    assert_eq!(first, second);
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn pinned_mode_stops_after_a_tracklist() {
    let five = songs_json(&[
        ("One", "A"),
        ("Two", "B"),
        ("Three", "C"),
        ("Four", "D"),
        ("Five", "E"),
    ]);
    // two comments too long to share a prompt
    let comments = vec![comment(&"a ".repeat(750)), comment(&"b ".repeat(750))];

    let pinned = ScriptedProvider::answering(&five);
    let request = ExtractRequest {
        youtube_url: "dQw4w9WgXcQ".into(),
        prioritize_pinned_comments: true,
        comments: Some(comments.clone()),
        ..ExtractRequest::default()
    };
    let songs = extractor(Arc::clone(&pinned), memory_cache())
        .extract(&request)
        .await
        .unwrap();
    assert_eq!(songs.len(), 5);
    assert_eq!(pinned.calls(), 1);

    let all = ScriptedProvider::answering(&five);
    let request = ExtractRequest {
        prioritize_pinned_comments: false,
        ..request
    };
    extractor(Arc::clone(&all), memory_cache())
        .extract(&request)
        .await
        .unwrap();
    assert_eq!(all.calls(), 2);
}

#[tokio::test]
async fn description_is_scanned_when_requested() {
    let llm = ScriptedProvider::new(|_, request| {
        let Part::Text(prompt) = &request.messages[0].parts[0] else {
            panic!("expected a text prompt");
        };
        assert!(prompt.contains("Tracklist: Aphex Twin - Xtal"));
        Ok(reply(&songs_json(&[("Xtal", "Aphex Twin")])))
    });

    let request = ExtractRequest {
        youtube_url: "dQw4w9WgXcQ".into(),
        scan_description: true,
        comments: Some(Vec::new()),
        description: Some("Tracklist: Aphex Twin - Xtal".into()),
        ..ExtractRequest::default()
    };

    let songs = extractor(Arc::clone(&llm), memory_cache())
        .extract(&request)
        .await
        .unwrap();
    assert_eq!(songs, vec![Song::new("Xtal", "Aphex Twin")]);
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn failed_description_fetch_keeps_comment_songs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let llm = ScriptedProvider::answering(&songs_json(&[("Teardrop", "Massive Attack")]));
    let settings = Settings {
        youtube_api_key: Some("yt-key".into()),
        youtube_api_url: server.uri(),
        ..offline_settings()
    };
    let request = ExtractRequest {
        youtube_url: "dQw4w9WgXcQ".into(),
        scan_description: true,
        comments: Some(vec![comment("Massive Attack - Teardrop")]),
        ..ExtractRequest::default()
    };

    let songs = SongExtractor::new(Arc::new(settings), llm.clone(), memory_cache())
        .extract(&request)
        .await
        .unwrap();
    assert_eq!(songs, vec![Song::new("Teardrop", "Massive Attack")]);
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn chapters_skip_comments_entirely() {
    let llm = ScriptedProvider::answering(&songs_json(&[("Teardrop", "Massive Attack")]));

    // no video id and no YouTube key: only the chapters path can succeed
    let request = ExtractRequest {
        chapters: Some("Intro\nMassive Attack - Teardrop".into()),
        ..ExtractRequest::default()
    };

    let songs = extractor(Arc::clone(&llm), memory_cache())
        .extract(&request)
        .await
        .unwrap();
    assert_eq!(songs, vec![Song::new("Teardrop", "Massive Attack")]);
}

#[tokio::test]
async fn empty_chapter_results_are_not_cached() {
    let llm = ScriptedProvider::answering(&songs_json(&[]));
    let cache = memory_cache();
    let request = ExtractRequest {
        chapters: Some("Intro\nOutro".into()),
        ..ExtractRequest::default()
    };

    for _ in 0..2 {
        let songs = extractor(Arc::clone(&llm), Arc::clone(&cache))
            .extract(&request)
            .await
            .unwrap();
        assert!(songs.is_empty());
    }
    assert_eq!(llm.calls(), 2);
}

#[tokio::test]
async fn invalid_url_is_rejected() {
    let llm = ScriptedProvider::answering("{}");
    let request = ExtractRequest {
        youtube_url: "https://example.com/video".into(),
        comments: Some(vec![comment("x")]),
        ..ExtractRequest::default()
    };

    let err = extractor(Arc::clone(&llm), memory_cache())
        .extract(&request)
        .await
        .unwrap_err();
    assert!(matches!(err, TuneflowError::InvalidInput(_)));
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn failing_batches_do_not_fail_the_extraction() {
    let llm = ScriptedProvider::new(|_, _| Err(TuneflowError::llm("quota exceeded")));
    let request = ExtractRequest {
        youtube_url: "dQw4w9WgXcQ".into(),
        comments: Some(vec![comment("Massive Attack - Teardrop")]),
        ..ExtractRequest::default()
    };

    let songs = extractor(Arc::clone(&llm), memory_cache())
        .extract(&request)
        .await
        .unwrap();
    assert!(songs.is_empty());
}

#[tokio::test]
async fn endless_tool_calls_are_cut_off() {
    let llm = ScriptedProvider::new(|_, _| {
        Ok(GenerateResponse {
            text: None,
            tool_calls: vec![ToolCall {
                name: "extractSongInfo".into(),
                arguments: json!({ "text": "again" }),
            }],
        })
    });
    let request = ExtractRequest {
        youtube_url: "dQw4w9WgXcQ".into(),
        comments: Some(vec![comment("loop forever")]),
        ..ExtractRequest::default()
    };

    let songs = extractor(Arc::clone(&llm), memory_cache())
        .extract(&request)
        .await
        .unwrap();
    assert!(songs.is_empty());
    assert_eq!(llm.calls(), 5);
}

#[tokio::test]
async fn playlist_name_is_unquoted() {
    let llm = ScriptedProvider::new(|_, request| {
        assert_eq!(request.temperature, Some(0.9));
        assert!(request.tools.is_empty());
        Ok(reply("  \"Trip-Hop Twilight\"\n"))
    });

    let name = generate_playlist_name(
        llm.as_ref(),
        &["Chill".to_string()],
        &[Song::new("Teardrop", "Massive Attack")],
    )
    .await
    .unwrap();
    assert_eq!(name, "Trip-Hop Twilight");
}

#[tokio::test]
async fn empty_playlist_name_is_an_error() {
    let llm = ScriptedProvider::answering("  ");
    let err = generate_playlist_name(llm.as_ref(), &[], &[]).await.unwrap_err();
    assert!(matches!(err, TuneflowError::Llm(_)));
}

fn playlist_settings(server: &MockServer) -> Arc<Settings> {
    Arc::new(Settings {
        youtube_api_key: Some("yt-key".into()),
        youtube_api_url: server.uri(),
        spotify_api_url: server.uri(),
        ..offline_settings()
    })
}

#[tokio::test]
async fn spotify_playlist_is_built_from_resolved_tracks() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "track:Teardrop artist:Massive Attack"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": { "items": [{
                "name": "Teardrop",
                "uri": "spotify:track:teardrop",
                "artists": [{ "name": "Massive Attack" }]
            }] }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tracks": { "items": [] } })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "user-1" })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/users/user-1/playlists"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "pl-1",
            "name": "Bristol",
            "external_urls": { "spotify": "https://open.spotify.com/playlist/pl-1" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/playlists/pl-1/tracks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "snapshot_id": "snap" })))
        .expect(1)
        .mount(&server)
        .await;

    let llm: Arc<dyn LlmProvider> = ScriptedProvider::answering(&songs_json(&[
        ("Teardrop", "Massive Attack"),
        ("Nonexistent", "Nobody"),
    ]));
    let request = PlaylistRequest {
        extract: ExtractRequest {
            youtube_url: "dQw4w9WgXcQ".into(),
            comments: Some(vec![comment("Massive Attack - Teardrop, Nobody - Nonexistent")]),
            ..ExtractRequest::default()
        },
        name: Some("Bristol".into()),
        ai_name: false,
        target: PlaylistTarget::Spotify,
        public: true,
    };

    let outcome = build_playlist(
        &playlist_settings(&server),
        &llm,
        &memory_cache(),
        "user-token",
        &request,
    )
    .await
    .unwrap();

    assert_eq!(outcome.name, "Bristol");
    assert_eq!(outcome.playlist_id, "pl-1");
    assert_eq!(outcome.track_count, 1);
    assert_eq!(outcome.failed, vec![Song::new("Nonexistent", "Nobody")]);
    assert!(outcome.video_insert_results.is_empty());
}

#[tokio::test]
async fn youtube_playlist_is_named_after_the_video() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "snippet": { "title": "Sunday Session", "description": "" } }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("type", "video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": { "videoId": "u7K72X4eo_s" } }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/playlists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "PL9" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/playlistItems"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "item" })))
        .expect(1)
        .mount(&server)
        .await;

    let llm: Arc<dyn LlmProvider> =
        ScriptedProvider::answering(&songs_json(&[("Teardrop", "Massive Attack")]));
    let request = PlaylistRequest {
        extract: ExtractRequest {
            youtube_url: "dQw4w9WgXcQ".into(),
            comments: Some(vec![comment("Massive Attack - Teardrop")]),
            ..ExtractRequest::default()
        },
        name: None,
        ai_name: false,
        target: PlaylistTarget::Youtube,
        public: true,
    };

    let outcome = build_playlist(
        &playlist_settings(&server),
        &llm,
        &memory_cache(),
        "google-token",
        &request,
    )
    .await
    .unwrap();

    assert_eq!(outcome.name, "Sunday Session Playlist");
    assert_eq!(outcome.playlist_id, "PL9");
    assert_eq!(outcome.track_count, 1);
    assert_eq!(outcome.video_insert_results[0].video_id, "u7K72X4eo_s");
}

#[tokio::test]
async fn playlist_without_songs_is_not_found() {
    let llm: Arc<dyn LlmProvider> = ScriptedProvider::answering(&songs_json(&[]));
    let request = PlaylistRequest {
        extract: ExtractRequest {
            youtube_url: "dQw4w9WgXcQ".into(),
            comments: Some(vec![comment("no songs here")]),
            ..ExtractRequest::default()
        },
        name: Some("Empty".into()),
        ai_name: false,
        target: PlaylistTarget::Spotify,
        public: true,
    };

    let err = build_playlist(
        &Arc::new(offline_settings()),
        &llm,
        &memory_cache(),
        "user-token",
        &request,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, TuneflowError::NotFound(m) if m == "No valid tracks found"));
}
