use serde_json::{Value, json};
use tuneflow::config::Settings;
use tuneflow::error::TuneflowError;
use tuneflow::types::Song;
use tuneflow::youtube;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer) -> Settings {
    Settings {
        youtube_api_key: Some("yt-key".into()),
        youtube_api_url: server.uri(),
        comment_pages: 2,
        ..Settings::default()
    }
}

fn thread(id: &str, text: &str, pinned: bool) -> Value {
    json!({
        "id": id,
        "snippet": {
            "topLevelComment": {
                "snippet": {
                    "authorDisplayName": "someone",
                    "textDisplay": text,
                    "publishedAt": "2024-01-01T00:00:00Z",
                    "pinned": pinned
                }
            }
        }
    })
}

#[tokio::test]
async fn comments_follow_page_tokens_up_to_the_page_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/commentThreads"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [thread("c3", "third", false)],
            "nextPageToken": "page-3"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/commentThreads"))
        .and(query_param("videoId", "dQw4w9WgXcQ"))
        .and(query_param("order", "relevance"))
        .and(query_param("key", "yt-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [thread("c1", "first", false), thread("c2", "second", false)],
            "nextPageToken": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let comments = youtube::fetch_comments(&settings(&server), "dQw4w9WgXcQ", false)
        .await
        .unwrap();

    let texts: Vec<_> = comments.iter().filter_map(|c| c.text.as_deref()).collect();
    assert_eq!(texts, vec!["first", "second", "third"]);
    assert_eq!(comments[0].id.as_deref(), Some("c1"));
    assert_eq!(comments[0].author.as_deref(), Some("someone"));
}

#[tokio::test]
async fn pinned_mode_reads_one_page_and_keeps_pinned_comments() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/commentThreads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                thread("c1", "tracklist", true),
                thread("c2", "nice mix", false)
            ],
            "nextPageToken": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let comments = youtube::fetch_comments(&settings(&server), "dQw4w9WgXcQ", true)
        .await
        .unwrap();

    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text.as_deref(), Some("tracklist"));
}

#[tokio::test]
async fn comments_surface_the_youtube_error_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/commentThreads"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "Comments are disabled for this video." }
        })))
        .mount(&server)
        .await;

    let err = youtube::fetch_comments(&settings(&server), "dQw4w9WgXcQ", false)
        .await
        .unwrap_err();

    match err {
        TuneflowError::Api { service, status, message } => {
            assert_eq!(service, "YouTube");
            assert_eq!(status, 403);
            assert_eq!(message, "Comments are disabled for this video.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn comments_require_an_api_key() {
    let settings = Settings::default();
    let err = youtube::fetch_comments(&settings, "dQw4w9WgXcQ", false)
        .await
        .unwrap_err();
    assert!(matches!(err, TuneflowError::Config(_)));
}

#[tokio::test]
async fn description_title_and_chapters_come_from_the_video_snippet() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("id", "dQw4w9WgXcQ"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": "dQw4w9WgXcQ",
                "snippet": {
                    "title": "Late Night Mix",
                    "description": "Tracklist\n0:00 Intro\n3:15 - Boards of Canada - Roygbiv\n1:02:03 Outro"
                }
            }]
        })))
        .mount(&server)
        .await;

    let settings = settings(&server);

    let title = youtube::fetch_title(&settings, "dQw4w9WgXcQ").await.unwrap();
    assert_eq!(title, "Late Night Mix");

    let description = youtube::fetch_description(&settings, "dQw4w9WgXcQ")
        .await
        .unwrap();
    assert!(description.starts_with("Tracklist"));

    let chapters = youtube::fetch_chapters(&settings, "dQw4w9WgXcQ").await;
    assert_eq!(chapters.len(), 3);
    assert_eq!(chapters[1].start, "3:15");
    assert_eq!(chapters[1].title, "Boards of Canada - Roygbiv");
    assert_eq!(chapters[2].start, "1:02:03");
    assert_eq!(
        youtube::chapters_text(&chapters),
        "Intro\nBoards of Canada - Roygbiv\nOutro"
    );
}

#[tokio::test]
async fn unknown_video_has_empty_description() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&server)
        .await;

    let description = youtube::fetch_description(&settings(&server), "xxxxxxxxxxx")
        .await
        .unwrap();
    assert!(description.is_empty());
}

#[tokio::test]
async fn chapters_are_empty_when_lookup_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(
        youtube::fetch_chapters(&settings(&server), "dQw4w9WgXcQ")
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn search_video_returns_first_hit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Teardrop Massive Attack"))
        .and(query_param("type", "video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": { "videoId": "u7K72X4eo_s" } }]
        })))
        .mount(&server)
        .await;

    let song = Song::new("Teardrop", "Massive Attack");
    let video_id = youtube::search_video(&settings(&server), &song).await.unwrap();
    assert_eq!(video_id.as_deref(), Some("u7K72X4eo_s"));
}

#[tokio::test]
async fn playlist_insert_failures_do_not_stop_the_rest() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/playlists"))
        .and(header("authorization", "Bearer oauth-token"))
        .and(body_partial_json(json!({
            "snippet": { "title": "Road Trip" },
            "status": { "privacyStatus": "public" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "PL42" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/playlistItems"))
        .and(body_partial_json(json!({
            "snippet": { "resourceId": { "videoId": "badbadbad00" } }
        })))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "message": "Video not found." }
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/playlistItems"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "item" })))
        .mount(&server)
        .await;

    let video_ids = vec![
        "dQw4w9WgXcQ".to_string(),
        " badbadbad00 ".to_string(),
        "u7K72X4eo_s".to_string(),
    ];
    let playlist = youtube::create_playlist(
        &settings(&server),
        "oauth-token",
        "Road Trip",
        None,
        &video_ids,
    )
    .await
    .unwrap();

    assert_eq!(playlist.playlist_id, "PL42");
    assert_eq!(
        playlist.playlist_url,
        "https://www.youtube.com/playlist?list=PL42"
    );
    assert_eq!(playlist.video_insert_results.len(), 3);

    let failed = &playlist.video_insert_results[1];
    assert_eq!(failed.video_id, "badbadbad00");
    assert_eq!(failed.status, 404);
    assert_eq!(failed.error.as_deref(), Some("Video not found."));

    assert!(playlist.video_insert_results[0].error.is_none());
    assert!(playlist.video_insert_results[2].error.is_none());
}

#[tokio::test]
async fn playlist_without_a_name_gets_the_default_title() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/playlists"))
        .and(body_partial_json(json!({
            "snippet": { "title": youtube::playlist::DEFAULT_PLAYLIST_TITLE }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "PL1" })))
        .expect(1)
        .mount(&server)
        .await;

    let playlist = youtube::create_playlist(&settings(&server), "oauth-token", "  ", None, &[])
        .await
        .unwrap();
    assert_eq!(playlist.playlist_id, "PL1");
    assert!(playlist.video_insert_results.is_empty());
}

#[tokio::test]
async fn playlist_requires_an_access_token() {
    let err = youtube::create_playlist(&Settings::default(), " ", "Mix", None, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, TuneflowError::Unauthorized(_)));
}
