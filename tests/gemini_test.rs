use serde_json::json;
use tuneflow::ai::{GeminiProvider, GenerateRequest, LlmProvider, Message};
use tuneflow::config::Settings;
use tuneflow::error::TuneflowError;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer, key: Option<&str>) -> GeminiProvider {
    GeminiProvider::new(&Settings {
        genai_api_url: server.uri(),
        genai_api_key: key.map(str::to_string),
        ..Settings::default()
    })
}

fn request(text: &str) -> GenerateRequest {
    GenerateRequest {
        messages: vec![Message::user_text(text)],
        tools: Vec::new(),
        temperature: Some(0.5),
    }
}

#[tokio::test]
async fn generate_collects_text_and_function_calls() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash:generateContent"))
        .and(header("x-goog-api-key", "genai-key"))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "hello" }] }],
            "generationConfig": { "temperature": 0.5 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "role": "model", "parts": [
                { "text": "Looking " },
                { "text": "it up" },
                { "functionCall": { "name": "extractSongInfo", "args": { "text": "x" } } }
            ] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(&server, Some("genai-key"))
        .generate(request("hello"))
        .await
        .unwrap();
    assert_eq!(response.text.as_deref(), Some("Looking it up"));
    assert_eq!(response.tool_calls.len(), 1);
    assert_eq!(response.tool_calls[0].name, "extractSongInfo");
    assert_eq!(response.tool_calls[0].arguments, json!({ "text": "x" }));
}

#[tokio::test]
async fn generate_without_candidates_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let err = provider(&server, Some("genai-key"))
        .generate(request("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, TuneflowError::Llm(_)));
}

#[tokio::test]
async fn generate_requires_an_api_key() {
    let server = MockServer::start().await;

    let err = provider(&server, None)
        .generate(request("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, TuneflowError::Config(_)));
}
