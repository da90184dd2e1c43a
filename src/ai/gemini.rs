//! Google Generative Language API (`models/{model}:generateContent`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    ai::provider::{
        GenerateRequest, GenerateResponse, LlmProvider, Message, MessageRole, Part, ToolCall,
        ToolDescription,
    },
    config::Settings,
    error::{Result, TuneflowError},
    utils,
};

// Long prompts with tool round trips take a while to answer.
const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);

pub struct GeminiProvider {
    api_key: Option<String>,
    base_url: String,
    model: String,
    client: Client,
}

impl GeminiProvider {
    /// Builds the provider from settings. A missing API key only fails on use.
    pub fn new(settings: &Settings) -> Self {
        Self {
            api_key: settings.genai_api_key.clone(),
            base_url: settings.genai_api_url.trim_end_matches('/').to_string(),
            model: settings.genai_model.clone(),
            client: utils::http_client_with_timeout(GENERATE_TIMEOUT),
        }
    }

    fn to_gemini_request(request: &GenerateRequest) -> GeminiRequest {
        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(vec![GeminiTools {
                function_declarations: request.tools.iter().map(to_declaration).collect(),
            }])
        };

        GeminiRequest {
            contents: request.messages.iter().map(to_content).collect(),
            tools,
            generation_config: request.temperature.map(|temperature| GenerationConfig {
                temperature: Some(temperature),
            }),
        }
    }

    fn parse_response(response: GeminiResponse) -> Result<GenerateResponse> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| TuneflowError::llm("Gemini returned no candidates"))?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if let Some(call) = part.function_call {
                tool_calls.push(ToolCall {
                    name: call.name,
                    arguments: call.args.unwrap_or(Value::Null),
                });
            }
        }

        Ok(GenerateResponse {
            text: (!text.is_empty()).then_some(text),
            tool_calls,
        })
    }
}

fn to_declaration(tool: &ToolDescription) -> FunctionDeclaration {
    FunctionDeclaration {
        name: tool.name.clone(),
        description: tool.description.clone(),
        parameters: tool.parameters.clone(),
    }
}

fn to_content(message: &Message) -> GeminiContent {
    let role = match message.role {
        MessageRole::User => "user",
        MessageRole::Model => "model",
    };

    GeminiContent {
        role: Some(role.to_string()),
        parts: message
            .parts
            .iter()
            .map(|part| match part {
                Part::Text(text) => GeminiPart {
                    text: Some(text.clone()),
                    ..GeminiPart::default()
                },
                Part::ToolCall(call) => GeminiPart {
                    function_call: Some(FunctionCall {
                        name: call.name.clone(),
                        args: Some(call.arguments.clone()),
                    }),
                    ..GeminiPart::default()
                },
                Part::ToolResult { name, response } => GeminiPart {
                    function_response: Some(FunctionResponse {
                        name: name.clone(),
                        response: response.clone(),
                    }),
                    ..GeminiPart::default()
                },
            })
            .collect(),
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TuneflowError::config("GOOGLE_GENAI_API_KEY must be set"))?;

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        tracing::debug!(model = %self.model, messages = request.messages.len(), "calling gemini");

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&Self::to_gemini_request(&request))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TuneflowError::from_response("Gemini", response).await);
        }

        Self::parse_response(response.json::<GeminiResponse>().await?)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTools>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTools {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn serializes_tool_round_trip_messages() {
        let request = GenerateRequest {
            messages: vec![
                Message::user_text("Comment: Daft Punk - One More Time"),
                Message {
                    role: MessageRole::Model,
                    parts: vec![Part::ToolCall(ToolCall {
                        name: "extractSongInfo".into(),
                        arguments: json!({ "text": "Daft Punk - One More Time" }),
                    })],
                },
            ],
            tools: vec![ToolDescription {
                name: "extractSongInfo".into(),
                description: "Extracts song title and artist from a given text.".into(),
                parameters: json!({ "type": "object" }),
            }],
            temperature: None,
        };

        let body = serde_json::to_value(GeminiProvider::to_gemini_request(&request)).unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["parts"][0]["functionCall"]["name"], "extractSongInfo");
        assert_eq!(body["tools"][0]["functionDeclarations"][0]["name"], "extractSongInfo");
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn collects_text_and_function_calls() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "{\"songs\":" },
                        { "text": "[]}" },
                        { "functionCall": { "name": "extractSongInfo", "args": { "text": "x" } } }
                    ]
                }
            }]
        }))
        .unwrap();

        let parsed = GeminiProvider::parse_response(response).unwrap();
        assert_eq!(parsed.text.as_deref(), Some("{\"songs\":[]}"));
        assert_eq!(parsed.tool_calls.len(), 1);
    }
}
