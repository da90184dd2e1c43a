//! Provider-neutral types for talking to a language model with tool support.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Who produced a message in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Model,
}

/// One piece of a message.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    ToolCall(ToolCall),
    ToolResult { name: String, response: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    pub parts: Vec<Part>,
}

impl Message {
    pub fn user_text<S: Into<String>>(text: S) -> Self {
        Self {
            role: MessageRole::User,
            parts: vec![Part::Text(text.into())],
        }
    }
}

/// A function the model asked us to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Value,
}

/// Declaration of a callable tool, parameters given as JSON schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescription {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDescription>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateResponse {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

/// Language model backend used by the extraction flow.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logs (e.g. "gemini").
    fn name(&self) -> &str;

    /// Runs one generation turn.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;
}
