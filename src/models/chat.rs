use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Role reported on every relayed reply.
pub const ASSISTANT_ROLE: &str = "assistant";

/// Minimal Chat message model compatible with the Chat Completions API.
///
/// Only plain string content is accepted; multimodal part arrays are rejected
/// at deserialization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Chat Completions request as accepted by the relay.
///
/// Every field except `stop` is required so that obviously malformed payloads are
/// rejected up front. Only `messages[0].content` drives the relay; the sampling
/// fields are accepted for client compatibility and otherwise ignored.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub max_tokens: i64,
    pub temperature: f64,
    #[serde(default)]
    pub stop: Option<Vec<String>>,
    pub n: i64,
}

impl ChatCompletionRequest {
    /// Text of the first message, if any.
    pub fn first_content(&self) -> Option<&str> {
        self.messages.first().map(|m| m.content.as_str())
    }
}

// ============================================================================
// Chat Completions Response Models
// ============================================================================

/// Message in a relayed Chat Completions response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponseMessage {
    pub role: String, // always "assistant"
    pub content: String,
}

/// Choice in a relayed Chat Completions response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatChoice {
    pub message: ChatResponseMessage,
}

/// Relayed Chat Completions response. Carries exactly one choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

impl ChatCompletionResponse {
    /// Wrap provider text as the single assistant choice.
    pub fn from_assistant_text(content: impl Into<String>) -> Self {
        Self {
            choices: vec![ChatChoice {
                message: ChatResponseMessage {
                    role: ASSISTANT_ROLE.to_string(),
                    content: content.into(),
                },
            }],
        }
    }
}
