use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::chat::ChatMessage;

/// Outbound request to the completion aggregator.
///
/// Shaped like an OpenAI Chat Completions body with the aggregator's extra
/// `web_search` switch, which the relay always sends as `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub web_search: bool,
}

impl ProviderRequest {
    /// Single-turn user conversation against `model`, web search disabled.
    pub fn single_user_turn(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::new("user", prompt)],
            web_search: false,
        }
    }
}

/// Message inside a provider choice. Aggregators may send `content: null`.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderChoice {
    #[serde(default)]
    pub message: ProviderMessage,
}

/// Reply from the completion aggregator (subset; unknown fields are ignored).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    #[serde(default)]
    pub choices: Vec<ProviderChoice>,
}

impl ProviderResponse {
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            choices: vec![ProviderChoice {
                message: ProviderMessage {
                    role: Some("assistant".to_string()),
                    content: Some(content.into()),
                },
            }],
        }
    }

    /// `choices[0].message.content`, when present.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}
