//! Chat Completions → provider call → Chat Completions.
//!
//! Mapping rules:
//! - Only `messages[0].content` is forwarded, as a single `user` turn.
//! - The upstream model comes from [`RelayTarget`], never from the caller's
//!   `model`, `n`, `max_tokens`, `temperature` or `stop`.
//! - Provider web search is always off.
//! - The provider's `choices[0].message.content` is returned verbatim as the one
//!   and only assistant choice.

use std::time::Instant;

use crate::error::{ProviderError, RelayError};
use crate::models::chat::{ChatCompletionRequest, ChatCompletionResponse};
use crate::models::provider::ProviderRequest;
use crate::provider::CompletionProvider;

/// Fixed upstream target the relay forwards every prompt to.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayTarget {
    pub model: String,
}

impl RelayTarget {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

/// Build the upstream request for `req`. Rejects an empty `messages` list.
pub fn to_provider_request(
    req: &ChatCompletionRequest,
    target: &RelayTarget,
) -> Result<ProviderRequest, RelayError> {
    let prompt = req.first_content().ok_or_else(|| {
        RelayError::InvalidRequest("messages must contain at least one entry".into())
    })?;
    Ok(ProviderRequest::single_user_turn(target.model.clone(), prompt))
}

/// Relay one request: a single provider call, no retry.
pub async fn relay(
    provider: &dyn CompletionProvider,
    target: &RelayTarget,
    req: &ChatCompletionRequest,
) -> Result<ChatCompletionResponse, RelayError> {
    let outbound = to_provider_request(req, target)?;

    let started = Instant::now();
    let result = provider.complete(&outbound).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let reply = match result {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(
                error = %e,
                elapsed_ms,
                model = %target.model,
                "provider call failed"
            );
            return Err(e.into());
        }
    };
    tracing::info!(elapsed_ms, model = %target.model, "provider call completed");

    let content = reply
        .first_content()
        .ok_or(RelayError::Provider(ProviderError::EmptyResponse))?;
    Ok(ChatCompletionResponse::from_assistant_text(content))
}
