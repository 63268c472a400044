//! Upstream completion provider.
//!
//! The relay only needs one operation from its collaborator: turn a
//! [`ProviderRequest`] into a [`ProviderResponse`]. `HttpProvider` speaks to any
//! OpenAI-compatible aggregator (e.g. a g4f API server) over HTTP; tests plug in
//! their own implementations.

use async_trait::async_trait;
use http::header;

use crate::config::RelayConfig;
use crate::error::ProviderError;
use crate::models::provider::{ProviderRequest, ProviderResponse};

/// Upstream error bodies are echoed back to the caller; keep them short.
const MAX_ERROR_BODY_CHARS: usize = 512;

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Perform exactly one completion call. Implementations must not retry.
    async fn complete(
        &self,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, ProviderError>;
}

/// OpenAI-compatible HTTP provider: `POST {base_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    pub fn from_config(client: reqwest::Client, config: &RelayConfig) -> Self {
        Self::new(
            client,
            config.provider_base_url.clone(),
            config.provider_api_key.clone(),
        )
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionProvider for HttpProvider {
    async fn complete(
        &self,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        let url = self.completions_url();
        let mut rb = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(request);
        if let Some(key) = &self.api_key {
            rb = rb.bearer_auth(key);
        }

        tracing::debug!(
            url = %url,
            model = %request.model,
            "sending upstream completion request"
        );
        let resp = rb.send().await?;

        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            let body: String = String::from_utf8_lossy(&bytes)
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            return Err(ProviderError::Status { status, body });
        }

        serde_json::from_slice::<ProviderResponse>(&bytes)
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }
}
