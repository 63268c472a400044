//! Data models for the relay.
//!
//! - `chat`: the OpenAI Chat Completions subset accepted from clients and returned to them.
//! - `provider`: the body exchanged with the upstream completion aggregator.
//!
//! The mapping between the two lives in `crate::relay`.

pub mod chat;
pub mod provider;

pub use chat::{
    ChatChoice, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatResponseMessage,
};
pub use provider::{ProviderChoice, ProviderMessage, ProviderRequest, ProviderResponse};
