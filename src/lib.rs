#![forbid(unsafe_code)]
#![doc = r#"
Chatrelay

Expose an OpenAI-compatible `POST /v1/chat/completions` endpoint guarded by a shared
bearer secret, and relay the first message of each request to a free-tier completion
aggregator.

Crate highlights
- Library: pure mapping via `to_provider_request(&ChatCompletionRequest, &RelayTarget)`
  and the async `relay` driver over any `CompletionProvider`.
- HTTP server (in `server`): `/v1/chat/completions` and `/status`.
- Provider: `HttpProvider` talks to any OpenAI-compatible aggregator endpoint.

Modules
- `models`: Chat Completions shapes and provider wire shapes.
- `relay`: Mapping and the single-call relay.
- `provider`: Provider trait and HTTP implementation.
- `auth`: Bearer secret verification.
- `config`: Environment-driven configuration.
- `error`: Error taxonomy and HTTP mapping.
- `server`: Axum router/handlers (the binary uses this).
- `util`: Shared helpers (tracing, HTTP client, CORS, state).
"#]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod provider;
pub mod relay;
pub mod server;
pub mod util;

pub use crate::config::RelayConfig;
pub use crate::error::{ProviderError, RelayError};
pub use crate::provider::{CompletionProvider, HttpProvider};
pub use crate::relay::{relay, to_provider_request, RelayTarget};
pub use crate::server::build_router;
pub use crate::util::AppState;

// Re-export model namespaces for convenience (downstream users can do `use chatrelay::chat`).
pub use crate::models::{chat, provider as provider_models};
