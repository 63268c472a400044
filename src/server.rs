use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::CorsConfig;
use crate::error::{error_response, RelayError};
use crate::models::chat::{ChatCompletionRequest, ChatCompletionResponse};
use crate::relay::relay;
use crate::util::{cors_layer, AppState};

pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Client metadata headers that OpenAI SDKs and browsers send. They are logged at
/// debug level and never influence the relay.
const METADATA_HEADERS: &[&str] = &[
    "accept",
    "content-type",
    "user-agent",
    "referer",
    "sec-ch-ua",
    "sec-ch-ua-mobile",
    "sec-ch-ua-platform",
    "x-stainless-os",
    "x-stainless-arch",
    "x-stainless-lang",
    "x-stainless-runtime",
    "x-stainless-runtime-version",
    "x-stainless-package-version",
];

/// Build the Axum router with `/v1/chat/completions` and `/status`.
pub fn build_router(state: Arc<AppState>, cors: &CorsConfig) -> Router {
    Router::new()
        .route("/status", get(status))
        .route(CHAT_COMPLETIONS_PATH, post(chat_completions))
        .fallback(not_found)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(cors)),
        )
}

/// Service status endpoint. Never contacts the provider.
async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "chatrelay",
        "version": env!("CARGO_PKG_VERSION"),
        "routes": ["/status", CHAT_COMPLETIONS_PATH],
        "provider_model": state.target.model,
    }))
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not Found")
}

/// Relay a Chat Completions request to the provider.
///
/// Authorization is checked before the body is looked at, so an unauthenticated
/// caller always gets 401 even when the payload is malformed. The body is parsed as
/// JSON whatever `Content-Type` says.
async fn chat_completions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ChatCompletionResponse>, RelayError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("chat_completion", %request_id);
    handle(state, headers, body).instrument(span).await
}

async fn handle(
    state: Arc<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ChatCompletionResponse>, RelayError> {
    if let Err(e) = state.verify_bearer_header(&headers) {
        tracing::warn!("rejected request with missing or invalid bearer token");
        return Err(e);
    }

    log_client_metadata(&headers);

    let req = parse_request(body)?;

    tracing::debug!(
        requested_model = %req.model,
        messages = req.messages.len(),
        n = req.n,
        "relaying chat completion"
    );

    let resp = relay(state.provider.as_ref(), &state.target, &req).await?;
    Ok(Json(resp))
}

fn parse_request(
    body: Result<Bytes, BytesRejection>,
) -> Result<ChatCompletionRequest, RelayError> {
    let bytes = body.map_err(|rejection| {
        tracing::warn!(error = %rejection, "failed to read request body");
        RelayError::InvalidRequest(rejection.body_text())
    })?;
    serde_json::from_slice::<ChatCompletionRequest>(&bytes).map_err(|e| {
        tracing::warn!(error = %e, "rejected malformed request body");
        RelayError::InvalidRequest(format!("invalid request body: {e}"))
    })
}

fn log_client_metadata(headers: &HeaderMap) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    let meta = client_metadata(headers);
    if !meta.is_empty() {
        tracing::debug!(client = %meta.join(" "), "client metadata");
    }
}

/// `name=value` pairs for the metadata headers present on the request.
fn client_metadata(headers: &HeaderMap) -> Vec<String> {
    METADATA_HEADERS
        .iter()
        .filter_map(|name| {
            headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .map(|v| format!("{name}={v}"))
        })
        .collect()
}
