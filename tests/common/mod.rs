#![allow(dead_code)]

//! Shared helpers for relay integration tests.
//!
//! - `StubProvider`: in-process `CompletionProvider` that counts calls and records requests.
//! - `UpstreamStub`: a real HTTP server on an ephemeral port imitating an
//!   OpenAI-compatible aggregator, so `HttpProvider` can be exercised end to end.
//! - `spawn_relay`: the real relay router bound to an ephemeral port.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chatrelay::config::{CorsConfig, RelayConfig};
use chatrelay::provider_models::{ProviderRequest, ProviderResponse};
use chatrelay::{build_router, AppState, CompletionProvider, ProviderError, RelayTarget};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const SECRET: &str = "sk-1234567890abcdef";
pub const TARGET_MODEL: &str = "gpt-4o-mini";

/* =============================================
   In-process provider
   ============================================= */

pub struct StubProvider {
    reply: Result<ProviderResponse, ProviderError>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl StubProvider {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(ProviderResponse::with_content(text)),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(err: ProviderError) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(err),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().expect("lock stub requests").clone()
    }
}

#[async_trait]
impl CompletionProvider for StubProvider {
    async fn complete(
        &self,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("lock stub requests")
            .push(request.clone());
        self.reply.clone()
    }
}

/// Relay router wired to `provider`, expecting `SECRET` and targeting `TARGET_MODEL`.
pub fn app_with(provider: Arc<StubProvider>) -> Router {
    app_with_cors(provider, &CorsConfig::default())
}

pub fn app_with_cors(provider: Arc<StubProvider>, cors: &CorsConfig) -> Router {
    let state = AppState::new(provider, RelayTarget::new(TARGET_MODEL), SECRET);
    build_router(Arc::new(state), cors)
}

/// Minimal valid Chat Completions body.
pub fn sample_chat_request() -> serde_json::Value {
    serde_json::json!({
        "messages": [{"role": "user", "content": "Hello"}],
        "model": "gpt-4",
        "max_tokens": 100,
        "temperature": 0.7,
        "n": 1
    })
}

/* =============================================
   Stub upstream aggregator
   ============================================= */

#[derive(Clone)]
pub enum UpstreamReply {
    Json(StatusCode, serde_json::Value),
    Raw(StatusCode, &'static str),
}

/// One request as seen by the stub upstream.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Clone)]
struct UpstreamState {
    reply: UpstreamReply,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct UpstreamStub {
    base_url: String,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl UpstreamStub {
    pub async fn start(reply: UpstreamReply) -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = Arc::new(UpstreamState {
            reply,
            calls: calls.clone(),
            requests: requests.clone(),
        });

        let router = Router::new()
            .route("/v1/chat/completions", post(upstream_handler))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub upstream");
        let addr = listener.local_addr().expect("stub upstream local addr");
        let (tx, rx) = oneshot::channel::<()>();

        let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
            async move {
                let _ = rx.await;
            },
        );
        tokio::spawn(async move {
            if let Err(err) = server.await {
                eprintln!("Stub upstream error: {err:?}");
            }
        });

        UpstreamStub {
            base_url: format!("http://{}/v1", addr),
            calls,
            requests,
            shutdown: Some(tx),
        }
    }

    /// Completion reply in the shape aggregators send.
    pub async fn completing(text: &str) -> Self {
        Self::start(UpstreamReply::Json(
            StatusCode::OK,
            serde_json::json!({
                "id": "chatcmpl-stub",
                "object": "chat.completion",
                "created": 1_700_000_000,
                "model": "gpt-4o-mini",
                "provider": "Stub",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": text},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2}
            }),
        ))
        .await
    }

    /// Base URL suitable for `PROVIDER_BASE_URL` (ends in `/v1`).
    pub fn url(&self) -> String {
        self.base_url.clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn take_requests(&self) -> Vec<RecordedRequest> {
        let mut guard = self.requests.lock().expect("lock stub requests");
        guard.drain(..).collect()
    }
}

impl Drop for UpstreamStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn upstream_handler(
    State(state): State<Arc<UpstreamState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    if let Ok(mut guard) = state.requests.lock() {
        guard.push(RecordedRequest {
            authorization,
            body,
        });
    }

    match &state.reply {
        UpstreamReply::Json(status, body) => (*status, Json(body.clone())).into_response(),
        UpstreamReply::Raw(status, text) => (*status, *text).into_response(),
    }
}

/* =============================================
   Relay server on an ephemeral port
   ============================================= */

pub struct TestServer {
    pub base_url: String,
    pub addr: SocketAddr,
    join: JoinHandle<()>,
    client: reqwest::Client,
}

impl TestServer {
    /// POST JSON to `path` with an optional bearer token.
    pub async fn post_json<T: serde::Serialize>(
        &self,
        path: &str,
        body: &T,
        auth_bearer: Option<&str>,
    ) -> reqwest::Result<reqwest::Response> {
        let mut rb = self.client.post(format!("{}{}", self.base_url, path));
        if let Some(b) = auth_bearer {
            rb = rb.bearer_auth(b);
        }
        rb.json(body).send().await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.join.abort();
    }
}

/// Spawn the relay built from `config` (real `HttpProvider`) on an ephemeral port.
pub async fn spawn_relay(config: RelayConfig) -> TestServer {
    let state = Arc::new(AppState::from_config(&config));
    let app = build_router(state, &config.cors);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let server = axum::serve(listener, app.into_make_service());
    let join = tokio::spawn(async move {
        if let Err(e) = server.await {
            eprintln!("Test server error: {e:?}");
        }
    });

    TestServer {
        base_url: format!("http://{}", addr),
        addr,
        join,
        client: reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .no_proxy()
            .build()
            .expect("failed building reqwest client"),
    }
}
