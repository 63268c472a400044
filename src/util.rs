use std::path::Path;
use std::sync::Arc;

use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{CorsConfig, HttpClientConfig, RelayConfig};
use crate::error::RelayError;
use crate::provider::{CompletionProvider, HttpProvider};
use crate::relay::RelayTarget;

/// Variables that may point at an explicit env file, checked in order.
const ENV_FILE_KEYS: [&str; 3] = ["ENV_FILE", "ENVFILE", "DOTENV_PATH"];
const DEFAULT_LOG_FILTER: &str = "info,tower_http=info";

/// Seed the process environment from the first env file found: an explicit path
/// from [`ENV_FILE_KEYS`], then `.envfile`, then the usual `.env` lookup.
/// Already-set variables win over file entries.
pub fn load_env_file() -> Option<String> {
    let explicit = ENV_FILE_KEYS.iter().find_map(|key| {
        let raw = std::env::var(key).ok()?;
        let path = raw.trim();
        let loaded =
            !path.is_empty() && Path::new(path).is_file() && dotenvy::from_filename(path).is_ok();
        loaded.then(|| format!("{path} ({key})"))
    });

    explicit
        .or_else(|| {
            let loaded =
                Path::new(".envfile").is_file() && dotenvy::from_filename(".envfile").is_ok();
            loaded.then(|| ".envfile".to_string())
        })
        .or_else(|| dotenvy::dotenv().ok().map(|p| p.display().to_string()))
}

/// Load the env file, then install the fmt subscriber filtered by `RUST_LOG`
/// (which the env file may set). Returns the env file that was used, if any.
pub fn init_tracing() -> Option<String> {
    let env_source = load_env_file();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = fmt().with_env_filter(filter).try_init();
    env_source
}

/// Shared application state used by the HTTP server and handlers.
pub struct AppState {
    pub provider: Arc<dyn CompletionProvider>,
    pub target: RelayTarget,
    api_key: String,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        target: RelayTarget,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            target,
            api_key: api_key.into(),
        }
    }

    /// Wire the HTTP provider described by `config`.
    pub fn from_config(config: &RelayConfig) -> Self {
        let client = build_http_client(&config.http);
        let provider = HttpProvider::from_config(client, config);
        let target = RelayTarget::new(config.provider_model.clone());
        Self::new(Arc::new(provider), target, config.api_key.clone())
    }

    /// Verify the incoming `Authorization: Bearer` header against the shared secret.
    pub fn verify_bearer_header(&self, headers: &http::HeaderMap) -> Result<(), RelayError> {
        crate::auth::verify_headers(&self.api_key, headers)
    }
}

/// Build the outbound HTTP client honoring proxy and timeout settings.
pub fn build_http_client(cfg: &HttpClientConfig) -> reqwest::Client {
    let mut builder = reqwest::Client::builder();

    if let Some(timeout) = cfg.timeout {
        builder = builder.timeout(timeout);
    }

    if cfg.no_proxy {
        builder = builder.no_proxy();
    } else {
        if let Some(u) = cfg.proxy_url.as_deref() {
            match reqwest::Proxy::all(u) {
                Ok(p) => builder = builder.proxy(p),
                Err(e) => tracing::warn!(proxy = %u, error = %e, "ignoring invalid proxy URL"),
            }
        }
        if let Some(u) = cfg.http_proxy.as_deref() {
            match reqwest::Proxy::http(u) {
                Ok(p) => builder = builder.proxy(p),
                Err(e) => tracing::warn!(proxy = %u, error = %e, "ignoring invalid HTTP proxy"),
            }
        }
        if let Some(u) = cfg.https_proxy.as_deref() {
            match reqwest::Proxy::https(u) {
                Ok(p) => builder = builder.proxy(p),
                Err(e) => tracing::warn!(proxy = %u, error = %e, "ignoring invalid HTTPS proxy"),
            }
        }
    }

    builder = builder.user_agent(format!("chatrelay/{}", env!("CARGO_PKG_VERSION")));

    builder.build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "falling back to default HTTP client");
        reqwest::Client::new()
    })
}

/// Build the CORS layer.
///
/// Unset lists mirror the request (`Origin`, requested method and headers), which
/// is the only way to combine "allow everything" with credentials.
pub fn cors_layer(cfg: &CorsConfig) -> CorsLayer {
    let mut layer = CorsLayer::new();

    layer = match &cfg.allowed_origins {
        None => layer.allow_origin(AllowOrigin::mirror_request()),
        Some(origins) => {
            let vals: Vec<http::HeaderValue> = origins
                .iter()
                .filter_map(|o| http::HeaderValue::from_str(o).ok())
                .collect();
            layer.allow_origin(AllowOrigin::list(vals))
        }
    };

    layer = match &cfg.allowed_methods {
        None => layer.allow_methods(AllowMethods::mirror_request()),
        Some(methods) => {
            let vals: Vec<http::Method> = methods
                .iter()
                .filter_map(|m| http::Method::from_bytes(m.to_ascii_uppercase().as_bytes()).ok())
                .collect();
            layer.allow_methods(AllowMethods::list(vals))
        }
    };

    layer = match &cfg.allowed_headers {
        None => layer.allow_headers(AllowHeaders::mirror_request()),
        Some(headers) => {
            let vals: Vec<http::HeaderName> = headers
                .iter()
                .filter_map(|h| http::HeaderName::try_from(h.as_str()).ok())
                .collect();
            layer.allow_headers(AllowHeaders::list(vals))
        }
    };

    if cfg.allow_credentials {
        layer = layer.allow_credentials(true);
    }
    if let Some(max_age) = cfg.max_age {
        layer = layer.max_age(max_age);
    }

    layer
}
