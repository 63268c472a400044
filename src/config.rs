//! Deployment-time configuration.
//!
//! All settings come from the process environment (optionally seeded from an env
//! file by `util::init_tracing`). `RelayConfig::from_lookup` takes an arbitrary
//! lookup function so tests never need to mutate the real environment.
//!
//! Environment:
//! - BIND_ADDR                      -> listen address (default 0.0.0.0:11434)
//! - RELAY_API_KEY                  -> inbound bearer secret
//! - PROVIDER_BASE_URL              -> OpenAI-compatible aggregator base URL
//! - PROVIDER_MODEL                 -> fixed upstream model
//! - PROVIDER_API_KEY               -> optional bearer for the aggregator
//! - RELAY_HTTP_TIMEOUT_SECONDS     -> overall upstream request timeout (u64)
//! - RELAY_NO_PROXY                 -> 1|true|yes|on disables all outbound proxies
//! - RELAY_PROXY_URL                -> proxy for all schemes
//! - HTTP_PROXY / http_proxy        -> HTTP proxy
//! - HTTPS_PROXY / https_proxy      -> HTTPS proxy
//! - CORS_ALLOWED_ORIGINS / CORS_ALLOWED_METHODS / CORS_ALLOWED_HEADERS
//!                                  -> "*" (mirror the request) or a comma-separated list
//! - CORS_ALLOW_CREDENTIALS         -> defaults to true
//! - CORS_MAX_AGE                   -> preflight max age in seconds (u64)

use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:11434";
pub const DEFAULT_API_KEY: &str = "sk-1234567890abcdef";
pub const DEFAULT_PROVIDER_BASE_URL: &str = "http://127.0.0.1:1337/v1";
pub const DEFAULT_PROVIDER_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{key}: invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Cross-origin policy. `None` lists mirror whatever the request asks for.
#[derive(Debug, Clone, PartialEq)]
pub struct CorsConfig {
    pub allowed_origins: Option<Vec<String>>,
    pub allowed_methods: Option<Vec<String>>,
    pub allowed_headers: Option<Vec<String>>,
    pub allow_credentials: bool,
    pub max_age: Option<Duration>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: None,
            allowed_methods: None,
            allowed_headers: None,
            allow_credentials: true,
            max_age: None,
        }
    }
}

/// Outbound HTTP client settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpClientConfig {
    pub timeout: Option<Duration>,
    pub no_proxy: bool,
    pub proxy_url: Option<String>,
    pub http_proxy: Option<String>,
    pub https_proxy: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    pub bind_addr: SocketAddr,
    /// Shared secret expected as `Authorization: Bearer <api_key>`.
    pub api_key: String,
    pub provider_base_url: String,
    /// Model sent upstream regardless of what the caller asked for.
    pub provider_model: String,
    pub provider_api_key: Option<String>,
    pub http: HttpClientConfig,
    pub cors: CorsConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 11434)),
            api_key: DEFAULT_API_KEY.to_string(),
            provider_base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
            provider_model: DEFAULT_PROVIDER_MODEL.to_string(),
            provider_api_key: None,
            http: HttpClientConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let get_either = |upper: &str, lower: &str| get(upper).or_else(|| get(lower));

        let bind_addr = match get("BIND_ADDR") {
            Some(v) => v.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                value: v.clone(),
                reason: e.to_string(),
            })?,
            None => Self::default().bind_addr,
        };

        let timeout = get("RELAY_HTTP_TIMEOUT_SECONDS")
            .map(|v| parse_u64("RELAY_HTTP_TIMEOUT_SECONDS", &v).map(Duration::from_secs))
            .transpose()?;

        let http = HttpClientConfig {
            timeout,
            no_proxy: parse_flag("RELAY_NO_PROXY", get("RELAY_NO_PROXY"), false)?,
            proxy_url: get("RELAY_PROXY_URL"),
            http_proxy: get_either("HTTP_PROXY", "http_proxy"),
            https_proxy: get_either("HTTPS_PROXY", "https_proxy"),
        };

        let cors = CorsConfig {
            allowed_origins: parse_list(
                "CORS_ALLOWED_ORIGINS",
                get("CORS_ALLOWED_ORIGINS"),
                check_origin,
            )?,
            allowed_methods: parse_list(
                "CORS_ALLOWED_METHODS",
                get("CORS_ALLOWED_METHODS"),
                check_method,
            )?,
            allowed_headers: parse_list(
                "CORS_ALLOWED_HEADERS",
                get("CORS_ALLOWED_HEADERS"),
                check_header_name,
            )?,
            allow_credentials: parse_flag(
                "CORS_ALLOW_CREDENTIALS",
                get("CORS_ALLOW_CREDENTIALS"),
                true,
            )?,
            max_age: get("CORS_MAX_AGE")
                .map(|v| parse_u64("CORS_MAX_AGE", &v).map(Duration::from_secs))
                .transpose()?,
        };

        Ok(Self {
            bind_addr,
            api_key: get("RELAY_API_KEY").unwrap_or_else(|| DEFAULT_API_KEY.to_string()),
            provider_base_url: get("PROVIDER_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_PROVIDER_BASE_URL.to_string()),
            provider_model: get("PROVIDER_MODEL")
                .unwrap_or_else(|| DEFAULT_PROVIDER_MODEL.to_string()),
            provider_api_key: get("PROVIDER_API_KEY"),
            http,
            cors,
        })
    }

    /// True when the inbound secret was never configured.
    pub fn uses_default_api_key(&self) -> bool {
        self.api_key == DEFAULT_API_KEY
    }
}

fn parse_u64(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|e| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_flag(
    key: &'static str,
    value: Option<String>,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(v) = value else {
        return Ok(default);
    };
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: v,
            reason: "expected one of 1,true,yes,on,0,false,no,off".into(),
        }),
    }
}

/// `*` alone (or nothing usable) means "mirror the request". Inside a list every
/// entry must pass `check`; a wildcard mixed with explicit entries is rejected.
fn parse_list(
    key: &'static str,
    value: Option<String>,
    check: fn(&str) -> Result<(), String>,
) -> Result<Option<Vec<String>>, ConfigError> {
    let Some(v) = value else {
        return Ok(None);
    };
    if v == "*" {
        return Ok(None);
    }
    let items: Vec<String> = v
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    for item in &items {
        let reason = if item == "*" {
            Some("\"*\" cannot be combined with other entries".to_string())
        } else {
            check(item).err()
        };
        if let Some(reason) = reason {
            return Err(ConfigError::Invalid {
                key,
                value: v.clone(),
                reason: format!("{item:?}: {reason}"),
            });
        }
    }
    Ok(if items.is_empty() { None } else { Some(items) })
}

fn check_origin(item: &str) -> Result<(), String> {
    http::HeaderValue::from_str(item)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

fn check_method(item: &str) -> Result<(), String> {
    http::Method::from_bytes(item.as_bytes())
        .map(|_| ())
        .map_err(|e| e.to_string())
}

fn check_header_name(item: &str) -> Result<(), String> {
    http::HeaderName::from_bytes(item.as_bytes())
        .map(|_| ())
        .map_err(|e| e.to_string())
}
