use std::net::SocketAddr;

use anyhow::{Context, anyhow};
use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

pub const DEFAULT_BIND: &str = "0.0.0.0:4000";
pub const DEFAULT_LOG_FILTER: &str = "huddle=info,tower_http=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: SocketAddr,
    /// Empty allows any origin.
    pub allowed_origins: Vec<String>,
    pub log_filter: String,
}

impl Config {
    /// Reads `HUDDLE_BIND`, `HUDDLE_ALLOWED_ORIGINS` and `RUST_LOG`, with `.env` as a fallback.
    pub fn from_env() -> anyhow::Result<Config> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
        let bind = var("HUDDLE_BIND").unwrap_or_else(|| DEFAULT_BIND.to_owned());
        let bind = bind
            .parse::<SocketAddr>()
            .with_context(|| format!("HUDDLE_BIND={bind:?} is not a socket address"))?;

        let allowed_origins = var("HUDDLE_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let log_filter = var("RUST_LOG")
            .filter(|filter| !filter.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned());

        Ok(Config {
            bind,
            allowed_origins,
            log_filter,
        })
    }

    pub fn cors_layer(&self) -> anyhow::Result<CorsLayer> {
        if self.allowed_origins.is_empty() {
            return Ok(CorsLayer::permissive());
        }

        let origins = self
            .allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|_| anyhow!("bad CORS origin {origin:?}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any))
    }
}
