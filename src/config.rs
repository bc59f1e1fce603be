// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client configuration loaded from environment variables.
//!
//! The only externally required value is the API base URL, which defaults
//! to the relative `/api` path served next to the portal frontend.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_BASE_URL: &str = "/api";
const DEFAULT_APP_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_SESSION_FILE: &str = ".agency-session.json";
/// Cached collections are served without re-querying for 5 minutes.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 5 * 60;

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absolute API base URL (no trailing slash)
    pub api_base_url: String,
    /// Where the durable session tokens are kept
    pub session_file: PathBuf,
    /// Freshness window for cached collections
    pub cache_ttl: Duration,
    /// Optional transport timeout; none unless configured
    pub http_timeout: Option<Duration>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            api_base_url: resolve_base_url(DEFAULT_API_BASE_URL, DEFAULT_APP_ORIGIN),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            http_timeout: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let origin = env::var("APP_ORIGIN").unwrap_or_else(|_| DEFAULT_APP_ORIGIN.to_string());
        let base = env::var("API_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        Ok(Self {
            api_base_url: resolve_base_url(base.trim(), origin.trim()),
            session_file: env::var("SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE)),
            cache_ttl: cache_ttl(parse_secs("CACHE_TTL_SECS")?)?,
            http_timeout: parse_secs("HTTP_TIMEOUT_SECS")?.map(Duration::from_secs),
        })
    }

    /// Config pointing at an explicit API base, used by tests and tooling.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            api_base_url: resolve_base_url(base_url, DEFAULT_APP_ORIGIN),
            ..Self::default()
        }
    }
}

fn parse_secs(name: &'static str) -> Result<Option<u64>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(None),
    }
}

/// Cache TTL in seconds; must fit the timestamp arithmetic used for
/// freshness checks.
fn cache_ttl(secs: Option<u64>) -> Result<Duration, ConfigError> {
    let secs = secs.unwrap_or(DEFAULT_CACHE_TTL_SECS);
    let ttl = Duration::from_secs(secs);
    if chrono::Duration::from_std(ttl).is_err() {
        return Err(ConfigError::Invalid("CACHE_TTL_SECS", secs.to_string()));
    }
    Ok(ttl)
}

/// Join a relative base (e.g. `/api`) onto the app origin; absolute bases
/// are kept as-is. Trailing slashes are dropped.
fn resolve_base_url(base: &str, origin: &str) -> String {
    if base.starts_with("http://") || base.starts_with("https://") {
        return base.trim_end_matches('/').to_string();
    }

    format!(
        "{}/{}",
        origin.trim_end_matches('/'),
        base.trim_start_matches('/').trim_end_matches('/')
    )
    .trim_end_matches('/')
    .to_string()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    Invalid(&'static str, String),
}
