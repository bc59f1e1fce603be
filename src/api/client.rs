// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Single choke point for backend calls.
//!
//! Handles:
//! - Bearer token injection from the Token Store
//! - JSON body serialization and response parsing
//! - Error normalization (server text surfaced verbatim)
//! - 401 recovery: one refresh, then one retry of the original request

use crate::api::endpoints;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::session::TokenStore;
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Method, extra headers and optional JSON body of one call.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    /// Merged over the defaults; caller wins on conflicts.
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize any body type into the request.
    pub fn json<B: Serialize + ?Sized>(self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidInput(format!("Unserializable body: {}", e)))?;
        Ok(self.body(value))
    }
}

/// Agency API client.
///
/// Cheap to clone; clones share the connection pool, the Token Store and
/// the refresh lock.
#[derive(Clone)]
pub struct ApiClient {
    pub(crate) http: reqwest::Client,
    base_url: String,
    pub(crate) store: Arc<dyn TokenStore>,
    /// Serializes refresh attempts so concurrent 401s share one refresh.
    pub(crate) refresh_lock: Arc<Mutex<()>>,
}

impl ApiClient {
    /// Create a client for the configured API base.
    pub fn new(config: &Config, store: Arc<dyn TokenStore>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed building API HTTP client")?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            store,
            refresh_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    /// Perform a call and return the parsed JSON body (`None` for 204 or an
    /// empty body).
    ///
    /// A 401 on any endpoint except login/refresh triggers the refresh flow.
    /// If a new access token comes back, the original request is resent
    /// exactly once and that outcome is final. If refresh fails, the Token
    /// Store is cleared and `ApiError::SessionExpired` is returned.
    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<Option<Value>> {
        let token = self.store.access_token();
        let headers = build_headers(&options.headers, token.as_deref())?;
        let response = self.send(endpoint, &options, headers).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return read_response(&options.method, endpoint, response).await;
        }

        if endpoints::is_auth_endpoint(endpoint) {
            return Err(error_from_response(&options.method, endpoint, response).await);
        }

        tracing::info!(
            method = %options.method,
            endpoint,
            "Access token rejected (401), attempting refresh"
        );

        let Some(new_token) = self.refresh_after_unauthorized(token.as_deref()).await else {
            tracing::warn!(endpoint, "Session refresh failed, session expired");
            return Err(ApiError::SessionExpired);
        };

        let mut headers = build_headers(&options.headers, None)?;
        headers.insert(AUTHORIZATION, bearer(&new_token)?);

        tracing::debug!(method = %options.method, endpoint, "Retrying request with refreshed token");
        let retry = self.send(endpoint, &options, headers).await?;
        read_response(&options.method, endpoint, retry).await
    }

    /// GET a JSON document and decode it.
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let value = self
            .request(endpoint, RequestOptions::get())
            .await?
            .ok_or_else(|| ApiError::Decode(format!("GET {} returned no body", endpoint)))?;

        serde_json::from_value(value)
            .map_err(|e| ApiError::Decode(format!("GET {}: {}", endpoint, e)))
    }

    /// Send a JSON body with the given method.
    pub async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
    ) -> Result<Option<Value>> {
        self.request(endpoint, RequestOptions::new(method).json(body)?)
            .await
    }

    async fn send(
        &self,
        endpoint: &str,
        options: &RequestOptions,
        headers: HeaderMap,
    ) -> Result<reqwest::Response> {
        let mut request = self
            .http
            .request(options.method.clone(), self.url(endpoint))
            .headers(headers);

        if let Some(body) = &options.body {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| ApiError::InvalidInput(format!("Unserializable body: {}", e)))?;
            request = request.body(bytes);
        }

        request.send().await.map_err(|e| {
            tracing::warn!(method = %options.method, endpoint, error = %e, "Request failed");
            ApiError::Network(e.to_string())
        })
    }
}

/// Defaults (`Content-Type`, `Authorization` when a token exists), then the
/// caller's headers on top.
fn build_headers(caller: &HeaderMap, token: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(token) = token {
        headers.insert(AUTHORIZATION, bearer(token)?);
    }

    for (name, value) in caller {
        headers.insert(name.clone(), value.clone());
    }

    Ok(headers)
}

fn bearer(token: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| ApiError::Storage("Stored access token is not a valid header value".to_string()))
}

/// Check status and parse the JSON body.
pub(crate) async fn read_response(
    method: &Method,
    endpoint: &str,
    response: reqwest::Response,
) -> Result<Option<Value>> {
    let status = response.status();
    if !status.is_success() {
        return Err(error_from_response(method, endpoint, response).await);
    }

    if status == StatusCode::NO_CONTENT {
        return Ok(None);
    }

    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| ApiError::Decode(format!("{} {}: {}", method, endpoint, e)))
}

/// Build an `ApiError::Http` from a failed response, keeping the server text.
pub(crate) async fn error_from_response(
    method: &Method,
    endpoint: &str,
    response: reqwest::Response,
) -> ApiError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = if body.trim().is_empty() {
        format!(
            "{} {} failed: {}",
            method,
            endpoint,
            status.canonical_reason().unwrap_or(status.as_str())
        )
    } else {
        body
    };

    ApiError::Http {
        status: status.as_u16(),
        message,
    }
}
