// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session refresh flow.
//!
//! The refresh call goes straight to the transport, never through
//! `ApiClient::request`, so a 401 from the refresh endpoint cannot start
//! another refresh.

use super::client::{error_from_response, ApiClient};
use crate::api::endpoints;
use crate::error::{ApiError, Result};
use crate::models::SessionTokens;
use reqwest::Method;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    access_token: &'a str,
    refresh_token: &'a str,
}

impl ApiClient {
    /// Exchange the stored token pair for a new session.
    ///
    /// On success all three fields are persisted together and the new access
    /// token is returned. On any failure (missing tokens, transport error,
    /// non-2xx, undecodable body) the Token Store is cleared.
    pub async fn refresh_session(&self) -> Result<String> {
        let result = self.exchange_refresh_token().await;

        match result {
            Ok(tokens) => {
                if let Err(e) = self.store.save(&tokens) {
                    self.clear_store();
                    return Err(e);
                }
                tracing::info!(role = %tokens.role, "Session refreshed");
                Ok(tokens.access_token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session refresh failed, clearing stored tokens");
                self.clear_store();
                Err(e)
            }
        }
    }

    /// Refresh on behalf of a request whose `rejected` token got a 401.
    ///
    /// Concurrent callers queue on the refresh lock; whoever gets it second
    /// sees that the stored token changed and reuses it instead of issuing
    /// another refresh. Returns `None` when the session cannot be recovered.
    pub(crate) async fn refresh_after_unauthorized(&self, rejected: Option<&str>) -> Option<String> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.store.access_token() {
            if rejected != Some(current.as_str()) {
                tracing::debug!("Token already refreshed by a concurrent request");
                return Some(current);
            }
        }

        self.refresh_session().await.ok()
    }

    async fn exchange_refresh_token(&self) -> Result<SessionTokens> {
        let session = self.store.load()?;
        let Some((access_token, refresh_token)) = session.token_pair() else {
            tracing::debug!("No stored token pair, skipping refresh");
            return Err(ApiError::SessionExpired);
        };

        let response = self
            .http
            .post(self.url(endpoints::REFRESH_TOKEN))
            .json(&RefreshRequest {
                access_token,
                refresh_token,
            })
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("Token refresh request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(
                error_from_response(&Method::POST, endpoints::REFRESH_TOKEN, response).await,
            );
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(format!("Failed to parse refresh response: {}", e)))
    }

    fn clear_store(&self) {
        if let Err(e) = self.store.clear() {
            tracing::error!(error = %e, "Failed to clear session store");
        }
    }
}
