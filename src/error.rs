// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client error taxonomy shared by the HTTP client, caches and session.

/// Error type for every fallible call into the agency API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx response. `message` is the server body verbatim, or a
    /// synthesized "METHOD path failed: status text" when the body is empty.
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Session expired, please sign in again")]
    SessionExpired,

    #[error("Request failed: {0}")]
    Network(String),

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// HTTP status of the failed response, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for a 401 that was surfaced without recovery (login/refresh).
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Result type alias for API layer calls
pub type Result<T> = std::result::Result<T, ApiError>;
