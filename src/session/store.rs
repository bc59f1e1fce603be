// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token Store: the access token, refresh token and role, written and
//! cleared as a group.
//!
//! Only the login, logout and refresh flows write here. Everything else
//! reads through the HTTP client.

use crate::error::ApiError;
use crate::models::{Role, SessionTokens};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

/// What is currently persisted. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, rename = "userRole", skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl StoredSession {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.role.is_none()
    }

    /// Both tokens, if both are present.
    pub fn token_pair(&self) -> Option<(&str, &str)> {
        Some((self.access_token.as_deref()?, self.refresh_token.as_deref()?))
    }
}

impl From<&SessionTokens> for StoredSession {
    fn from(tokens: &SessionTokens) -> Self {
        Self {
            access_token: Some(tokens.access_token.clone()),
            refresh_token: Some(tokens.refresh_token.clone()),
            role: Some(tokens.role),
        }
    }
}

/// Durable key/value storage for the session.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<StoredSession, ApiError>;

    /// Persist all three fields, or none of them.
    fn save(&self, tokens: &SessionTokens) -> Result<(), ApiError>;

    /// Remove all three fields.
    fn clear(&self) -> Result<(), ApiError>;

    /// Current access token; storage errors read as "no token".
    fn access_token(&self) -> Option<String> {
        match self.load() {
            Ok(session) => session.access_token,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session store");
                None
            }
        }
    }
}

/// In-memory store with process lifetime.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    session: RwLock<StoredSession>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an arbitrary (possibly partial) persisted state.
    pub fn with_session(session: StoredSession) -> Self {
        Self {
            session: RwLock::new(session),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<StoredSession, ApiError> {
        self.session
            .read()
            .map(|s| s.clone())
            .map_err(|_| ApiError::Storage("session lock poisoned".to_string()))
    }

    fn save(&self, tokens: &SessionTokens) -> Result<(), ApiError> {
        let mut session = self
            .session
            .write()
            .map_err(|_| ApiError::Storage("session lock poisoned".to_string()))?;
        *session = StoredSession::from(tokens);
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        let mut session = self
            .session
            .write()
            .map_err(|_| ApiError::Storage("session lock poisoned".to_string()))?;
        *session = StoredSession::default();
        Ok(())
    }
}

/// JSON file store that survives restarts.
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// reader sees either the old triple or the new one.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, session: &StoredSession) -> Result<(), ApiError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let json = serde_json::to_vec_pretty(session)
            .map_err(|e| ApiError::Storage(format!("Failed to encode session: {}", e)))?;

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| ApiError::Storage(format!("Failed to write {}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            ApiError::Storage(format!("Failed to replace {}: {}", self.path.display(), e))
        })
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<StoredSession, ApiError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoredSession::default())
            }
            Err(e) => {
                return Err(ApiError::Storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            ApiError::Storage(format!("Corrupt session file {}: {}", self.path.display(), e))
        })
    }

    fn save(&self, tokens: &SessionTokens) -> Result<(), ApiError> {
        self.write(&StoredSession::from(tokens))
    }

    fn clear(&self) -> Result<(), ApiError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApiError::Storage(format!(
                "Failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}
