// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Agency Portal: client-side session and caching layer for the agency API.
//!
//! This crate provides the HTTP client with token refresh-and-retry, the
//! persisted Token Store, TTL-guarded resource caches and the auth session
//! controller that the portal's pages and back-office build on.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod resources;
pub mod session;
pub mod time_utils;

use api::ApiClient;
use auth::{AuthSession, Navigator};
use config::Config;
use resources::Resources;
use session::TokenStore;
use std::sync::Arc;
use time_utils::{Clock, SystemClock};

/// Shared application state.
pub struct Portal {
    pub config: Config,
    pub api: ApiClient,
    pub session: AuthSession,
    pub resources: Arc<Resources>,
}

impl Portal {
    /// Wire the layer together on the system clock.
    pub fn new(
        config: Config,
        store: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> error::Result<Self> {
        Self::with_clock(config, store, navigator, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: Config,
        store: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
        clock: Arc<dyn Clock>,
    ) -> error::Result<Self> {
        let api = ApiClient::new(&config, store.clone())?;
        let resources = Arc::new(Resources::new(&api, clock, config.cache_ttl));
        let session = AuthSession::new(api.clone(), store, navigator).on_logout({
            let resources = resources.clone();
            move || resources.invalidate_private()
        });

        Ok(Self {
            config,
            api,
            session,
            resources,
        })
    }

    /// Log out. Caches that belong to the signed-in user are dropped by the
    /// session's logout hook, so forced logouts clear them too.
    pub fn logout(&self) {
        self.session.logout();
    }
}
