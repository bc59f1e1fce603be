// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Generic cached collection with a TTL guard and explicit invalidation.
//!
//! State lives in a `watch` channel: readers take snapshots or subscribe,
//! and the guard check plus the switch to `Loading` happen under the
//! channel's lock, so near-simultaneous fetches collapse into one request.
//!
//! Every issued fetch carries the generation it started in. `invalidate()`
//! bumps the generation, and a response from an older generation is
//! discarded instead of overwriting fresher data.

use crate::error::ApiError;
use crate::time_utils::Clock;
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Lifecycle of a cached collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// One resource's cached list.
///
/// `Succeeded` implies `last_fetched_at` is set and `items` holds the most
/// recent successful fetch. On failure the previous `items` are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedCollection<T> {
    pub items: Vec<T>,
    pub status: FetchStatus,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    generation: u64,
}

impl<T> Default for CachedCollection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            status: FetchStatus::Idle,
            last_fetched_at: None,
            error: None,
            generation: 0,
        }
    }
}

impl<T> CachedCollection<T> {
    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    /// A successful fetch happened less than `ttl` ago.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        self.status == FetchStatus::Succeeded
            && self
                .last_fetched_at
                .is_some_and(|fetched_at| now - fetched_at < ttl)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<Vec<T>, ApiError>> + Send + Sync>;

/// A cached collection plus the read call that fills it.
pub struct ResourceCache<T> {
    name: &'static str,
    state: Arc<watch::Sender<CachedCollection<T>>>,
    fetcher: Fetcher<T>,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
}

impl<T> ResourceCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an idle cache for `name` backed by `fetcher`.
    pub fn new<F, Fut>(name: &'static str, clock: Arc<dyn Clock>, ttl: Duration, fetcher: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>, ApiError>> + Send + 'static,
    {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| {
            tracing::warn!(
                resource = name,
                ttl_secs = ttl.as_secs(),
                default_secs = crate::config::DEFAULT_CACHE_TTL_SECS,
                "Cache TTL out of range, using default"
            );
            chrono::Duration::seconds(crate::config::DEFAULT_CACHE_TTL_SECS as i64)
        });

        Self {
            name,
            state: Arc::new(watch::Sender::new(CachedCollection::default())),
            fetcher: Arc::new(move || fetcher().boxed()),
            clock,
            ttl,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fetch unless a fetch is in flight or the data is still fresh.
    ///
    /// Skipped calls wait for any in-flight fetch to settle and return the
    /// resulting state, so concurrent callers all observe the same result.
    ///
    /// The request runs on its own task, so dropping the returned future
    /// never strands the cache in `Loading`.
    pub async fn fetch(&self) -> CachedCollection<T> {
        let now = self.clock.now();
        let mut issued = None;
        let ttl = self.ttl;

        self.state.send_if_modified(|state| {
            if state.is_loading() || state.is_fresh(now, ttl) {
                return false;
            }
            state.status = FetchStatus::Loading;
            issued = Some(state.generation);
            true
        });

        let Some(generation) = issued else {
            tracing::debug!(resource = self.name, "Fetch skipped (in flight or fresh)");
            return self.wait_settled().await;
        };

        tracing::debug!(resource = self.name, generation, "Fetching collection");
        let task = tokio::spawn({
            let state = self.state.clone();
            let fetcher = self.fetcher.clone();
            let clock = self.clock.clone();
            let name = self.name;
            async move {
                let result = fetcher().await;
                settle(&state, name, generation, clock.now(), result);
            }
        });

        if let Err(e) = task.await {
            tracing::error!(resource = self.name, error = %e, "Fetch task failed");
            settle(
                &self.state,
                self.name,
                generation,
                self.clock.now(),
                Err(ApiError::Internal(anyhow::anyhow!("fetch task failed: {}", e))),
            );
        }

        self.snapshot()
    }

    /// Drop cached items and freshness so the next `fetch()` hits the backend.
    pub fn invalidate(&self) {
        self.state.send_modify(|state| {
            state.generation += 1;
            state.items.clear();
            state.last_fetched_at = None;
            state.status = FetchStatus::Idle;
            state.error = None;
        });
        tracing::debug!(resource = self.name, "Collection invalidated");
    }

    pub fn snapshot(&self) -> CachedCollection<T> {
        self.state.borrow().clone()
    }

    /// Read a projection of the current state without cloning the items.
    pub fn select<R>(&self, selector: impl FnOnce(&CachedCollection<T>) -> R) -> R {
        selector(&self.state.borrow())
    }

    /// Change notifications for UI-style consumers.
    pub fn subscribe(&self) -> watch::Receiver<CachedCollection<T>> {
        self.state.subscribe()
    }

    async fn wait_settled(&self) -> CachedCollection<T> {
        let mut rx = self.state.subscribe();
        let settled = match rx.wait_for(|state| !state.is_loading()).await {
            Ok(state) => Some((*state).clone()),
            Err(_) => None,
        };
        settled.unwrap_or_else(|| self.snapshot())
    }
}

/// Apply a fetch result unless the cache was invalidated since it was issued.
fn settle<T>(
    state: &watch::Sender<CachedCollection<T>>,
    name: &'static str,
    generation: u64,
    fetched_at: DateTime<Utc>,
    result: Result<Vec<T>, ApiError>,
) {
    state.send_if_modified(|state| {
        if state.generation != generation || !state.is_loading() {
            tracing::debug!(
                resource = name,
                generation,
                current = state.generation,
                "Discarding response from an invalidated fetch"
            );
            return false;
        }

        match result {
            Ok(items) => {
                tracing::debug!(resource = name, count = items.len(), "Collection fetched");
                state.items = items;
                state.status = FetchStatus::Succeeded;
                state.last_fetched_at = Some(fetched_at);
                state.error = None;
            }
            Err(e) => {
                tracing::warn!(resource = name, error = %e, "Collection fetch failed");
                state.status = FetchStatus::Failed;
                state.error = Some(e.to_string());
            }
        }
        true
    });
}
