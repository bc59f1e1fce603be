// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! A REST collection paired with its cache.
//!
//! Every write invalidates the cache once the write has been attempted,
//! whatever its outcome. Callers re-`fetch()` afterwards.

use crate::api::{endpoints, ApiClient, RequestOptions};
use crate::cache::{CachedCollection, ResourceCache};
use crate::error::Result;
use crate::models::{AccountStatus, EntityId, UserAccount};
use crate::time_utils::Clock;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// A cached, mutable backend collection.
pub struct Resource<T> {
    api: ApiClient,
    /// Base path for item-level writes (`{collection}/{id}`)
    collection: &'static str,
    cache: ResourceCache<T>,
}

impl<T> Resource<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// `list` is read by `fetch()`; writes go to `collection`.
    pub fn new(
        api: &ApiClient,
        name: &'static str,
        list: &'static str,
        collection: &'static str,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        let fetch_api = api.clone();
        let cache = ResourceCache::new(name, clock, ttl, move || {
            let api = fetch_api.clone();
            async move { api.get_json::<Vec<T>>(list).await }
        });

        Self {
            api: api.clone(),
            collection,
            cache,
        }
    }

    pub async fn fetch(&self) -> CachedCollection<T> {
        self.cache.fetch().await
    }

    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    pub fn cache(&self) -> &ResourceCache<T> {
        &self.cache
    }

    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> Result<Option<Value>> {
        let result = self
            .api
            .send_json(Method::POST, self.collection, body)
            .await;
        self.after_write("create", &result);
        result
    }

    pub async fn update<B: Serialize + ?Sized>(
        &self,
        id: &EntityId,
        body: &B,
    ) -> Result<Option<Value>> {
        let endpoint = endpoints::item(self.collection, id);
        let result = self.api.send_json(Method::PUT, &endpoint, body).await;
        self.after_write("update", &result);
        result
    }

    pub async fn delete(&self, id: &EntityId) -> Result<()> {
        let endpoint = endpoints::item(self.collection, id);
        let result = self
            .api
            .request(&endpoint, RequestOptions::delete())
            .await
            .map(|_| ());
        self.after_write("delete", &result);
        result
    }

    fn after_write<R>(&self, action: &'static str, result: &Result<R>) {
        match result {
            Ok(_) => tracing::info!(resource = self.cache.name(), action, "Write succeeded"),
            Err(e) => {
                tracing::warn!(resource = self.cache.name(), action, error = %e, "Write failed")
            }
        }
        self.cache.invalidate();
    }
}

impl Resource<UserAccount> {
    /// Activate or deactivate an account, then drop the cached user list.
    pub async fn toggle_status(&self, id: &EntityId, status: AccountStatus) -> Result<()> {
        let endpoint = format!("{}/status", endpoints::item(self.collection, id));
        let result = self
            .api
            .send_json(
                Method::PATCH,
                &endpoint,
                &serde_json::json!({ "status": status }),
            )
            .await
            .map(|_| ());
        self.after_write("toggle_status", &result);
        result
    }
}
