/*
Copyright 2024, Zep Software, Inc.

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Caching wrapper for user directories

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use moka::future::Cache as MokaCache;

use super::client::{DirectoryResult, UserDirectory, UserSummary};

/// Wrapper that adds a read-through cache to any UserDirectory implementation.
/// Only resolved users are cached, so a newly created account is visible on
/// the next lookup.
pub struct CachedDirectory {
    inner: Arc<dyn UserDirectory>,
    cache: MokaCache<String, UserSummary>,
}

impl CachedDirectory {
    pub fn new(inner: Arc<dyn UserDirectory>, ttl: Duration, max_capacity: u64) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { inner, cache }
    }
}

#[async_trait]
impl UserDirectory for CachedDirectory {
    async fn get_user(&self, id: &str) -> DirectoryResult<Option<UserSummary>> {
        if let Some(user) = self.cache.get(id).await {
            return Ok(Some(user));
        }

        let user = self.inner.get_user(id).await?;
        if let Some(user) = &user {
            self.cache.insert(id.to_string(), user.clone()).await;
        }
        Ok(user)
    }

    /// Serve hits from the cache and resolve every miss in one inner batch.
    async fn get_users(&self, ids: &[String]) -> DirectoryResult<HashMap<String, UserSummary>> {
        let mut users = HashMap::with_capacity(ids.len());
        let mut misses = Vec::new();
        for id in ids {
            if users.contains_key(id) || misses.contains(id) {
                continue;
            }
            match self.cache.get(id).await {
                Some(user) => {
                    users.insert(id.clone(), user);
                }
                None => misses.push(id.clone()),
            }
        }

        if !misses.is_empty() {
            for (id, user) in self.inner.get_users(&misses).await? {
                self.cache.insert(id.clone(), user.clone()).await;
                users.insert(id, user);
            }
        }
        Ok(users)
    }
}
