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

use std::collections::HashMap;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::roles::Role;

/// Public profile of a portal user as exposed by the user directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl UserSummary {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role,
        }
    }
}

/// User directory error types
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Directory returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid directory configuration: {message}")]
    Config { message: String },
}

/// Result type alias for directory lookups
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Lookup of portal users by id
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve a single user; `None` when the id is unknown
    async fn get_user(&self, id: &str) -> DirectoryResult<Option<UserSummary>>;

    /// Resolve several users at once. Unknown ids are absent from the map.
    async fn get_users(&self, ids: &[String]) -> DirectoryResult<HashMap<String, UserSummary>> {
        let mut users = HashMap::with_capacity(ids.len());
        for id in ids {
            if users.contains_key(id) {
                continue;
            }
            if let Some(user) = self.get_user(id).await? {
                users.insert(id.clone(), user);
            }
        }
        Ok(users)
    }
}
