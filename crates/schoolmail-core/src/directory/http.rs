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

//! User directory backed by the portal's user service

use std::collections::HashMap;
use std::time::Duration;
use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::{Client, StatusCode, Url};

use super::client::{DirectoryError, DirectoryResult, UserDirectory, UserSummary};
use super::config::DirectoryConfig;

pub struct HttpDirectory {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
}

impl HttpDirectory {
    pub fn new(config: &DirectoryConfig) -> DirectoryResult<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| DirectoryError::Config {
                message: "HTTP directory requires a base_url".to_string(),
            })?;
        let base_url = Url::parse(base_url).map_err(|e| DirectoryError::Config {
            message: format!("Invalid base_url {}: {}", base_url, e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(DirectoryError::Config {
                message: format!("base_url {} cannot carry a path", base_url),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_token: config.api_token.clone(),
        })
    }

    /// `{base_url}/users/{id}` with the id percent-encoded as one segment
    fn user_url(&self, id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("users").push(id);
        }
        url
    }
}

#[async_trait]
impl UserDirectory for HttpDirectory {
    async fn get_user(&self, id: &str) -> DirectoryResult<Option<UserSummary>> {
        let mut request = self.client.get(self.user_url(id));
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(DirectoryError::Status {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn get_users(&self, ids: &[String]) -> DirectoryResult<HashMap<String, UserSummary>> {
        let mut unique: Vec<&String> = ids.iter().collect();
        unique.sort();
        unique.dedup();

        let lookups = unique.into_iter().map(|id| self.get_user(id));
        let users = try_join_all(lookups).await?;
        Ok(users
            .into_iter()
            .flatten()
            .map(|user| (user.id.clone(), user))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::config::DirectoryType;

    #[test]
    fn test_user_url_encodes_id() {
        let directory = HttpDirectory::new(&DirectoryConfig::http("http://portal.test/api/")).unwrap();
        assert_eq!(
            directory.user_url("u 1/2").as_str(),
            "http://portal.test/api/users/u%201%2F2"
        );

        let directory = HttpDirectory::new(&DirectoryConfig::http("http://portal.test/api")).unwrap();
        assert_eq!(directory.user_url("u1").as_str(), "http://portal.test/api/users/u1");
    }

    #[test]
    fn test_requires_base_url() {
        let config = DirectoryConfig {
            directory_type: DirectoryType::Http,
            ..DirectoryConfig::default()
        };
        assert!(matches!(HttpDirectory::new(&config), Err(DirectoryError::Config { .. })));
        assert!(HttpDirectory::new(&DirectoryConfig::http("not a url")).is_err());
    }
}
