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

use super::client::{DirectoryResult, UserDirectory, UserSummary};

/// Fixed set of users held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    users: HashMap<String, UserSummary>,
}

impl StaticDirectory {
    pub fn new(users: impl IntoIterator<Item = UserSummary>) -> Self {
        Self {
            users: users.into_iter().map(|user| (user.id.clone(), user)).collect(),
        }
    }
}

#[async_trait]
impl UserDirectory for StaticDirectory {
    async fn get_user(&self, id: &str) -> DirectoryResult<Option<UserSummary>> {
        Ok(self.users.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::Role;

    #[tokio::test]
    async fn test_lookup() {
        let directory = StaticDirectory::new(vec![
            UserSummary::new("t1", "Ms. Rivera", "rivera@school.test", Role::Teacher),
            UserSummary::new("p1", "Sam Okafor", "sam@home.test", Role::Parent),
        ]);

        let user = directory.get_user("t1").await.unwrap().unwrap();
        assert_eq!(user.name, "Ms. Rivera");
        assert!(directory.get_user("nobody").await.unwrap().is_none());

        let ids = vec!["p1".to_string(), "nobody".to_string(), "p1".to_string()];
        let found = directory.get_users(&ids).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found["p1"].role, Role::Parent);
    }
}
