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

use serde::{Deserialize, Serialize};

use crate::errors::{MessagingError, MessagingResult};
use crate::roles::Role;

/// Identity of whoever is making the current request, as supplied by the
/// session provider. Passed explicitly into every engine operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// Build a caller from raw session values. Anything missing or malformed
    /// is reported as `Unauthenticated` so no later check runs without an identity.
    pub fn authenticate(user_id: Option<&str>, role: Option<&str>) -> MessagingResult<Self> {
        let user_id = user_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(MessagingError::Unauthenticated)?;
        let role = role
            .and_then(|r| r.parse::<Role>().ok())
            .ok_or(MessagingError::Unauthenticated)?;

        Ok(Self::new(user_id, role))
    }
}
