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

//! Portal roles and the capabilities each one carries.
//!
//! Every role-dependent decision in the engine asks [`Role::can`] instead of
//! comparing role names, so a new role only needs a variant and a row in
//! [`Role::capabilities`].

use serde::{Deserialize, Serialize};

use crate::errors::MessagingError;

/// Roles known to the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Teacher,
    Parent,
    Student,
}

/// Actions gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Send a role-targeted broadcast
    Broadcast,
    /// Send a direct message to named recipients
    DirectMessage,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Teacher, Role::Parent, Role::Student];

    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Role::Admin | Role::Teacher => &[Capability::Broadcast, Capability::DirectMessage],
            Role::Parent | Role::Student => &[Capability::DirectMessage],
        }
    }

    pub fn can(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Teacher => "TEACHER",
            Role::Parent => "PARENT",
            Role::Student => "STUDENT",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = MessagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "TEACHER" => Ok(Role::Teacher),
            "PARENT" => Ok(Role::Parent),
            "STUDENT" => Ok(Role::Student),
            _ => Err(MessagingError::validation("role", format!("unknown role: {}", s))),
        }
    }
}

/// Whether a broadcast addressed to `target` is visible to `role`.
/// An absent target addresses every role.
pub fn audience_includes(target: Option<Role>, role: Role) -> bool {
    target.map_or(true, |t| t == role)
}
