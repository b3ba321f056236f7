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

//! # SchoolMail Core
//!
//! Unified messaging engine for a school portal.
//!
//! Direct messages, reply threads and role-targeted broadcasts share one
//! timeline. Each viewer gets their own projection of it (inbox, sent,
//! broadcasts) with participants, reply counts and read state.

pub mod access;
pub mod config;
pub mod directory;
pub mod errors;
pub mod fanout;
pub mod message;
pub mod messenger;
pub mod projector;
pub mod read_state;
pub mod reply;
pub mod roles;
pub mod session;
pub mod store;
pub mod thread;
pub mod types;

// Re-export commonly used types
pub use config::MessagingConfig;
pub use errors::{ErrorKind, MessagingError, MessagingResult};
pub use messenger::{ListQuery, Messenger, SendRequest};
pub use session::Caller;
pub use types::MessagingClients;

// Re-export traits
pub use directory::UserDirectory;
pub use store::{MessageStore, StoreTransaction};

// Re-export concrete types
pub use directory::{
    CachedDirectory, DirectoryConfig, DirectoryType, HttpDirectory, StaticDirectory, UserSummary,
};
pub use message::{Message, MessageBody, MessageType, Priority};
pub use projector::{MessageListing, MessageStats, ProjectedMessage, ViewKind, ViewMode};
pub use roles::{Capability, Role};
pub use store::{MemoryStore, SledStore, StoreConfig, StoreType};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exports() {
        let _config = MessagingConfig::default();
        let _query = ListQuery::new(ViewMode::Direct, ViewKind::Sent);
        let _request = SendRequest::broadcast(Some(Role::Parent), MessageBody::new("Hi", "All"));
    }
}
