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

//! Store abstraction traits

use std::fmt::Debug;
use async_trait::async_trait;

use crate::{access, message::Message, session::Caller};
use super::types::{StoreError, StoreResult};

/// Which rows a listing should return
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageScope {
    /// Every stored message
    All,
    /// Messages authored by the given user
    SentBy(String),
    /// Messages the caller is entitled to as a recipient
    ReceivableBy(Caller),
    /// Every broadcast regardless of audience
    Broadcasts,
    /// Every message belonging to one of the given conversation ids
    Conversations(Vec<String>),
}

impl MessageScope {
    pub fn matches(&self, message: &Message) -> bool {
        match self {
            MessageScope::All => true,
            MessageScope::SentBy(user_id) => &message.sender_id == user_id,
            MessageScope::ReceivableBy(caller) => access::is_recipient(message, caller),
            MessageScope::Broadcasts => message.is_broadcast,
            MessageScope::Conversations(ids) => {
                ids.iter().any(|id| id == message.conversation_id())
            }
        }
    }
}

/// A unit of writes that becomes visible all at once on commit, or not at all
#[async_trait]
pub trait StoreTransaction: Send + Sync {
    /// Stage a message for insertion
    async fn insert(&mut self, message: Message) -> StoreResult<()>;

    /// Commit the staged messages, returning them in insertion order
    async fn commit(self: Box<Self>) -> StoreResult<Vec<Message>>;

    /// Discard the staged messages
    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

/// Durable record of every message
#[async_trait]
pub trait MessageStore: Send + Sync + Debug {
    /// Begin a transaction
    async fn begin_transaction(&self) -> StoreResult<Box<dyn StoreTransaction>>;

    /// Insert a single message in its own transaction
    async fn insert_message(&self, message: Message) -> StoreResult<Message> {
        let mut transaction = self.begin_transaction().await?;
        transaction.insert(message).await?;
        let mut committed = transaction.commit().await?;
        committed
            .pop()
            .ok_or_else(|| StoreError::Transaction("commit returned no rows".to_string()))
    }

    async fn get_message(&self, id: &str) -> StoreResult<Option<Message>>;

    /// Messages matching the scope, ordered by `created_at` with insertion
    /// order breaking ties
    async fn list_messages(&self, scope: &MessageScope) -> StoreResult<Vec<Message>>;

    /// Set the read flag, the only field a stored message may change
    async fn set_read(&self, id: &str, is_read: bool) -> StoreResult<Message>;

    /// Check if the store is usable
    async fn health_check(&self) -> StoreResult<bool>;

    /// Flush and release resources
    async fn close(&self) -> StoreResult<()>;
}

/// Shape checks shared by every backend before a row is staged
pub(crate) fn check_insertable(message: &Message) -> StoreResult<()> {
    message.check_shape().map_err(StoreError::InvalidMessage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{message::MessageBody, roles::Role};

    #[test]
    fn test_scope_matching() {
        let body = MessageBody::new("Hi", "There");
        let direct = Message::direct("t1", "p1", &body);
        let broadcast = Message::broadcast("a1", Some(Role::Parent), &body);

        assert!(MessageScope::SentBy("t1".to_string()).matches(&direct));
        assert!(!MessageScope::SentBy("t1".to_string()).matches(&broadcast));

        let parent = Caller::new("p1", Role::Parent);
        assert!(MessageScope::ReceivableBy(parent.clone()).matches(&direct));
        assert!(MessageScope::ReceivableBy(parent).matches(&broadcast));

        assert!(MessageScope::Broadcasts.matches(&broadcast));
        assert!(!MessageScope::Broadcasts.matches(&direct));

        let scope = MessageScope::Conversations(vec![direct.id.clone()]);
        assert!(scope.matches(&direct));
        assert!(!scope.matches(&broadcast));
    }
}
