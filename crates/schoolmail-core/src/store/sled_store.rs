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

//! Persistent message store using sled

use std::collections::HashSet;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sled::{Batch, Db, Tree};

use crate::message::Message;
use super::config::StoreConfig;
use super::traits::{check_insertable, MessageScope, MessageStore, StoreTransaction};
use super::types::{StoreError, StoreResult};

const MESSAGES_TREE: &str = "messages";

/// On-disk record. `seq` preserves insertion order for equal timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredMessage {
    seq: u64,
    message: Message,
}

impl StoredMessage {
    fn to_bytes(&self) -> StoreResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    fn from_bytes(bytes: &[u8]) -> StoreResult<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Durable message store backed by a sled tree keyed by message id
#[derive(Debug, Clone)]
pub struct SledStore {
    db: Db,
    messages: Tree,
    flush_on_write: bool,
}

/// Sled transaction; staged rows are written with a single atomic batch
pub struct SledTransaction {
    store: SledStore,
    pending: Vec<Message>,
}

impl SledStore {
    /// Open (or create) the store at the configured path
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let path = config
            .path
            .as_deref()
            .ok_or_else(|| StoreError::Connection("sled store requires a path".to_string()))?;

        let db = sled::open(path)?;
        let messages = db.open_tree(MESSAGES_TREE)?;
        tracing::debug!(path, recovered = db.was_recovered(), "opened sled message store");

        Ok(Self {
            db,
            messages,
            flush_on_write: config.flush_on_write,
        })
    }

    async fn flush_if_configured(&self) -> StoreResult<()> {
        if self.flush_on_write {
            self.messages.flush_async().await?;
        }
        Ok(())
    }

    fn scan(&self, scope: &MessageScope) -> StoreResult<Vec<StoredMessage>> {
        let mut records = Vec::new();
        for item in self.messages.iter() {
            let (_key, value) = item?;
            let record = StoredMessage::from_bytes(&value)?;
            if scope.matches(&record.message) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl StoreTransaction for SledTransaction {
    async fn insert(&mut self, message: Message) -> StoreResult<()> {
        check_insertable(&message)?;
        self.pending.push(message);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<Vec<Message>> {
        let SledTransaction { store, pending } = *self;

        let mut batch = Batch::default();
        {
            let mut seen = HashSet::with_capacity(pending.len());
            for message in &pending {
                if !seen.insert(message.id.as_str())
                    || store.messages.contains_key(message.id.as_bytes())?
                {
                    return Err(StoreError::Duplicate(message.id.clone()));
                }
                let record = StoredMessage {
                    seq: store.db.generate_id()?,
                    message: message.clone(),
                };
                batch.insert(message.id.as_bytes(), record.to_bytes()?);
            }
        }

        store.messages.apply_batch(batch)?;
        store.flush_if_configured().await?;
        Ok(pending)
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        // Nothing reaches sled before commit
        Ok(())
    }
}

#[async_trait]
impl MessageStore for SledStore {
    async fn begin_transaction(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        Ok(Box::new(SledTransaction {
            store: self.clone(),
            pending: Vec::new(),
        }))
    }

    async fn get_message(&self, id: &str) -> StoreResult<Option<Message>> {
        match self.messages.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(StoredMessage::from_bytes(&bytes)?.message)),
            None => Ok(None),
        }
    }

    async fn list_messages(&self, scope: &MessageScope) -> StoreResult<Vec<Message>> {
        let mut records = self.scan(scope)?;
        records.sort_by_key(|record| (record.message.created_at, record.seq));
        Ok(records.into_iter().map(|record| record.message).collect())
    }

    async fn set_read(&self, id: &str, is_read: bool) -> StoreResult<Message> {
        let bytes = self
            .messages
            .get(id.as_bytes())?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let mut record = StoredMessage::from_bytes(&bytes)?;
        record.message.is_read = is_read;

        // Last write wins; the flag is the only mutable field
        self.messages.insert(id.as_bytes(), record.to_bytes()?)?;
        self.flush_if_configured().await?;
        Ok(record.message)
    }

    async fn health_check(&self) -> StoreResult<bool> {
        self.db.size_on_disk()?;
        Ok(true)
    }

    async fn close(&self) -> StoreResult<()> {
        self.db.flush_async().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{message::MessageBody, roles::Role, session::Caller};
    use tempfile::tempdir;

    fn body() -> MessageBody {
        MessageBody::new("Parent evening", "Thursday at 6pm")
    }

    fn open(dir: &std::path::Path) -> SledStore {
        let config = StoreConfig::sled(dir.to_string_lossy().to_string());
        SledStore::open(&config).unwrap()
    }

    #[tokio::test]
    async fn test_rows_survive_reopen() {
        let dir = tempdir().unwrap();
        let inserted = {
            let store = open(dir.path());
            let message = store
                .insert_message(Message::direct("t1", "p1", &body()))
                .await
                .unwrap();
            store.close().await.unwrap();
            message
        };

        let store = open(dir.path());
        let fetched = store.get_message(&inserted.id).await.unwrap().unwrap();
        assert_eq!(fetched, inserted);
    }

    #[tokio::test]
    async fn test_commit_writes_every_row() {
        let dir = tempdir().unwrap();
        let store = open(dir.path());

        let mut tx = store.begin_transaction().await.unwrap();
        tx.insert(Message::direct("t1", "p1", &body()).with_thread_id("th"))
            .await
            .unwrap();
        tx.insert(Message::direct("t1", "p2", &body()).with_thread_id("th"))
            .await
            .unwrap();
        assert!(store.list_messages(&MessageScope::All).await.unwrap().is_empty());

        tx.commit().await.unwrap();
        let rows = store
            .list_messages(&MessageScope::Conversations(vec!["th".to_string()]))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_rejects_whole_batch() {
        let dir = tempdir().unwrap();
        let store = open(dir.path());
        let existing = store
            .insert_message(Message::direct("t1", "p1", &body()))
            .await
            .unwrap();

        let mut tx = store.begin_transaction().await.unwrap();
        tx.insert(Message::direct("t1", "p2", &body())).await.unwrap();
        tx.insert(Message::direct("t1", "p3", &body()).with_id(existing.id.clone()))
            .await
            .unwrap();
        assert!(matches!(tx.commit().await, Err(StoreError::Duplicate(_))));
        assert_eq!(store.list_messages(&MessageScope::All).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_equal_timestamps_keep_insertion_order() {
        let dir = tempdir().unwrap();
        let store = open(dir.path());
        let now = chrono::Utc::now();

        let mut ids = Vec::new();
        for receiver in ["p1", "p2", "p3"] {
            let message = store
                .insert_message(Message::direct("t1", receiver, &body()).with_created_at(now))
                .await
                .unwrap();
            ids.push(message.id);
        }

        let listed: Vec<_> = store
            .list_messages(&MessageScope::SentBy("t1".to_string()))
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn test_scoped_listing_and_read_flag() {
        let dir = tempdir().unwrap();
        let store = open(dir.path());
        let broadcast = store
            .insert_message(Message::broadcast("a1", Some(Role::Parent), &body()))
            .await
            .unwrap();
        store
            .insert_message(Message::direct("a1", "t1", &body()))
            .await
            .unwrap();

        let parent = Caller::new("p1", Role::Parent);
        let visible = store
            .list_messages(&MessageScope::ReceivableBy(parent))
            .await
            .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, broadcast.id);

        let updated = store.set_read(&broadcast.id, true).await.unwrap();
        assert!(updated.is_read);
        assert!(store.get_message(&broadcast.id).await.unwrap().unwrap().is_read);
        assert!(store.health_check().await.unwrap());
    }

    #[test]
    fn test_open_requires_path() {
        let config = StoreConfig {
            path: None,
            ..StoreConfig::default()
        };
        assert!(matches!(SledStore::open(&config), Err(StoreError::Connection(_))));
    }
}
