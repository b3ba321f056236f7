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

//! In-memory message store

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::message::Message;
use super::traits::{check_insertable, MessageScope, MessageStore, StoreTransaction};
use super::types::{StoreError, StoreResult};

#[derive(Debug, Default)]
struct MemoryState {
    /// Rows in insertion order
    messages: Vec<Message>,
    /// id -> position in `messages`
    index: HashMap<String, usize>,
}

/// Message store kept entirely in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

/// Transaction that buffers rows until commit
pub struct MemoryTransaction {
    state: Arc<RwLock<MemoryState>>,
    pending: Vec<Message>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.messages.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn insert(&mut self, message: Message) -> StoreResult<()> {
        check_insertable(&message)?;
        self.pending.push(message);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<Vec<Message>> {
        let MemoryTransaction { state, pending } = *self;
        let mut state = state.write().await;

        // Validate the whole batch before touching state
        {
            let mut seen = HashSet::with_capacity(pending.len());
            for message in &pending {
                if state.index.contains_key(&message.id) || !seen.insert(message.id.as_str()) {
                    return Err(StoreError::Duplicate(message.id.clone()));
                }
            }
        }

        for message in &pending {
            let position = state.messages.len();
            state.index.insert(message.id.clone(), position);
            state.messages.push(message.clone());
        }

        Ok(pending)
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn begin_transaction(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        Ok(Box::new(MemoryTransaction {
            state: Arc::clone(&self.state),
            pending: Vec::new(),
        }))
    }

    async fn get_message(&self, id: &str) -> StoreResult<Option<Message>> {
        let state = self.state.read().await;
        Ok(state.index.get(id).map(|&position| state.messages[position].clone()))
    }

    async fn list_messages(&self, scope: &MessageScope) -> StoreResult<Vec<Message>> {
        let state = self.state.read().await;
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|message| scope.matches(message))
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps
        messages.sort_by_key(|message| message.created_at);
        Ok(messages)
    }

    async fn set_read(&self, id: &str, is_read: bool) -> StoreResult<Message> {
        let mut state = self.state.write().await;
        let position = *state
            .index
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let message = &mut state.messages[position];
        message.is_read = is_read;
        Ok(message.clone())
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }

    async fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}
