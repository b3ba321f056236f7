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

//! Message persistence
//!
//! This module provides a backend-agnostic interface over the message table.
//! It ships an in-memory backend and a durable sled backend.

use std::sync::Arc;

pub mod config;
pub mod memory;
pub mod sled_store;
pub mod traits;
pub mod types;

pub use config::{StoreConfig, StoreType};
pub use memory::MemoryStore;
pub use sled_store::SledStore;
pub use traits::{MessageScope, MessageStore, StoreTransaction};
pub use types::{StoreError, StoreResult};

/// Factory function to create a store based on configuration
pub async fn create_store(config: &StoreConfig) -> StoreResult<Arc<dyn MessageStore>> {
    match config.store_type {
        StoreType::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreType::Sled => Ok(Arc::new(SledStore::open(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_store() {
        let store = create_store(&StoreConfig::memory()).await.unwrap();
        assert!(store.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_create_sled_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::sled(dir.path().join("db").to_string_lossy().to_string());
        let store = create_store(&config).await.unwrap();
        assert!(store.health_check().await.unwrap());
    }
}
