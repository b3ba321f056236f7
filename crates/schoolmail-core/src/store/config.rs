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

//! Store configuration types

use serde::{Deserialize, Serialize};

/// Supported store backends
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    Memory,
    Sled,
}

impl std::fmt::Display for StoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreType::Memory => write!(f, "memory"),
            StoreType::Sled => write!(f, "sled"),
        }
    }
}

impl std::str::FromStr for StoreType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreType::Memory),
            "sled" => Ok(StoreType::Sled),
            _ => Err(format!("Unknown store type: {}", s)),
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub store_type: StoreType,
    /// Directory of the sled database; ignored by the memory store
    pub path: Option<String>,
    /// Flush sled to disk after every committed write
    #[serde(default)]
    pub flush_on_write: bool,
}

impl StoreConfig {
    /// Create an in-memory store configuration
    pub fn memory() -> Self {
        Self {
            store_type: StoreType::Memory,
            path: None,
            flush_on_write: false,
        }
    }

    /// Create a sled store configuration
    pub fn sled(path: impl Into<String>) -> Self {
        Self {
            store_type: StoreType::Sled,
            path: Some(path.into()),
            flush_on_write: true,
        }
    }

    pub fn with_flush_on_write(mut self, flush_on_write: bool) -> Self {
        self.flush_on_write = flush_on_write;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::sled("./data/messages")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_type_round_trip_names() {
        assert_eq!("SLED".parse::<StoreType>().unwrap(), StoreType::Sled);
        assert_eq!(StoreType::Memory.to_string(), "memory");
        assert!("postgres".parse::<StoreType>().is_err());
    }

    #[test]
    fn test_default_is_durable() {
        let config = StoreConfig::default();
        assert_eq!(config.store_type, StoreType::Sled);
        assert!(config.flush_on_write);
    }
}
