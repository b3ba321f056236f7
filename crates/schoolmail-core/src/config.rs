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

//! Engine-wide configuration

use serde::{Deserialize, Serialize};

use crate::{
    directory::DirectoryConfig,
    store::StoreConfig,
    types::DEFAULT_MAX_RECIPIENTS,
};

/// Configuration for the messaging engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default = "default_max_recipients")]
    pub max_recipients: usize,
}

fn default_max_recipients() -> usize {
    DEFAULT_MAX_RECIPIENTS
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            directory: DirectoryConfig::default(),
            max_recipients: DEFAULT_MAX_RECIPIENTS,
        }
    }
}

impl MessagingConfig {
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    pub fn with_directory(mut self, directory: DirectoryConfig) -> Self {
        self.directory = directory;
        self
    }

    pub fn with_max_recipients(mut self, max_recipients: usize) -> Self {
        self.max_recipients = max_recipients;
        self
    }
}
