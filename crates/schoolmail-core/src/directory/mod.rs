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

//! User directory collaborator
//!
//! The engine never owns user records. It resolves recipient ids and decorates
//! projections through the [`UserDirectory`] trait.

use std::sync::Arc;
use std::time::Duration;

pub mod cached;
pub mod client;
pub mod config;
pub mod http;
pub mod static_directory;

pub use cached::CachedDirectory;
pub use client::{DirectoryError, DirectoryResult, UserDirectory, UserSummary};
pub use config::{DirectoryConfig, DirectoryType};
pub use http::HttpDirectory;
pub use static_directory::StaticDirectory;

/// Build the configured directory, wrapped in a cache unless the TTL is zero
pub fn create_directory(config: &DirectoryConfig) -> DirectoryResult<Arc<dyn UserDirectory>> {
    let directory: Arc<dyn UserDirectory> = match config.directory_type {
        DirectoryType::Static => Arc::new(StaticDirectory::new(config.users.clone())),
        DirectoryType::Http => Arc::new(HttpDirectory::new(config)?),
    };

    if config.cache_ttl_seconds == 0 {
        return Ok(directory);
    }

    Ok(Arc::new(CachedDirectory::new(
        directory,
        Duration::from_secs(config.cache_ttl_seconds),
        config.cache_capacity,
    )))
}
