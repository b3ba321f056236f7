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

use std::sync::Arc;

use crate::{directory::UserDirectory, store::MessageStore};

/// Collaborators shared by every messaging operation
#[derive(Clone)]
pub struct MessagingClients {
    pub store: Arc<dyn MessageStore>,
    pub directory: Arc<dyn UserDirectory>,
}

impl MessagingClients {
    pub fn new(store: Arc<dyn MessageStore>, directory: Arc<dyn UserDirectory>) -> Self {
        Self { store, directory }
    }
}

/// Default upper bound on recipients of a single direct send
pub const DEFAULT_MAX_RECIPIENTS: usize = 500;
