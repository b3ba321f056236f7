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

use thiserror::Error;

use crate::directory::DirectoryError;
use crate::store::StoreError;

/// Base error type for messaging operations
#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("Caller identity is missing or unknown")]
    Unauthenticated,

    #[error("Not permitted to {action}")]
    Forbidden { action: String },

    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Message {id} not found")]
    NotFound { id: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),
}

/// Coarse classification used by transports to pick a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthenticated,
    Forbidden,
    ValidationFailed,
    NotFound,
    Unexpected,
}

impl MessagingError {
    pub fn forbidden(action: impl Into<String>) -> Self {
        MessagingError::Forbidden {
            action: action.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        MessagingError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        MessagingError::NotFound { id: id.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MessagingError::Unauthenticated => ErrorKind::Unauthenticated,
            MessagingError::Forbidden { .. } => ErrorKind::Forbidden,
            MessagingError::Validation { .. } => ErrorKind::ValidationFailed,
            MessagingError::NotFound { .. } => ErrorKind::NotFound,
            MessagingError::Store(_) | MessagingError::Directory(_) => ErrorKind::Unexpected,
        }
    }
}

/// Result type alias for messaging operations
pub type MessagingResult<T> = Result<T, MessagingError>;
