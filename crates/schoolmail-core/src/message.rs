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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::{MessagingError, MessagingResult},
    roles::Role,
};

/// Classification tag carried by every message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    #[default]
    General,
    BehaviorReport,
    Meeting,
    Academic,
    Attendance,
}

impl std::str::FromStr for MessageType {
    type Err = MessagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "GENERAL" => Ok(MessageType::General),
            "BEHAVIOR_REPORT" => Ok(MessageType::BehaviorReport),
            "MEETING" => Ok(MessageType::Meeting),
            "ACADEMIC" => Ok(MessageType::Academic),
            "ATTENDANCE" => Ok(MessageType::Attendance),
            _ => Err(MessagingError::validation(
                "type",
                format!("message type {} not supported", s),
            )),
        }
    }
}

/// Ordered severity tag. `Low < Medium < High < Urgent`.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl std::str::FromStr for Priority {
    type Err = MessagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            "URGENT" => Ok(Priority::Urgent),
            _ => Err(MessagingError::validation(
                "priority",
                format!("priority {} not supported", s),
            )),
        }
    }
}

/// The caller-authored part of a message, shared by every row a send produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub subject: String,
    pub content: String,
    #[serde(rename = "type", default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub priority: Priority,
}

impl MessageBody {
    pub fn new(subject: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            content: content.into(),
            message_type: MessageType::default(),
            priority: Priority::default(),
        }
    }

    pub fn with_type(mut self, message_type: MessageType) -> Self {
        self.message_type = message_type;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Subject and content must both carry text.
    pub fn validate(&self) -> MessagingResult<()> {
        if self.subject.trim().is_empty() {
            return Err(MessagingError::validation("subject", "must not be empty"));
        }
        if self.content.trim().is_empty() {
            return Err(MessagingError::validation("content", "must not be empty"));
        }
        Ok(())
    }
}

/// A stored message, direct or broadcast.
///
/// Only `is_read` changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    /// Set for direct messages, absent for broadcasts
    pub receiver_id: Option<String>,
    pub subject: String,
    pub content: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub priority: Priority,
    pub is_broadcast: bool,
    /// Broadcast audience; absent means every role
    pub target_role: Option<Role>,
    pub thread_id: Option<String>,
    pub reply_to_id: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn from_body(sender_id: String, body: &MessageBody) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender_id,
            receiver_id: None,
            subject: body.subject.clone(),
            content: body.content.clone(),
            message_type: body.message_type,
            priority: body.priority,
            is_broadcast: false,
            target_role: None,
            thread_id: None,
            reply_to_id: None,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    pub fn direct(
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
        body: &MessageBody,
    ) -> Self {
        let mut message = Self::from_body(sender_id.into(), body);
        message.receiver_id = Some(receiver_id.into());
        message
    }

    pub fn broadcast(
        sender_id: impl Into<String>,
        target_role: Option<Role>,
        body: &MessageBody,
    ) -> Self {
        let mut message = Self::from_body(sender_id.into(), body);
        message.is_broadcast = true;
        message.target_role = target_role;
        message
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn with_reply_to(mut self, reply_to_id: impl Into<String>) -> Self {
        self.reply_to_id = Some(reply_to_id.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// `thread_id` when present, otherwise the message's own id.
    pub fn conversation_id(&self) -> &str {
        self.thread_id.as_deref().unwrap_or(&self.id)
    }

    pub fn is_reply(&self) -> bool {
        self.reply_to_id.is_some()
    }

    /// Checks the direct/broadcast shape: a direct message names exactly one
    /// receiver, a broadcast names none.
    pub fn check_shape(&self) -> Result<(), String> {
        match (self.is_broadcast, &self.receiver_id) {
            (false, None) => Err(format!("direct message {} has no receiver", self.id)),
            (true, Some(_)) => Err(format!("broadcast {} must not name a receiver", self.id)),
            (false, Some(_)) if self.target_role.is_some() => Err(format!(
                "direct message {} must not carry a target role",
                self.id
            )),
            _ => Ok(()),
        }
    }
}
