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

//! Row materialization for outgoing sends.
//!
//! A broadcast is one row filtered by role at read time. A direct send is one
//! row per recipient; several recipients share a fresh thread id so the
//! sender sees one conversation while each recipient gets their own copy.

use std::collections::HashSet;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    directory::UserDirectory,
    errors::{MessagingError, MessagingResult},
    message::{Message, MessageBody},
    roles::{Capability, Role},
    session::Caller,
};

/// Rows produced by one send, written together or not at all
#[derive(Debug, Clone)]
pub struct FanoutPlan {
    pub rows: Vec<Message>,
    /// Shared thread id, set only for multi-recipient direct sends
    pub thread_id: Option<String>,
}

pub fn authorize(caller: &Caller, capability: Capability) -> MessagingResult<()> {
    if caller.role.can(capability) {
        return Ok(());
    }
    let action = match capability {
        Capability::Broadcast => "send broadcasts",
        Capability::DirectMessage => "send direct messages",
    };
    Err(MessagingError::forbidden(format!("{} as {}", action, caller.role)))
}

/// Trim, drop duplicates (keeping first occurrence) and bound the list.
pub fn normalize_recipients(ids: &[String], max_recipients: usize) -> MessagingResult<Vec<String>> {
    let mut seen = HashSet::new();
    let mut recipients = Vec::with_capacity(ids.len());
    for id in ids {
        let id = id.trim();
        if id.is_empty() {
            return Err(MessagingError::validation(
                "recipient_ids",
                "recipient ids must not be blank",
            ));
        }
        if seen.insert(id) {
            recipients.push(id.to_string());
        }
    }

    if recipients.is_empty() {
        return Err(MessagingError::validation(
            "recipient_ids",
            "a direct message needs at least one recipient",
        ));
    }
    if recipients.len() > max_recipients {
        return Err(MessagingError::validation(
            "recipient_ids",
            format!(
                "{} recipients exceeds the limit of {}",
                recipients.len(),
                max_recipients
            ),
        ));
    }
    Ok(recipients)
}

/// Every recipient must resolve before anything is written. The error names
/// each id that did not.
pub async fn ensure_recipients_exist(
    directory: &dyn UserDirectory,
    recipients: &[String],
) -> MessagingResult<()> {
    let found = directory.get_users(recipients).await?;
    let missing: Vec<&str> = recipients
        .iter()
        .filter(|id| !found.contains_key(*id))
        .map(String::as_str)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(MessagingError::validation(
            "recipient_ids",
            format!("unknown user ids: {}", missing.join(", ")),
        ))
    }
}

pub fn plan_broadcast(caller: &Caller, target_role: Option<Role>, body: &MessageBody) -> FanoutPlan {
    FanoutPlan {
        rows: vec![Message::broadcast(caller.user_id.clone(), target_role, body)],
        thread_id: None,
    }
}

/// One row per recipient. Recipients are expected to be normalized already.
pub fn plan_direct(caller: &Caller, recipients: &[String], body: &MessageBody) -> FanoutPlan {
    let created_at = Utc::now();
    let thread_id = (recipients.len() > 1).then(|| Uuid::new_v4().to_string());

    let rows = recipients
        .iter()
        .map(|recipient| {
            let row = Message::direct(caller.user_id.clone(), recipient.clone(), body)
                .with_created_at(created_at);
            match &thread_id {
                Some(thread_id) => row.with_thread_id(thread_id.clone()),
                None => row,
            }
        })
        .collect();

    FanoutPlan { rows, thread_id }
}
