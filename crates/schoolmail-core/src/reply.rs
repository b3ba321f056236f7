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

//! Reply linkage.
//!
//! A reply always goes privately to the author of the message it answers,
//! even when that message was a broadcast, and always joins the answered
//! message's conversation so chains of any depth share one conversation id.

use crate::{
    access,
    errors::{MessagingError, MessagingResult},
    message::{Message, MessageBody},
    session::Caller,
};

/// Fields of a reply derived from the message being answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyLinkage {
    pub receiver_id: String,
    pub thread_id: String,
    pub reply_to_id: String,
}

impl ReplyLinkage {
    pub fn for_original(original: &Message) -> Self {
        Self {
            receiver_id: original.sender_id.clone(),
            thread_id: original.conversation_id().to_string(),
            reply_to_id: original.id.clone(),
        }
    }

    /// A client-supplied thread id is accepted only when it names the
    /// conversation the reply joins anyway.
    pub fn check_supplied_thread_id(&self, supplied: Option<&str>) -> MessagingResult<()> {
        match supplied {
            Some(thread_id) if thread_id != self.thread_id => Err(MessagingError::validation(
                "thread_id",
                format!(
                    "reply to {} belongs to conversation {}, not {}",
                    self.reply_to_id, self.thread_id, thread_id
                ),
            )),
            _ => Ok(()),
        }
    }
}

/// Only someone who could see the original may answer it.
pub fn authorize(caller: &Caller, original: &Message) -> MessagingResult<()> {
    if access::can_view(original, caller) {
        Ok(())
    } else {
        Err(MessagingError::forbidden(format!("reply to message {}", original.id)))
    }
}

/// The reply row, always a direct message.
pub fn build_reply(caller: &Caller, linkage: &ReplyLinkage, body: &MessageBody) -> Message {
    Message::direct(caller.user_id.clone(), linkage.receiver_id.clone(), body)
        .with_thread_id(linkage.thread_id.clone())
        .with_reply_to(linkage.reply_to_id.clone())
}
