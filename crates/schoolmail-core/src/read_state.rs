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

//! Read/unread transitions.

use tracing::debug;

use crate::{
    access,
    errors::{MessagingError, MessagingResult},
    message::Message,
    session::Caller,
    store::MessageStore,
};

/// Only a recipient may flip the read flag: the receiver of a direct
/// message, or a member of a broadcast's audience.
pub fn authorize(caller: &Caller, message: &Message) -> MessagingResult<()> {
    if access::is_recipient(message, caller) {
        Ok(())
    } else {
        Err(MessagingError::forbidden(format!(
            "change read state of message {}",
            message.id
        )))
    }
}

/// Set `is_read` and return the message as stored. Setting the flag to the
/// value it already holds writes nothing.
pub async fn mark_read(
    store: &dyn MessageStore,
    caller: &Caller,
    message_id: &str,
    is_read: bool,
) -> MessagingResult<Message> {
    let message = store
        .get_message(message_id)
        .await?
        .ok_or_else(|| MessagingError::not_found(message_id))?;
    authorize(caller, &message)?;

    if message.is_read == is_read {
        debug!("Message {} already has is_read={}", message_id, is_read);
        return Ok(message);
    }

    Ok(store.set_read(message_id, is_read).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{message::MessageBody, roles::Role, store::MemoryStore};

    fn body() -> MessageBody {
        MessageBody::new("Attendance", "Absent on Monday")
    }

    #[tokio::test]
    async fn test_receiver_marks_read_idempotently() {
        let store = MemoryStore::new();
        let message = store
            .insert_message(Message::direct("t1", "p1", &body()))
            .await
            .unwrap();
        let p1 = Caller::new("p1", Role::Parent);

        let first = mark_read(&store, &p1, &message.id, true).await.unwrap();
        assert!(first.is_read);
        let second = mark_read(&store, &p1, &message.id, true).await.unwrap();
        assert_eq!(first, second);

        let unread = mark_read(&store, &p1, &message.id, false).await.unwrap();
        assert!(!unread.is_read);
        assert_eq!(unread.subject, message.subject);
        assert_eq!(unread.created_at, message.created_at);
    }

    #[tokio::test]
    async fn test_sender_and_outsiders_are_forbidden() {
        let store = MemoryStore::new();
        let message = store
            .insert_message(Message::direct("t1", "p1", &body()))
            .await
            .unwrap();

        for caller in [Caller::new("t1", Role::Teacher), Caller::new("p2", Role::Parent)] {
            let err = mark_read(&store, &caller, &message.id, true).await.unwrap_err();
            assert!(matches!(err, MessagingError::Forbidden { .. }));
        }
        let stored = store.get_message(&message.id).await.unwrap().unwrap();
        assert!(!stored.is_read);
    }

    #[tokio::test]
    async fn test_broadcast_audience_may_mark_read() {
        let store = MemoryStore::new();
        let broadcast = store
            .insert_message(Message::broadcast("a1", Some(Role::Parent), &body()))
            .await
            .unwrap();

        let updated = mark_read(&store, &Caller::new("p1", Role::Parent), &broadcast.id, true)
            .await
            .unwrap();
        assert!(updated.is_read);

        let err = mark_read(&store, &Caller::new("s1", Role::Student), &broadcast.id, true)
            .await
            .unwrap_err();
        assert!(matches!(err, MessagingError::Forbidden { .. }));
        assert!(mark_read(&store, &Caller::new("a1", Role::Admin), &broadcast.id, true)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_missing_message() {
        let store = MemoryStore::new();
        let err = mark_read(&store, &Caller::new("p1", Role::Parent), "nope", true)
            .await
            .unwrap_err();
        assert!(matches!(err, MessagingError::NotFound { .. }));
    }
}
