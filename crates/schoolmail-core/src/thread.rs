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

//! Conversation grouping and representative selection.
//!
//! A conversation is every message sharing a conversation id (`thread_id`, or
//! the root's own id). Views never show raw rows; they show one representative
//! per conversation, chosen here.

use std::collections::{HashMap, HashSet};

use crate::{access, message::Message, session::Caller};

/// Messages sharing one conversation id, in `created_at` order
#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: String,
    pub messages: Vec<Message>,
}

/// Group messages by conversation id.
///
/// Input order is preserved inside each conversation, and conversations are
/// returned in order of their first message, so callers should pass rows
/// already sorted by `created_at`.
pub fn group_conversations(messages: impl IntoIterator<Item = Message>) -> Vec<Conversation> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut conversations: Vec<Conversation> = Vec::new();

    for message in messages {
        let id = message.conversation_id().to_string();
        match positions.get(&id) {
            Some(&position) => conversations[position].messages.push(message),
            None => {
                positions.insert(id.clone(), conversations.len());
                conversations.push(Conversation {
                    id,
                    messages: vec![message],
                });
            }
        }
    }

    conversations
}

impl Conversation {
    /// Latest message the caller received. Equal timestamps resolve to the
    /// later row.
    pub fn inbox_representative(&self, caller: &Caller) -> Option<&Message> {
        self.latest_received_where(caller, |_| true)
    }

    pub fn latest_received_where(
        &self,
        caller: &Caller,
        admit: impl Fn(&Message) -> bool,
    ) -> Option<&Message> {
        self.messages
            .iter()
            .filter(|message| access::is_recipient(message, caller) && admit(message))
            .max_by_key(|message| message.created_at)
    }

    /// Earliest non-reply message the caller authored: what they started,
    /// not the newest reply.
    pub fn sent_representative(&self, caller: &Caller) -> Option<&Message> {
        self.root_sent_where(caller, |_| true)
    }

    pub fn root_sent_where(
        &self,
        caller: &Caller,
        admit: impl Fn(&Message) -> bool,
    ) -> Option<&Message> {
        self.messages
            .iter()
            .filter(|message| {
                access::is_sender(message, caller) && !message.is_reply() && admit(message)
            })
            .min_by_key(|message| message.created_at)
    }

    /// Replies in the conversation. Fanned-out copies of one send share a
    /// thread id but are a single logical root, so only rows answering
    /// another message count.
    pub fn reply_count(&self) -> usize {
        self.messages.iter().filter(|message| message.is_reply()).count()
    }

    /// Replies the caller sent or received. Private answers to a broadcast
    /// stay between the replier and the author.
    pub fn visible_reply_count(&self, caller: &Caller) -> usize {
        self.messages
            .iter()
            .filter(|message| message.is_reply() && access::can_view(message, caller))
            .count()
    }

    pub fn is_broadcast_only(&self) -> bool {
        self.messages.iter().all(|message| message.is_broadcast)
    }

    /// Distinct senders and receivers in order of first appearance.
    /// `None` for a conversation made only of broadcasts.
    pub fn participant_ids(&self) -> Option<Vec<String>> {
        if self.is_broadcast_only() {
            return None;
        }

        let mut seen = HashSet::new();
        let mut participants = Vec::new();
        for message in &self.messages {
            let ids = std::iter::once(&message.sender_id).chain(message.receiver_id.as_ref());
            for id in ids {
                if seen.insert(id.as_str()) {
                    participants.push(id.clone());
                }
            }
        }
        Some(participants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{message::MessageBody, roles::Role};
    use chrono::{DateTime, Duration, Utc};

    fn body() -> MessageBody {
        MessageBody::new("Progress", "Great week in math")
    }

    fn at(base: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
        base + Duration::minutes(minutes)
    }

    /// t1 -> {p1, p2} fanout, then p1 replies, then t1 answers p1.
    fn fanout_thread() -> Vec<Message> {
        let base = Utc::now();
        let to_p1 = Message::direct("t1", "p1", &body())
            .with_thread_id("th")
            .with_created_at(at(base, 0));
        let to_p2 = Message::direct("t1", "p2", &body())
            .with_thread_id("th")
            .with_created_at(at(base, 0));
        let reply = Message::direct("p1", "t1", &body())
            .with_thread_id("th")
            .with_reply_to(to_p1.id.clone())
            .with_created_at(at(base, 5));
        let answer = Message::direct("t1", "p1", &body())
            .with_thread_id("th")
            .with_reply_to(reply.id.clone())
            .with_created_at(at(base, 10));
        vec![to_p1, to_p2, reply, answer]
    }

    #[test]
    fn test_grouping_by_conversation_id() {
        let standalone = Message::direct("a1", "t1", &body());
        let mut rows = fanout_thread();
        rows.push(standalone.clone());

        let conversations = group_conversations(rows);
        assert_eq!(conversations.len(), 2);
        assert_eq!(conversations[0].id, "th");
        assert_eq!(conversations[0].messages.len(), 4);
        assert_eq!(conversations[1].id, standalone.id);
    }

    #[test]
    fn test_inbox_representative_is_latest_received() {
        let rows = fanout_thread();
        let conversation = group_conversations(rows.clone()).remove(0);

        let p1 = Caller::new("p1", Role::Parent);
        assert_eq!(conversation.inbox_representative(&p1).unwrap().id, rows[3].id);

        let p2 = Caller::new("p2", Role::Parent);
        assert_eq!(conversation.inbox_representative(&p2).unwrap().id, rows[1].id);

        let t1 = Caller::new("t1", Role::Teacher);
        assert_eq!(conversation.inbox_representative(&t1).unwrap().id, rows[2].id);

        let outsider = Caller::new("p9", Role::Parent);
        assert!(conversation.inbox_representative(&outsider).is_none());
    }

    #[test]
    fn test_sent_representative_is_root() {
        let rows = fanout_thread();
        let conversation = group_conversations(rows.clone()).remove(0);

        let t1 = Caller::new("t1", Role::Teacher);
        assert_eq!(conversation.sent_representative(&t1).unwrap().id, rows[0].id);

        // p1 only replied; they did not start this conversation
        let p1 = Caller::new("p1", Role::Parent);
        assert!(conversation.sent_representative(&p1).is_none());
    }

    #[test]
    fn test_reply_count_ignores_fanout_copies() {
        let rows = fanout_thread();
        let roots_only = group_conversations(rows[..2].to_vec()).remove(0);
        assert_eq!(roots_only.reply_count(), 0);

        let full = group_conversations(rows).remove(0);
        assert_eq!(full.reply_count(), 2);
    }

    #[test]
    fn test_visible_reply_count_hides_other_replies() {
        let conversation = group_conversations(fanout_thread()).remove(0);
        assert_eq!(conversation.visible_reply_count(&Caller::new("t1", Role::Teacher)), 2);
        assert_eq!(conversation.visible_reply_count(&Caller::new("p1", Role::Parent)), 2);
        assert_eq!(conversation.visible_reply_count(&Caller::new("p2", Role::Parent)), 0);
    }

    #[test]
    fn test_participants() {
        let conversation = group_conversations(fanout_thread()).remove(0);
        assert_eq!(
            conversation.participant_ids().unwrap(),
            vec!["t1".to_string(), "p1".to_string(), "p2".to_string()]
        );
    }

    #[test]
    fn test_broadcast_conversation_has_no_participants() {
        let broadcast = Message::broadcast("a1", Some(Role::Parent), &body());
        let conversation = group_conversations(vec![broadcast.clone()]).remove(0);
        assert!(conversation.participant_ids().is_none());

        // A private reply turns it into a direct conversation
        let reply = Message::direct("p1", "a1", &body())
            .with_thread_id(broadcast.id.clone())
            .with_reply_to(broadcast.id.clone());
        let conversation = group_conversations(vec![broadcast, reply]).remove(0);
        assert_eq!(
            conversation.participant_ids().unwrap(),
            vec!["a1".to_string(), "p1".to_string()]
        );
    }

    #[test]
    fn test_broadcast_inbox_eligibility_by_role() {
        let broadcast = Message::broadcast("a1", Some(Role::Parent), &body());
        let conversation = group_conversations(vec![broadcast]).remove(0);
        assert!(conversation
            .inbox_representative(&Caller::new("p1", Role::Parent))
            .is_some());
        assert!(conversation
            .inbox_representative(&Caller::new("t1", Role::Teacher))
            .is_none());
    }
}
