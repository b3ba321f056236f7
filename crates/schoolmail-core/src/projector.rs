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

//! Per-viewer projections: inbox, sent and broadcasts listings, single
//! messages and threads, each decorated with directory profiles.

use std::collections::{HashMap, HashSet};
use std::iter;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    access,
    directory::{UserDirectory, UserSummary},
    errors::{MessagingError, MessagingResult},
    message::Message,
    session::Caller,
    store::{MessageScope, MessageStore},
    thread::{group_conversations, Conversation},
};

/// Which kinds of message a listing admits
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Direct,
    Broadcast,
    #[default]
    All,
}

impl ViewMode {
    pub fn admits(&self, message: &Message) -> bool {
        match self {
            ViewMode::Direct => !message.is_broadcast,
            ViewMode::Broadcast => message.is_broadcast,
            ViewMode::All => true,
        }
    }
}

impl std::str::FromStr for ViewMode {
    type Err = MessagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct" => Ok(ViewMode::Direct),
            "broadcast" => Ok(ViewMode::Broadcast),
            "all" => Ok(ViewMode::All),
            _ => Err(MessagingError::validation(
                "mode",
                format!("mode {} not supported", s),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    #[default]
    Inbox,
    Sent,
    Broadcasts,
}

impl std::str::FromStr for ViewKind {
    type Err = MessagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inbox" => Ok(ViewKind::Inbox),
            "sent" => Ok(ViewKind::Sent),
            "broadcasts" => Ok(ViewKind::Broadcasts),
            _ => Err(MessagingError::validation(
                "view",
                format!("view {} not supported", s),
            )),
        }
    }
}

/// A message as one viewer sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedMessage {
    #[serde(flatten)]
    pub message: Message,
    pub sender: Option<UserSummary>,
    pub receiver: Option<UserSummary>,
    /// Replies in the message's conversation that the viewer can see
    pub reply_count: usize,
    /// Everyone in a direct conversation; absent for broadcasts
    pub participants: Option<Vec<UserSummary>>,
}

/// Aggregate counts over everything the viewer sent or received
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageStats {
    pub total: usize,
    /// Received and not yet read
    pub unread: usize,
    pub sent: usize,
    pub received: usize,
    pub broadcast: usize,
    pub direct: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageListing {
    pub messages: Vec<ProjectedMessage>,
    pub stats: MessageStats,
}

/// Counts over a viewer's messages. Each message is counted once even when
/// the viewer both sent and received it.
pub fn compute_stats<'m>(caller: &Caller, messages: impl IntoIterator<Item = &'m Message>) -> MessageStats {
    let mut stats = MessageStats::default();
    for message in messages {
        stats.total += 1;
        if access::is_sender(message, caller) {
            stats.sent += 1;
        }
        if access::is_recipient(message, caller) {
            stats.received += 1;
            if !message.is_read {
                stats.unread += 1;
            }
        }
        if message.is_broadcast {
            stats.broadcast += 1;
        } else {
            stats.direct += 1;
        }
    }
    stats
}

/// A representative message before directory decoration
#[derive(Debug)]
struct Entry {
    message: Message,
    reply_count: usize,
    participant_ids: Option<Vec<String>>,
}

impl Entry {
    fn for_conversation(conversation: &Conversation, caller: &Caller, representative: &Message) -> Self {
        Self {
            message: representative.clone(),
            reply_count: conversation.visible_reply_count(caller),
            participant_ids: if representative.is_broadcast {
                None
            } else {
                conversation.participant_ids()
            },
        }
    }
}

fn sort_newest_first(entries: &mut [Entry]) {
    entries.sort_by(|a, b| b.message.created_at.cmp(&a.message.created_at));
}

/// Distinct conversation ids in order of first appearance
fn conversation_ids<'m>(messages: impl Iterator<Item = &'m Message>) -> Vec<String> {
    let mut seen = HashSet::new();
    messages
        .map(Message::conversation_id)
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

fn universe<'m>(sent: &'m [Message], received: &'m [Message], mode: ViewMode) -> Vec<&'m Message> {
    let mut seen = HashSet::new();
    sent.iter()
        .chain(received.iter())
        .filter(|&message| mode.admits(message) && seen.insert(message.id.as_str()))
        .collect()
}

/// Builds projections for one request. Grouping is recomputed on every call.
pub struct ViewProjector<'a> {
    store: &'a dyn MessageStore,
    directory: &'a dyn UserDirectory,
}

impl<'a> ViewProjector<'a> {
    pub fn new(store: &'a dyn MessageStore, directory: &'a dyn UserDirectory) -> Self {
        Self { store, directory }
    }

    /// One view of the caller's messages plus stats over everything they
    /// sent or received under the same mode.
    pub async fn list(
        &self,
        caller: &Caller,
        mode: ViewMode,
        view: ViewKind,
    ) -> MessagingResult<MessageListing> {
        let sent = self
            .store
            .list_messages(&MessageScope::SentBy(caller.user_id.clone()))
            .await?;
        let received = self
            .store
            .list_messages(&MessageScope::ReceivableBy(caller.clone()))
            .await?;
        let stats = compute_stats(caller, universe(&sent, &received, mode));

        let entries = match view {
            ViewKind::Inbox => self.inbox(caller, mode, &received).await?,
            ViewKind::Sent => self.sent(caller, mode, &sent).await?,
            ViewKind::Broadcasts => self.broadcasts(caller, mode).await?,
        };
        debug!(
            "Projected {} {:?} entries for {} ({} sent, {} received)",
            entries.len(),
            view,
            caller.user_id,
            sent.len(),
            received.len()
        );

        Ok(MessageListing {
            messages: self.decorate(entries).await?,
            stats,
        })
    }

    /// A single message, visible to its sender or an eligible recipient
    pub async fn message(&self, caller: &Caller, id: &str) -> MessagingResult<ProjectedMessage> {
        let message = self.visible_message(caller, id).await?;
        let conversations = self
            .load_conversations(vec![message.conversation_id().to_string()])
            .await?;

        let entry = match conversations.first() {
            Some(conversation) => Entry::for_conversation(conversation, caller, &message),
            None => Entry {
                message,
                reply_count: 0,
                participant_ids: None,
            },
        };

        let mut projected = self.decorate(vec![entry]).await?;
        projected.pop().ok_or_else(|| MessagingError::not_found(id))
    }

    /// Every message of the conversation containing `id` that the caller
    /// sent or received, oldest first.
    pub async fn thread(&self, caller: &Caller, id: &str) -> MessagingResult<Vec<ProjectedMessage>> {
        let anchor = self.visible_message(caller, id).await?;
        let conversation_id = anchor.conversation_id().to_string();
        let Some(conversation) = self
            .load_conversations(vec![conversation_id])
            .await?
            .into_iter()
            .next()
        else {
            return Err(MessagingError::not_found(id));
        };

        let reply_count = conversation.visible_reply_count(caller);
        let participant_ids = conversation.participant_ids();
        let entries = conversation
            .messages
            .into_iter()
            .filter(|message| access::can_view(message, caller))
            .map(|message| Entry {
                participant_ids: if message.is_broadcast {
                    None
                } else {
                    participant_ids.clone()
                },
                reply_count,
                message,
            })
            .collect();

        self.decorate(entries).await
    }

    async fn inbox(
        &self,
        caller: &Caller,
        mode: ViewMode,
        received: &[Message],
    ) -> MessagingResult<Vec<Entry>> {
        let ids = conversation_ids(received.iter().filter(|message| mode.admits(message)));
        let conversations = self.load_conversations(ids).await?;

        let mut entries: Vec<Entry> = conversations
            .iter()
            .filter_map(|conversation| {
                conversation
                    .latest_received_where(caller, |message| mode.admits(message))
                    .map(|representative| {
                        Entry::for_conversation(conversation, caller, representative)
                    })
            })
            .collect();
        sort_newest_first(&mut entries);
        Ok(entries)
    }

    /// Conversations the caller started; replies they wrote elsewhere do
    /// not make a conversation theirs.
    async fn sent(&self, caller: &Caller, mode: ViewMode, sent: &[Message]) -> MessagingResult<Vec<Entry>> {
        let ids = conversation_ids(
            sent.iter()
                .filter(|message| mode.admits(message) && !message.is_reply()),
        );
        let conversations = self.load_conversations(ids).await?;

        let mut entries: Vec<Entry> = conversations
            .iter()
            .filter_map(|conversation| {
                conversation
                    .root_sent_where(caller, |message| mode.admits(message))
                    .map(|root| Entry::for_conversation(conversation, caller, root))
            })
            .collect();
        sort_newest_first(&mut entries);
        Ok(entries)
    }

    /// Broadcasts addressed to the caller's role plus the caller's own, one
    /// entry per broadcast.
    async fn broadcasts(&self, caller: &Caller, mode: ViewMode) -> MessagingResult<Vec<Entry>> {
        if mode == ViewMode::Direct {
            return Ok(Vec::new());
        }

        let visible: Vec<Message> = self
            .store
            .list_messages(&MessageScope::Broadcasts)
            .await?
            .into_iter()
            .filter(|message| access::can_view(message, caller))
            .collect();

        let conversations = self.load_conversations(conversation_ids(visible.iter())).await?;
        let reply_counts: HashMap<&str, usize> = conversations
            .iter()
            .map(|conversation| {
                (conversation.id.as_str(), conversation.visible_reply_count(caller))
            })
            .collect();

        let mut entries: Vec<Entry> = visible
            .into_iter()
            .map(|message| {
                let reply_count = reply_counts
                    .get(message.conversation_id())
                    .copied()
                    .unwrap_or(0);
                Entry {
                    message,
                    reply_count,
                    participant_ids: None,
                }
            })
            .collect();
        sort_newest_first(&mut entries);
        Ok(entries)
    }

    async fn visible_message(&self, caller: &Caller, id: &str) -> MessagingResult<Message> {
        let message = self
            .store
            .get_message(id)
            .await?
            .ok_or_else(|| MessagingError::not_found(id))?;
        if !access::can_view(&message, caller) {
            return Err(MessagingError::forbidden(format!("view message {}", id)));
        }
        Ok(message)
    }

    async fn load_conversations(&self, ids: Vec<String>) -> MessagingResult<Vec<Conversation>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .store
            .list_messages(&MessageScope::Conversations(ids))
            .await?;
        Ok(group_conversations(rows))
    }

    /// Resolve every referenced user in one directory call. Users the
    /// directory no longer knows are left out rather than failing the view.
    async fn decorate(&self, entries: Vec<Entry>) -> MessagingResult<Vec<ProjectedMessage>> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for entry in &entries {
            let referenced = iter::once(&entry.message.sender_id)
                .chain(entry.message.receiver_id.as_ref())
                .chain(entry.participant_ids.iter().flatten());
            for id in referenced {
                if seen.insert(id.as_str()) {
                    ids.push(id.clone());
                }
            }
        }

        let users = if ids.is_empty() {
            HashMap::new()
        } else {
            self.directory.get_users(&ids).await?
        };

        Ok(entries
            .into_iter()
            .map(|entry| ProjectedMessage {
                sender: users.get(&entry.message.sender_id).cloned(),
                receiver: entry
                    .message
                    .receiver_id
                    .as_ref()
                    .and_then(|id| users.get(id).cloned()),
                participants: entry.participant_ids.map(|ids| {
                    ids.iter().filter_map(|id| users.get(id).cloned()).collect()
                }),
                reply_count: entry.reply_count,
                message: entry.message,
            })
            .collect())
    }
}
