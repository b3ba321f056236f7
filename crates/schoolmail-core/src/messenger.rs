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

//! Main messaging orchestrator

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    config::MessagingConfig,
    directory::create_directory,
    errors::{MessagingError, MessagingResult},
    fanout::{self, FanoutPlan},
    message::{Message, MessageBody},
    projector::{MessageListing, ProjectedMessage, ViewKind, ViewMode, ViewProjector},
    read_state,
    reply::{self, ReplyLinkage},
    roles::{Capability, Role},
    session::Caller,
    store::create_store,
    types::MessagingClients,
};

/// Which listing to build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub mode: ViewMode,
    #[serde(default)]
    pub view: ViewKind,
}

impl ListQuery {
    pub fn new(mode: ViewMode, view: ViewKind) -> Self {
        Self { mode, view }
    }
}

/// An outgoing message: direct to named recipients, a role-targeted
/// broadcast, or a reply to an existing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub recipient_ids: Vec<String>,
    #[serde(default)]
    pub broadcast: bool,
    pub target_role: Option<Role>,
    #[serde(flatten)]
    pub body: MessageBody,
    pub reply_to_id: Option<String>,
    pub thread_id: Option<String>,
}

impl SendRequest {
    fn with_body(body: MessageBody) -> Self {
        Self {
            recipient_ids: Vec::new(),
            broadcast: false,
            target_role: None,
            body,
            reply_to_id: None,
            thread_id: None,
        }
    }

    pub fn direct<I, S>(recipient_ids: I, body: MessageBody) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            recipient_ids: recipient_ids.into_iter().map(Into::into).collect(),
            ..Self::with_body(body)
        }
    }

    /// `None` addresses every role
    pub fn broadcast(target_role: Option<Role>, body: MessageBody) -> Self {
        Self {
            broadcast: true,
            target_role,
            ..Self::with_body(body)
        }
    }

    pub fn reply(reply_to_id: impl Into<String>, body: MessageBody) -> Self {
        Self {
            reply_to_id: Some(reply_to_id.into()),
            ..Self::with_body(body)
        }
    }

    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }
}

/// Unified direct and broadcast messaging for portal users
pub struct Messenger {
    clients: MessagingClients,
    max_recipients: usize,
}

impl Messenger {
    /// Initialize with existing clients
    pub fn new(clients: MessagingClients, config: &MessagingConfig) -> Self {
        Self {
            clients,
            max_recipients: config.max_recipients,
        }
    }

    /// Build the configured store and directory, then initialize
    pub async fn from_config(config: MessagingConfig) -> MessagingResult<Self> {
        let store = create_store(&config.store).await?;
        let directory = create_directory(&config.directory)?;
        info!(
            "Messenger ready ({} store, {:?} directory)",
            config.store.store_type, config.directory.directory_type
        );
        Ok(Self::new(MessagingClients::new(store, directory), &config))
    }

    pub fn clients(&self) -> &MessagingClients {
        &self.clients
    }

    pub async fn health_check(&self) -> MessagingResult<bool> {
        Ok(self.clients.store.health_check().await?)
    }

    /// Flush the store
    pub async fn close(&self) -> MessagingResult<()> {
        Ok(self.clients.store.close().await?)
    }

    /// Inbox, sent or broadcasts listing with aggregate stats
    #[instrument(skip(self, caller), fields(user = %caller.user_id, role = %caller.role))]
    pub async fn list_messages(
        &self,
        caller: &Caller,
        query: ListQuery,
    ) -> MessagingResult<MessageListing> {
        self.authenticate(caller).await?;
        self.projector().list(caller, query.mode, query.view).await
    }

    /// Send a direct message, broadcast or reply. Every row the send
    /// produces is written in one transaction.
    #[instrument(skip(self, caller, request), fields(user = %caller.user_id, role = %caller.role))]
    pub async fn send_message(
        &self,
        caller: &Caller,
        request: SendRequest,
    ) -> MessagingResult<Vec<Message>> {
        self.authenticate(caller).await?;
        request.body.validate()?;

        let plan = match request.reply_to_id.as_deref() {
            Some(reply_to_id) => self.plan_reply(caller, reply_to_id, &request).await?,
            None => self.plan_send(caller, &request).await?,
        };
        self.write(plan).await
    }

    #[instrument(skip(self, caller), fields(user = %caller.user_id, role = %caller.role))]
    pub async fn mark_read(
        &self,
        caller: &Caller,
        message_id: &str,
        is_read: bool,
    ) -> MessagingResult<Message> {
        self.authenticate(caller).await?;
        let message =
            read_state::mark_read(self.clients.store.as_ref(), caller, message_id, is_read).await?;
        info!("Message {} is_read={}", message_id, message.is_read);
        Ok(message)
    }

    #[instrument(skip(self, caller), fields(user = %caller.user_id, role = %caller.role))]
    pub async fn get_message(
        &self,
        caller: &Caller,
        message_id: &str,
    ) -> MessagingResult<ProjectedMessage> {
        self.authenticate(caller).await?;
        self.projector().message(caller, message_id).await
    }

    /// The visible part of a message's conversation, oldest first
    #[instrument(skip(self, caller), fields(user = %caller.user_id, role = %caller.role))]
    pub async fn get_thread(
        &self,
        caller: &Caller,
        message_id: &str,
    ) -> MessagingResult<Vec<ProjectedMessage>> {
        self.authenticate(caller).await?;
        self.projector().thread(caller, message_id).await
    }

    fn projector(&self) -> ViewProjector<'_> {
        ViewProjector::new(
            self.clients.store.as_ref(),
            self.clients.directory.as_ref(),
        )
    }

    /// The caller must exist in the directory with the role the session
    /// claims. Every operation runs this before any other check.
    pub async fn authenticate(&self, caller: &Caller) -> MessagingResult<()> {
        match self.clients.directory.get_user(&caller.user_id).await? {
            Some(user) if user.role == caller.role => Ok(()),
            Some(user) => {
                warn!(
                    "Session role {} does not match directory role {} for {}",
                    caller.role, user.role, caller.user_id
                );
                Err(MessagingError::Unauthenticated)
            }
            None => {
                warn!("Unknown caller {}", caller.user_id);
                Err(MessagingError::Unauthenticated)
            }
        }
    }

    async fn plan_send(&self, caller: &Caller, request: &SendRequest) -> MessagingResult<FanoutPlan> {
        if request.thread_id.is_some() {
            return Err(MessagingError::validation(
                "thread_id",
                "only replies join an existing conversation",
            ));
        }

        if request.broadcast {
            fanout::authorize(caller, Capability::Broadcast)?;
            if !request.recipient_ids.is_empty() {
                return Err(MessagingError::validation(
                    "recipient_ids",
                    "a broadcast is addressed by role, not by recipient",
                ));
            }
            return Ok(fanout::plan_broadcast(caller, request.target_role, &request.body));
        }

        fanout::authorize(caller, Capability::DirectMessage)?;
        if request.target_role.is_some() {
            return Err(MessagingError::validation(
                "target_role",
                "only broadcasts target a role",
            ));
        }
        let recipients = fanout::normalize_recipients(&request.recipient_ids, self.max_recipients)?;
        fanout::ensure_recipients_exist(self.clients.directory.as_ref(), &recipients).await?;
        Ok(fanout::plan_direct(caller, &recipients, &request.body))
    }

    async fn plan_reply(
        &self,
        caller: &Caller,
        reply_to_id: &str,
        request: &SendRequest,
    ) -> MessagingResult<FanoutPlan> {
        let original = self
            .clients
            .store
            .get_message(reply_to_id)
            .await?
            .ok_or_else(|| MessagingError::not_found(reply_to_id))?;
        reply::authorize(caller, &original)?;

        let linkage = ReplyLinkage::for_original(&original);
        linkage.check_supplied_thread_id(request.thread_id.as_deref())?;
        if request.broadcast || request.target_role.is_some() || !request.recipient_ids.is_empty() {
            debug!(
                "Reply to {} goes to {}; ignoring addressing fields",
                reply_to_id, linkage.receiver_id
            );
        }

        let row = reply::build_reply(caller, &linkage, &request.body);
        Ok(FanoutPlan {
            rows: vec![row],
            thread_id: Some(linkage.thread_id),
        })
    }

    /// Stage every row and commit, or roll back so none become visible.
    async fn write(&self, plan: FanoutPlan) -> MessagingResult<Vec<Message>> {
        let mut transaction = self.clients.store.begin_transaction().await?;

        for row in plan.rows {
            if let Err(e) = transaction.insert(row).await {
                error!("Failed to stage message, rolling back: {}", e);
                if let Err(rollback_error) = transaction.rollback().await {
                    error!("Rollback failed: {}", rollback_error);
                }
                return Err(e.into());
            }
        }

        let committed = transaction.commit().await.map_err(|e| {
            error!("Failed to commit messages: {}", e);
            e
        })?;
        info!(
            "Wrote {} message(s) in conversation {:?}",
            committed.len(),
            plan.thread_id
                .as_deref()
                .or_else(|| committed.first().map(Message::conversation_id))
        );
        Ok(committed)
    }
}
