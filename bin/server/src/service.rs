use anyhow::Result;
use schoolmail_core::{
    Caller, ListQuery, Message, MessageListing, Messenger, MessagingResult, ProjectedMessage,
    SendRequest,
};

use crate::{config::Settings, identity::CurrentUser};

/// Service layer that owns the messenger and exposes it to the handlers
pub struct MessagingService {
    messenger: Messenger,
}

impl MessagingService {
    /// Create a new MessagingService from settings
    pub async fn new(settings: &Settings) -> Result<Self> {
        let messenger = Messenger::from_config(settings.messaging.clone())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create messenger: {}", e))?;
        Ok(Self::with_messenger(messenger))
    }

    pub fn with_messenger(messenger: Messenger) -> Self {
        Self { messenger }
    }

    pub async fn is_healthy(&self) -> bool {
        matches!(self.messenger.health_check().await, Ok(true))
    }

    pub async fn close(&self) -> Result<()> {
        self.messenger
            .close()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to close store: {}", e))
    }

    /// Resolve the session against the directory
    pub async fn authenticate(&self, caller: &Caller) -> MessagingResult<()> {
        self.messenger.authenticate(caller).await
    }

    pub async fn list(&self, user: &CurrentUser, query: ListQuery) -> MessagingResult<MessageListing> {
        self.messenger.list_messages(&user.0, query).await
    }

    pub async fn send(&self, user: &CurrentUser, request: SendRequest) -> MessagingResult<Vec<Message>> {
        self.messenger.send_message(&user.0, request).await
    }

    pub async fn get(&self, user: &CurrentUser, id: &str) -> MessagingResult<ProjectedMessage> {
        self.messenger.get_message(&user.0, id).await
    }

    pub async fn thread(&self, user: &CurrentUser, id: &str) -> MessagingResult<Vec<ProjectedMessage>> {
        self.messenger.get_thread(&user.0, id).await
    }

    pub async fn mark_read(&self, user: &CurrentUser, id: &str, is_read: bool) -> MessagingResult<Message> {
        self.messenger.mark_read(&user.0, id, is_read).await
    }
}
