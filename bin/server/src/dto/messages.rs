use schoolmail_core::{
    ListQuery, Message, MessageBody, MessageType, MessagingResult, Priority, ProjectedMessage,
    Role, SendRequest, ViewKind, ViewMode,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query string of `GET /api/messages`
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub mode: Option<String>,
    pub view: Option<String>,
}

impl ListParams {
    /// Unknown values are rejected rather than silently defaulted
    pub fn to_query(&self) -> MessagingResult<ListQuery> {
        let mode = match &self.mode {
            Some(mode) => mode.parse::<ViewMode>()?,
            None => ViewMode::default(),
        };
        let view = match &self.view {
            Some(view) => view.parse::<ViewKind>()?,
            None => ViewKind::default(),
        };
        Ok(ListQuery::new(mode, view))
    }
}

/// Body of `POST /api/messages`
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub recipient_ids: Vec<String>,
    #[serde(default)]
    pub broadcast: bool,
    pub target_role: Option<Role>,
    #[validate(length(min = 1))]
    pub subject: String,
    #[validate(length(min = 1))]
    pub content: String,
    #[serde(rename = "type", default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub priority: Priority,
    pub reply_to_id: Option<String>,
    pub thread_id: Option<String>,
}

impl From<SendMessageRequest> for SendRequest {
    fn from(request: SendMessageRequest) -> Self {
        SendRequest {
            recipient_ids: request.recipient_ids,
            broadcast: request.broadcast,
            target_role: request.target_role,
            body: MessageBody::new(request.subject, request.content)
                .with_type(request.message_type)
                .with_priority(request.priority),
            reply_to_id: request.reply_to_id,
            thread_id: request.thread_id,
        }
    }
}

/// Rows created by a send
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct ThreadResponse {
    pub messages: Vec<ProjectedMessage>,
}

/// Body of `PATCH /api/messages/:id/read`
#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    #[serde(default = "default_is_read")]
    pub is_read: bool,
}

fn default_is_read() -> bool {
    true
}
