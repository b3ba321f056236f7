use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Json,
    routing::{get, patch},
    Router,
};
use schoolmail_core::{Message, MessageListing, ProjectedMessage};
use validator::Validate;

use crate::{
    dto::{ListParams, MarkReadRequest, SendMessageRequest, SendMessageResponse, ThreadResponse},
    errors::ApiError,
    identity::CurrentUser,
    service::MessagingService,
};

/// Create messages router
pub fn create_router() -> Router {
    Router::new()
        .route("/messages", get(list_messages).post(send_message))
        .route("/messages/:id", get(get_message))
        .route("/messages/:id/thread", get(get_thread))
        .route("/messages/:id/read", patch(mark_read))
}

/// Inbox, sent or broadcasts listing with stats
async fn list_messages(
    Extension(service): Extension<Arc<MessagingService>>,
    user: CurrentUser,
    Query(params): Query<ListParams>,
) -> Result<Json<MessageListing>, ApiError> {
    let query = params.to_query()?;
    Ok(Json(service.list(&user, query).await?))
}

/// Send a direct message, broadcast or reply
async fn send_message(
    Extension(service): Extension<Arc<MessagingService>>,
    user: CurrentUser,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<SendMessageResponse>), ApiError> {
    request.validate()?;
    let messages = service.send(&user, request.into()).await?;
    Ok((StatusCode::CREATED, Json(SendMessageResponse { messages })))
}

async fn get_message(
    Extension(service): Extension<Arc<MessagingService>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ProjectedMessage>, ApiError> {
    Ok(Json(service.get(&user, &id).await?))
}

async fn get_thread(
    Extension(service): Extension<Arc<MessagingService>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ThreadResponse>, ApiError> {
    let messages = service.thread(&user, &id).await?;
    Ok(Json(ThreadResponse { messages }))
}

async fn mark_read(
    Extension(service): Extension<Arc<MessagingService>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<MarkReadRequest>,
) -> Result<Json<Message>, ApiError> {
    Ok(Json(service.mark_read(&user, &id, request.is_read).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use schoolmail_core::{
        DirectoryConfig, MessagingConfig, Messenger, Role, StoreConfig, UserSummary,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::identity::{USER_ID_HEADER, USER_ROLE_HEADER};

    async fn app() -> Router {
        let users = vec![
            UserSummary::new("a1", "Principal Chen", "chen@school.test", Role::Admin),
            UserSummary::new("t1", "Ms. Rivera", "rivera@school.test", Role::Teacher),
            UserSummary::new("p1", "Sam Okafor", "sam@home.test", Role::Parent),
            UserSummary::new("p2", "Lee Park", "lee@home.test", Role::Parent),
        ];
        let config = MessagingConfig::default()
            .with_store(StoreConfig::memory())
            .with_directory(DirectoryConfig::with_users(users).with_cache_ttl(0));
        let messenger = Messenger::from_config(config).await.unwrap();
        crate::build_router(Arc::new(MessagingService::with_messenger(messenger)))
    }

    fn request(
        method: &str,
        uri: &str,
        user: Option<(&str, &str)>,
        body: Option<Value>,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((id, role)) = user {
            builder = builder.header(USER_ID_HEADER, id).header(USER_ROLE_HEADER, role);
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    const TEACHER: Option<(&str, &str)> = Some(("t1", "TEACHER"));
    const PARENT: Option<(&str, &str)> = Some(("p1", "PARENT"));

    #[tokio::test]
    async fn test_healthcheck() {
        let app = app().await;
        let (status, body) = call(&app, request("GET", "/healthcheck", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let app = app().await;
        let (status, body) = call(&app, request("GET", "/api/messages", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_identity_is_checked_before_request_validation() {
        let app = app().await;
        let stranger = Some(("ghost", "TEACHER"));
        let (status, _) = call(
            &app,
            request(
                "POST",
                "/api/messages",
                stranger,
                Some(json!({"recipient_ids": ["p1"], "subject": "", "content": "Hello"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) =
            call(&app, request("GET", "/api/messages?mode=everything", stranger, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Known id claiming the wrong role
        let (status, _) = call(
            &app,
            request(
                "POST",
                "/api/messages",
                Some(("p1", "ADMIN")),
                Some(json!({"broadcast": true, "subject": "", "content": "Hello"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_parent_broadcast_is_forbidden() {
        let app = app().await;
        let (status, _) = call(
            &app,
            request(
                "POST",
                "/api/messages",
                PARENT,
                Some(json!({"broadcast": true, "subject": "Bake sale", "content": "Friday"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_send_list_reply_and_mark_read() {
        let app = app().await;
        let (status, sent) = call(
            &app,
            request(
                "POST",
                "/api/messages",
                TEACHER,
                Some(json!({
                    "recipient_ids": ["p1", "p2"],
                    "subject": "Field trip",
                    "content": "Permission slips due Friday",
                    "type": "ACADEMIC",
                    "priority": "HIGH"
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let rows = sent["messages"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["thread_id"], rows[1]["thread_id"]);

        let (status, inbox) = call(&app, request("GET", "/api/messages?view=inbox", PARENT, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(inbox["stats"]["unread"], 1);
        let entry = &inbox["messages"][0];
        assert_eq!(entry["receiver_id"], "p1");
        assert_eq!(entry["sender"]["name"], "Ms. Rivera");
        assert_eq!(entry["reply_count"], 0);
        assert_eq!(entry["participants"].as_array().unwrap().len(), 3);
        let message_id = entry["id"].as_str().unwrap().to_string();

        let (status, reply) = call(
            &app,
            request(
                "POST",
                "/api/messages",
                PARENT,
                Some(json!({
                    "reply_to_id": message_id,
                    "subject": "Re: Field trip",
                    "content": "Signed"
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(reply["messages"][0]["receiver_id"], "t1");
        assert_eq!(reply["messages"][0]["thread_id"], rows[0]["thread_id"]);

        let (_, teacher_sent) =
            call(&app, request("GET", "/api/messages?view=sent&mode=direct", TEACHER, None)).await;
        assert_eq!(teacher_sent["messages"].as_array().unwrap().len(), 1);
        assert_eq!(teacher_sent["messages"][0]["reply_count"], 1);

        let uri = format!("/api/messages/{}/read", message_id);
        for _ in 0..2 {
            let (status, updated) =
                call(&app, request("PATCH", &uri, PARENT, Some(json!({"is_read": true})))).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(updated["is_read"], true);
        }

        let (status, _) =
            call(&app, request("PATCH", &uri, TEACHER, Some(json!({"is_read": true})))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, thread) = call(
            &app,
            request("GET", &format!("/api/messages/{}/thread", message_id), PARENT, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(thread["messages"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_recipient_is_unprocessable() {
        let app = app().await;
        let (status, body) = call(
            &app,
            request(
                "POST",
                "/api/messages",
                TEACHER,
                Some(json!({"recipient_ids": ["p1", "ghost"], "subject": "Hi", "content": "Hello"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("ghost"));

        let (_, inbox) = call(&app, request("GET", "/api/messages", PARENT, None)).await;
        assert!(inbox["messages"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_request_validation() {
        let app = app().await;
        let (status, _) = call(
            &app,
            request(
                "POST",
                "/api/messages",
                TEACHER,
                Some(json!({"recipient_ids": ["p1"], "subject": "", "content": "Hello"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) =
            call(&app, request("GET", "/api/messages?mode=everything", TEACHER, None)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("mode"));
    }

    #[tokio::test]
    async fn test_missing_message_is_not_found() {
        let app = app().await;
        let (status, _) = call(&app, request("GET", "/api/messages/nope", PARENT, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_broadcast_listing() {
        let app = app().await;
        let (status, _) = call(
            &app,
            request(
                "POST",
                "/api/messages",
                Some(("a1", "ADMIN")),
                Some(json!({
                    "broadcast": true,
                    "target_role": "PARENT",
                    "subject": "Snow day",
                    "content": "School is closed"
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, parent) =
            call(&app, request("GET", "/api/messages?view=broadcasts", PARENT, None)).await;
        let entries = parent["messages"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0]["participants"].is_null());
        assert!(entries[0]["receiver_id"].is_null());

        let (_, teacher) =
            call(&app, request("GET", "/api/messages?view=broadcasts", TEACHER, None)).await;
        assert!(teacher["messages"].as_array().unwrap().is_empty());
    }
}
