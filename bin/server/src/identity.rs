use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use schoolmail_core::Caller;

use crate::{errors::ApiError, service::MessagingService};

/// Header carrying the authenticated user's id, set by the portal gateway
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user's role
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The caller behind the current request, already checked against the
/// directory. Handlers take it before any other extractor so identity is
/// settled ahead of request validation.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Caller);

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|value| value.to_str().ok())
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let caller = Caller::authenticate(
            header(parts, USER_ID_HEADER),
            header(parts, USER_ROLE_HEADER),
        )?;
        let service = parts
            .extensions
            .get::<Arc<MessagingService>>()
            .cloned()
            .ok_or(ApiError::ServiceUnavailable)?;
        service.authenticate(&caller).await?;
        Ok(CurrentUser(caller))
    }
}
