//! Request extractors: the client's active-session pointer and session ids

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRef, FromRequestParts, Path},
    http::request::Parts,
    Json,
};
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use std::convert::Infallible;

use crate::session::{ActiveSession, ServiceError, ServiceResult};

pub const ACTIVE_SESSION_COOKIE: &str = "active_session_id";

/// The requesting client's active-session pointer, carried in a signed cookie.
///
/// A cookie whose signature does not verify is ignored.
pub struct ClientContext {
    jar: SignedCookieJar,
    initial: ActiveSession,
    pub active: ActiveSession,
}

impl ClientContext {
    /// The cookie jar to send back, updated only if the pointer changed.
    pub fn into_jar(self) -> SignedCookieJar {
        if self.active == self.initial {
            return self.jar;
        }

        match self.active.get() {
            Some(id) => self.jar.add(
                Cookie::build((ACTIVE_SESSION_COOKIE, id.to_string()))
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax),
            ),
            None => self.jar.remove(Cookie::build(ACTIVE_SESSION_COOKIE).path("/")),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientContext
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = SignedCookieJar::<Key>::from_request_parts(parts, state).await?;
        let initial = ActiveSession::new(
            jar.get(ACTIVE_SESSION_COOKIE)
                .and_then(|cookie| cookie.value().parse().ok()),
        );

        Ok(Self {
            jar,
            initial,
            active: initial,
        })
    }
}

/// Numeric session id from the `:id` path segment
pub struct SessionId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|e| ServiceError::Validation(format!("Invalid session id: {}", e.body_text())))?;
        Ok(Self(id))
    }
}

/// Unwrap a JSON body, reporting malformed input as a validation failure.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ServiceResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ServiceError::Validation(format!("Invalid request body: {}", e.body_text())))
}
