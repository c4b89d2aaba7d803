use anyhow::Result;
use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::{
    cookie::{Cookie, Key},
    PrivateCookieJar,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::http_err::ApiError;

/// The name of the cookie holding the encrypted session.
pub const SESSION_COOKIE: &str = "token";

/// How long a session stays valid after login.
pub const SESSION_LIFETIME_HOURS: i64 = 8;

const UNAUTHORIZED_MESSAGE: &str = "Please log in.";

#[derive(Debug, Deserialize, Serialize)]
pub struct Session {
    id: Uuid,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session for a specific user.
    ///
    /// # Example
    ///
    /// ```
    /// # use uuid::Uuid;
    /// # use pocketbook_api::authentication::domain::session::Session;
    ///
    /// let user_id = Uuid::new_v4();
    /// let session = Session::new_for_user(user_id);
    ///
    /// assert_eq!(user_id, session.user_id());
    /// ```
    pub fn new_for_user(user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            expires_at: Utc::now() + Duration::hours(SESSION_LIFETIME_HOURS),
        }
    }

    pub fn serialized(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Build the cookie carrying this session. It is encrypted once added to
    /// a [`PrivateCookieJar`].
    pub fn cookie(&self) -> Result<Cookie<'static>> {
        Ok(Cookie::build(SESSION_COOKIE, self.serialized()?)
            .path("/")
            .http_only(true)
            .max_age(cookie::time::Duration::hours(SESSION_LIFETIME_HOURS))
            .finish())
    }

    /// A cookie that clears the session when removed from a jar.
    pub fn removal_cookie() -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, "").path("/").finish()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    Key: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let cookies = match PrivateCookieJar::<Key>::from_request_parts(parts, state).await {
            Ok(cookies) => cookies,
            Err(never) => match never {},
        };

        let session_cookie = cookies
            .get(SESSION_COOKIE)
            .ok_or_else(|| ApiError::Unauthorized(UNAUTHORIZED_MESSAGE.to_owned()))?;

        let session = match serde_json::from_str::<Session>(session_cookie.value()) {
            Ok(session) => session,
            Err(error) => {
                warn!(?error, "Received malformed session value.");

                return Err(ApiError::Unauthorized(UNAUTHORIZED_MESSAGE.to_owned()));
            }
        };

        if session.is_expired_at(Utc::now()) {
            debug!(session_id = %session.id(), "Rejected expired session.");

            return Err(ApiError::Unauthorized(
                "Session expired. Please log in again.".to_owned(),
            ));
        }

        debug!(user_id = %session.user_id(), session_id = %session.id(), "Parsed cookie session.");

        Ok(session)
    }
}
