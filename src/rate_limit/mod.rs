mod redis;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;

pub use self::redis::RedisRateLimiter;

/// A requests-per-minute definition of a rate limiter.
pub trait RateLimiter: Send + Sync {
    /// Determine if the rate limit has been exceeded for a specific resource.
    ///
    /// # Arguments
    ///
    /// * `key` - A unique key for the resource being rate limited. In the
    ///   context of a web request, this should encapsulate the request path and
    ///   method, as well as the actor making the request.
    /// * `max_req_per_min` - The maximum number of requests allowed in a given
    ///   minute.
    ///
    /// # Returns
    ///
    /// In the typical case, an [Ok] result containing a result describing the
    /// requestor's rate limit state is returned. An [Err] is returned if the
    /// rate limiter encounters an error while trying to determine if the
    /// request should be rate limited.
    fn is_limited(&self, key: &str, max_req_per_min: u64) -> anyhow::Result<RateLimitResult>;
}

/// A rate limiter that never limits anything, used when no Redis instance is
/// configured.
pub struct Unlimited;

impl RateLimiter for Unlimited {
    fn is_limited(&self, _key: &str, _max_req_per_min: u64) -> anyhow::Result<RateLimitResult> {
        Ok(RateLimitResult::NotLimited)
    }
}

#[derive(Debug)]
pub enum RateLimitResult {
    /// The rate limit has not been exceeded.
    NotLimited,
    /// The rate limit has been exceeded. Requests will be accepted again at the
    /// contained timestamp.
    LimitedUntil(chrono::DateTime<Utc>),
}

#[derive(Serialize)]
pub struct RateLimitResponse {
    pub message: Option<String>,
}

impl From<RateLimitResult> for RateLimitResponse {
    fn from(result: RateLimitResult) -> Self {
        match result {
            RateLimitResult::LimitedUntil(_time) => Self {
                message: Some("Too many attempts. Please try again later.".to_string()),
            },
            RateLimitResult::NotLimited => Self { message: None },
        }
    }
}

impl IntoResponse for RateLimitResult {
    fn into_response(self) -> Response {
        if let Self::LimitedUntil(_time) = self {
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(RateLimitResponse::from(self)),
            )
                .into_response()
        } else {
            // Only limited results are expected to become responses.
            StatusCode::OK.into_response()
        }
    }
}
