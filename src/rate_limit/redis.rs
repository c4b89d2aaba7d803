use chrono::{DateTime, Duration, DurationRound, Utc};
use redis::Commands;
use tracing::debug;

use super::{RateLimitResult, RateLimiter};

/// A rate limiter that uses Redis as a backing store.
pub struct RedisRateLimiter {
    client: redis::Client,
}

impl RedisRateLimiter {
    /// Create a new rate limiter.
    ///
    /// # Arguments
    ///
    /// * `connection_uri` - The connection string used to connect to Redis.
    pub fn new(connection_uri: &str) -> anyhow::Result<Self> {
        Ok(Self {
            client: redis::Client::open(connection_uri)?,
        })
    }
}

/// The start of the minute after `now`, when a per-minute counter resets.
fn next_minute(now: DateTime<Utc>) -> anyhow::Result<DateTime<Utc>> {
    Ok((now + Duration::minutes(1)).duration_trunc(Duration::minutes(1))?)
}

/// The counter key for the minute containing `now`.
///
/// Only the minute of the hour is used, so a key is reused an hour later,
/// long after it has expired.
fn minute_key(key: &str, now: DateTime<Utc>) -> String {
    format!("{}:{}", key, now.format("%M"))
}

impl RateLimiter for RedisRateLimiter {
    fn is_limited(&self, key: &str, max_req_per_min: u64) -> anyhow::Result<RateLimitResult> {
        // https://redis.com/redis-best-practices/basic-rate-limiting/
        let mut conn = self.client.get_connection()?;

        let now = Utc::now();
        let cache_key = minute_key(key, now);

        let hits: Option<u64> = conn.get(&cache_key)?;
        if let Some(hit_count) = hits {
            if hit_count >= max_req_per_min {
                debug!(%cache_key, hit_count, "Rate limit exceeded.");

                return Ok(RateLimitResult::LimitedUntil(next_minute(now)?));
            }
        }

        redis::pipe()
            .atomic()
            .cmd("INCR")
            .arg(&cache_key)
            .ignore()
            .cmd("EXPIRE")
            .arg(&cache_key)
            .arg(59)
            .ignore()
            .query::<()>(&mut conn)?;

        Ok(RateLimitResult::NotLimited)
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn limit_expires_at_next_whole_minute() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 42).unwrap();

        assert_eq!(
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 16, 0).unwrap(),
            next_minute(now).unwrap()
        );
    }

    #[test]
    fn keys_are_scoped_to_the_minute() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 10, 7, 0).unwrap();

        assert_eq!("/auth/login_post_127.0.0.1:07", minute_key("/auth/login_post_127.0.0.1", now));
    }
}
