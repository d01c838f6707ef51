//! Rate-limit handling.
//!
//! The gate is reactive: a 403 or 429 response suspends the caller until the
//! instant the server advertises, then the same URL is retried. The optional
//! [`ApiRateLimiter`] paces requests before they are sent.

use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use tokio_util::sync::CancellationToken;

use super::error::FetchError;
use crate::http::{HttpHeaders, header_get};

type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Statuses GitHub uses for primary and secondary rate limits.
pub fn is_rate_limited(status: u16) -> bool {
    status == 403 || status == 429
}

/// Where the resume instant was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeSource {
    RetryAfter,
    RateLimitReset,
}

/// Compute when a throttled request may be retried.
///
/// `retry-after` (seconds from now) wins over `x-ratelimit-reset` (epoch
/// seconds). Returns `None` when neither header parses.
pub fn resume_at(headers: &HttpHeaders, now: DateTime<Utc>) -> Option<(DateTime<Utc>, ResumeSource)> {
    if let Some(secs) = header_get(headers, "retry-after").and_then(|v| v.trim().parse::<i64>().ok())
    {
        return Some((now + TimeDelta::seconds(secs.max(0)), ResumeSource::RetryAfter));
    }

    header_get(headers, "x-ratelimit-reset")
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(|epoch| DateTime::from_timestamp(epoch, 0))
        .map(|at| (at, ResumeSource::RateLimitReset))
}

/// Sleep until `resume`, or fail with [`FetchError::Cancelled`] if the token
/// fires first. Instants in the past return immediately.
pub async fn wait_until(
    resume: DateTime<Utc>,
    now: DateTime<Utc>,
    cancel: &CancellationToken,
) -> Result<(), FetchError> {
    let delay = (resume - now).to_std().unwrap_or_default();

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FetchError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

/// Client-side request pacing backed by governor.
///
/// ```ignore
/// let limiter = ApiRateLimiter::new(5);
/// limiter.wait().await;
/// ```
#[derive(Clone)]
pub struct ApiRateLimiter {
    inner: Arc<GovernorRateLimiter>,
}

impl ApiRateLimiter {
    /// `requests_per_second` of 0 is treated as 1.
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            inner: Arc::new(RateLimiter::direct(Quota::per_second(rps))),
        }
    }

    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }
}

impl std::fmt::Debug for ApiRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRateLimiter").finish_non_exhaustive()
    }
}
