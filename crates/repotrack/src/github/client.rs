//! GitHub API client.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::convert::parse_repository;
use super::error::FetchError;
use super::rate_limit::{ApiRateLimiter, is_rate_limited, resume_at, wait_until};
use super::request::build_request;
use crate::http::{HttpMethod, HttpResponse, HttpTransport, ReqwestTransport};
use crate::store::NewRepository;
use crate::sync::{ProgressCallback, SyncProgress, emit};

/// Thin client over an [`HttpTransport`] that waits out rate limits.
///
/// Cloning is cheap; clones share the transport, the pacer and the
/// cancellation token.
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    token: Option<String>,
    pacer: Option<ApiRateLimiter>,
    cancel: CancellationToken,
}

impl GitHubClient {
    /// Create a client using reqwest with the default timeout.
    pub fn new(token: Option<String>) -> Result<Self, FetchError> {
        let transport = ReqwestTransport::with_timeout(crate::http::DEFAULT_TIMEOUT)?;
        Ok(Self::with_transport(Arc::new(transport), token))
    }

    pub fn with_transport(transport: Arc<dyn HttpTransport>, token: Option<String>) -> Self {
        Self {
            transport,
            token: token.filter(|t| !t.is_empty()),
            pacer: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Pace outgoing requests to at most `requests_per_second`.
    #[must_use]
    pub fn with_pacing(mut self, requests_per_second: u32) -> Self {
        self.pacer = Some(ApiRateLimiter::new(requests_per_second));
        self
    }

    /// Abort rate-limit waits and pagination when `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// GET `url`, retrying the same URL for as long as the server answers
    /// 403/429.
    ///
    /// Any other status, successful or not, is returned to the caller.
    pub async fn get(
        &self,
        url: &str,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<HttpResponse, FetchError> {
        loop {
            if self.cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            let request = build_request(HttpMethod::Get, url, None, self.token.as_deref())?;
            if let Some(pacer) = &self.pacer {
                pacer.wait().await;
            }

            tracing::debug!(url, "GET");
            let response = self.transport.send(request).await?;

            if !is_rate_limited(response.status) {
                return Ok(response);
            }

            let now = Utc::now();
            let resume = match resume_at(&response.headers, now) {
                Some((at, source)) => {
                    tracing::warn!(
                        url,
                        status = response.status,
                        resume_at = %at,
                        ?source,
                        "Rate limited, waiting"
                    );
                    at
                }
                None => {
                    tracing::warn!(
                        url,
                        status = response.status,
                        "Rate limited without a usable reset header, retrying now"
                    );
                    now
                }
            };

            emit(
                on_progress,
                SyncProgress::RateLimited {
                    url: url.to_string(),
                    status: response.status,
                    resume_at: resume,
                },
            );
            wait_until(resume, now, &self.cancel).await?;
        }
    }

    /// Fetch repository metadata from its API URL. Nothing is persisted.
    pub async fn get_repository(
        &self,
        api_url: &str,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<NewRepository, FetchError> {
        let response = self.get(api_url, on_progress).await?;
        if !response.is_success() {
            return Err(FetchError::from_response(&response));
        }
        parse_repository(&response.body, api_url)
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("pacer", &self.pacer)
            .finish_non_exhaustive()
    }
}
