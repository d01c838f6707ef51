//! Link-header pagination.

use chrono::{DateTime, Utc};

use super::client::GitHubClient;
use super::error::FetchError;
use super::link::parse_link_header;
use crate::sync::ProgressCallback;

/// Page size requested from list endpoints (the API maximum).
pub const PER_PAGE: u32 = 100;

/// Format used for the `since` query parameter.
pub const SINCE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// First-page URL of a repository's commit listing.
///
/// `since` is inclusive on the server side and truncated to whole seconds.
pub fn commits_url(repo_api_url: &str, since: Option<DateTime<Utc>>) -> String {
    let base = repo_api_url.trim_end_matches('/');
    match since {
        Some(since) => format!(
            "{base}/commits?per_page={PER_PAGE}&since={}",
            since.format(SINCE_FORMAT)
        ),
        None => format!("{base}/commits?per_page={PER_PAGE}"),
    }
}

/// A successfully fetched page body, not yet normalized.
#[derive(Debug, Clone)]
pub struct RawPage {
    /// 1-indexed.
    pub number: u32,
    pub url: String,
    pub body: Vec<u8>,
    /// Total page count estimated from the first page's `last` link.
    pub expected_pages: Option<u32>,
}

/// Lazily walks `next` links from a starting URL.
///
/// Each call to [`PageWalker::next_page`] issues one logical request (plus
/// any rate-limit retries). The walk ends when a response has no `next`
/// link; after an error the walker is exhausted.
pub struct PageWalker<'a> {
    client: &'a GitHubClient,
    on_progress: Option<&'a ProgressCallback>,
    next_url: Option<String>,
    page: u32,
    expected_pages: Option<u32>,
}

impl<'a> PageWalker<'a> {
    pub fn new(
        client: &'a GitHubClient,
        start_url: impl Into<String>,
        on_progress: Option<&'a ProgressCallback>,
    ) -> Self {
        let start_url = start_url.into();
        Self {
            client,
            on_progress,
            next_url: (!start_url.is_empty()).then_some(start_url),
            page: 0,
            expected_pages: None,
        }
    }

    /// Pages returned so far.
    pub fn pages_fetched(&self) -> u32 {
        self.page
    }

    pub async fn next_page(&mut self) -> Result<Option<RawPage>, FetchError> {
        let Some(url) = self.next_url.take() else {
            return Ok(None);
        };

        if self.client.cancellation().is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let response = self.client.get(&url, self.on_progress).await?;
        if !response.is_success() {
            return Err(FetchError::from_response(&response));
        }

        let links = response
            .header("link")
            .map(parse_link_header)
            .unwrap_or_default();

        self.page += 1;
        if self.page == 1 {
            self.expected_pages = links.last_page().or(links.next.is_none().then_some(1));
        }
        self.next_url = links.next;

        tracing::debug!(
            url = %url,
            page = self.page,
            has_next = self.next_url.is_some(),
            "Fetched page"
        );

        Ok(Some(RawPage {
            number: self.page,
            url,
            body: response.body,
            expected_pages: self.expected_pages,
        }))
    }
}
