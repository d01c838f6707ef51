//! GitHub REST client, pagination and payload normalization.
//!
//! # Module Structure
//!
//! - [`request`] - request construction with the fixed API headers
//! - [`rate_limit`] - the 403/429 gate and optional client-side pacing
//! - [`link`] - `link` header parsing
//! - [`pagination`] - the page walker over `next` links
//! - [`convert`] - JSON payloads to store records

mod client;
mod convert;
mod error;
pub mod link;
pub mod pagination;
pub mod rate_limit;
mod repo_url;
pub mod request;
mod types;

pub use client::GitHubClient;
pub use convert::{parse_commit_page, parse_repository};
pub use error::FetchError;
pub use link::{LinkPagination, next_page_url, parse_link_header};
pub use pagination::{PageWalker, RawPage, commits_url};
pub use rate_limit::ApiRateLimiter;
pub use repo_url::{API_BASE, sanitize_repo_url};
pub use types::{GitHubCommit, GitHubRepository};
