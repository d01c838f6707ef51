//! Normalization of GitHub payloads into store records.

use serde::de::Error as _;

use super::error::FetchError;
use super::types::{GitHubCommit, GitHubRepository};
use crate::entity::tracked_repository::RepositoryId;
use crate::store::{NewCommit, NewRepository};

/// Parse one page of the commits endpoint.
///
/// Fails on malformed JSON, or on an entry whose commit has neither an author
/// date nor a committer date.
pub fn parse_commit_page(
    body: &[u8],
    repository_id: RepositoryId,
) -> Result<Vec<NewCommit>, FetchError> {
    let page: Vec<GitHubCommit> = serde_json::from_slice(body)?;
    page.into_iter()
        .map(|c| to_new_commit(c, repository_id))
        .collect()
}

/// Parse repository metadata. `url` is the canonical API URL it was fetched
/// from and becomes the upsert key.
pub fn parse_repository(body: &[u8], url: &str) -> Result<NewRepository, FetchError> {
    let repo: GitHubRepository = serde_json::from_slice(body)?;
    Ok(to_new_repository(repo, url))
}

pub fn to_new_commit(
    commit: GitHubCommit,
    repository_id: RepositoryId,
) -> Result<NewCommit, FetchError> {
    let detail = commit.commit;
    let authored_at = detail
        .author
        .as_ref()
        .and_then(|a| a.date)
        .or_else(|| detail.committer.as_ref().and_then(|c| c.date))
        .ok_or_else(|| {
            FetchError::Parse(serde_json::Error::custom(format!(
                "commit {} has no author date",
                commit.sha
            )))
        })?;

    let (author_name, author_email) = detail
        .author
        .map(|a| (a.name.unwrap_or_default(), a.email.unwrap_or_default()))
        .unwrap_or_default();

    Ok(NewCommit {
        sha: commit.sha,
        message: detail.message.unwrap_or_default(),
        url: commit.url,
        author_name,
        author_email,
        authored_at,
        repository_id,
    })
}

pub fn to_new_repository(repo: GitHubRepository, url: &str) -> NewRepository {
    NewRepository {
        platform_id: repo.id,
        url: url.to_string(),
        name: repo.name,
        full_name: repo.full_name,
        description: repo.description,
        language: repo.language,
        forks: repo.forks_count,
        stars: repo.stargazers_count,
        open_issues: repo.open_issues_count,
        watchers: repo.watchers_count,
        created_at: repo.created_at,
        pushed_at: repo.pushed_at,
        updated_at: repo.updated_at,
    }
}
