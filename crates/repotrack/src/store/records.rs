//! Normalized records on their way into the store.

use chrono::{DateTime, Utc};
use sea_orm::{FromQueryResult, Set};
use serde::Serialize;

use crate::entity::commit::{ActiveModel as CommitActiveModel, Model as CommitRecord};
use crate::entity::tracked_repository::RepositoryId;

/// Repository metadata as reported by the API, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRepository {
    pub platform_id: i64,
    /// Canonical API URL; the upsert key.
    pub url: String,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub forks: i32,
    pub stars: i32,
    pub open_issues: i32,
    pub watchers: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A commit as reported by the API, with its owning repository injected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommit {
    pub sha: String,
    pub message: String,
    pub url: String,
    pub author_name: String,
    pub author_email: String,
    pub authored_at: DateTime<Utc>,
    pub repository_id: RepositoryId,
}

impl NewCommit {
    pub fn to_active_model(&self) -> CommitActiveModel {
        CommitActiveModel {
            sha: Set(self.sha.clone()),
            message: Set(self.message.clone()),
            url: Set(self.url.clone()),
            author_name: Set(self.author_name.clone()),
            author_email: Set(self.author_email.clone()),
            authored_at: Set(self.authored_at.fixed_offset()),
            repository_id: Set(self.repository_id),
        }
    }
}

impl From<NewCommit> for CommitRecord {
    fn from(commit: NewCommit) -> Self {
        Self {
            sha: commit.sha,
            message: commit.message,
            url: commit.url,
            author_name: commit.author_name,
            author_email: commit.author_email,
            authored_at: commit.authored_at.fixed_offset(),
            repository_id: commit.repository_id,
        }
    }
}

/// Outcome of an insert-if-absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same SHA already exists; nothing was written.
    AlreadyPresent,
}

/// Commit count per author, as returned by the top-authors query.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct AuthorStats {
    pub name: String,
    pub email: String,
    pub commits: i64,
}
