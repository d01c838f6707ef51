//! Durable persistence for tracked repositories and their commits.
//!
//! The free functions in [`repositories`] and [`commits`] operate directly on a
//! [`DatabaseConnection`]. The sync pipeline talks to the store through the
//! [`RecordStore`] trait so it can be exercised without a database.

pub mod commits;
mod errors;
mod records;
pub mod repositories;

#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::entity::prelude::{CommitRecord, RepositoryId, RepositoryRef};

pub use errors::{Result, StoreError};
pub use records::{AuthorStats, InsertOutcome, NewCommit, NewRepository};

/// The persistence operations the sync pipeline depends on.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert or update a repository keyed by its URL.
    async fn upsert_repository(&self, repo: NewRepository) -> Result<RepositoryRef>;

    /// Insert a commit unless its SHA is already stored.
    async fn insert_commit_if_absent(&self, commit: &NewCommit) -> Result<InsertOutcome>;

    /// Delete every commit of a repository, returning how many were removed.
    async fn delete_commits_for_repository(&self, repository_id: RepositoryId) -> Result<u64>;

    /// Commits of a repository, newest first.
    async fn find_commits_for_repository(
        &self,
        repository_id: RepositoryId,
    ) -> Result<Vec<CommitRecord>>;

    /// The most recently authored commit of a repository.
    async fn find_latest_commit(&self, repository_id: RepositoryId)
    -> Result<Option<CommitRecord>>;

    async fn find_repository_by_url(&self, url: &str) -> Result<Option<RepositoryRef>>;

    async fn find_repository_by_id(&self, id: RepositoryId) -> Result<Option<RepositoryRef>>;

    async fn list_repositories(&self) -> Result<Vec<RepositoryRef>>;

    /// Remove a repository and, through the cascade, its commits.
    async fn delete_repository(&self, id: RepositoryId) -> Result<u64>;

    /// Authors ranked by commit count. A `limit` of 0 means no limit.
    async fn top_authors(&self, repository_id: RepositoryId, limit: u64)
    -> Result<Vec<AuthorStats>>;
}

/// [`RecordStore`] backed by a sea-orm connection pool.
#[derive(Debug)]
pub struct DbStore {
    db: DatabaseConnection,
}

impl DbStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection, for callers that need raw queries.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl RecordStore for DbStore {
    async fn upsert_repository(&self, repo: NewRepository) -> Result<RepositoryRef> {
        repositories::upsert(&self.db, repo).await
    }

    async fn insert_commit_if_absent(&self, commit: &NewCommit) -> Result<InsertOutcome> {
        commits::insert_if_absent(&self.db, commit).await
    }

    async fn delete_commits_for_repository(&self, repository_id: RepositoryId) -> Result<u64> {
        commits::delete_for_repository(&self.db, repository_id).await
    }

    async fn find_commits_for_repository(
        &self,
        repository_id: RepositoryId,
    ) -> Result<Vec<CommitRecord>> {
        commits::find_for_repository(&self.db, repository_id).await
    }

    async fn find_latest_commit(
        &self,
        repository_id: RepositoryId,
    ) -> Result<Option<CommitRecord>> {
        commits::find_latest(&self.db, repository_id).await
    }

    async fn find_repository_by_url(&self, url: &str) -> Result<Option<RepositoryRef>> {
        repositories::find_by_url(&self.db, url).await
    }

    async fn find_repository_by_id(&self, id: RepositoryId) -> Result<Option<RepositoryRef>> {
        repositories::find_by_id(&self.db, id).await
    }

    async fn list_repositories(&self) -> Result<Vec<RepositoryRef>> {
        repositories::list(&self.db).await
    }

    async fn delete_repository(&self, id: RepositoryId) -> Result<u64> {
        repositories::delete(&self.db, id).await
    }

    async fn top_authors(
        &self,
        repository_id: RepositoryId,
        limit: u64,
    ) -> Result<Vec<AuthorStats>> {
        commits::top_authors(&self.db, repository_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_errors_name_the_lookup() {
        let msg = StoreError::repository_not_found(42).to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains("id=42"));

        let msg = StoreError::repository_url_not_found("https://api.github.com/repos/a/b")
            .to_string();
        assert!(msg.contains("url=https://api.github.com/repos/a/b"));
    }

    #[tokio::test]
    async fn db_store_works_behind_the_trait_object() {
        use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
        use std::sync::Arc;

        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([MockExecResult {
                rows_affected: 3,
                last_insert_id: 0,
            }])
            .into_connection();
        let store: Arc<dyn RecordStore> = Arc::new(DbStore::new(db));

        let deleted = store
            .delete_commits_for_repository(7)
            .await
            .expect("mock delete should succeed");
        assert_eq!(deleted, 3);
    }

    #[test]
    fn database_errors_convert() {
        let err: StoreError = sea_orm::DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, StoreError::Database(_)));
        assert!(err.to_string().contains("boom"));
    }
}
