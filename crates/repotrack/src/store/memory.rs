//! In-memory [`RecordStore`] for pipeline tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::DbErr;

use super::{AuthorStats, InsertOutcome, NewCommit, NewRepository, RecordStore, Result, StoreError};
use crate::entity::prelude::{CommitRecord, RepositoryId, RepositoryRef};

#[derive(Default)]
struct State {
    next_id: RepositoryId,
    repositories: BTreeMap<RepositoryId, RepositoryRef>,
    commits: BTreeMap<String, CommitRecord>,
    failing_shas: HashSet<String>,
    fail_deletes: bool,
    calls: Vec<String>,
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make inserts of this SHA fail with a database error.
    pub(crate) fn fail_insert_of(&self, sha: &str) {
        self.lock().failing_shas.insert(sha.to_string());
    }

    pub(crate) fn fail_deletes(&self) {
        self.lock().fail_deletes = true;
    }

    pub(crate) fn seed_commit(&self, commit: NewCommit) {
        self.lock()
            .commits
            .insert(commit.sha.clone(), CommitRecord::from(commit));
    }

    pub(crate) fn commit_shas(&self, repository_id: RepositoryId) -> Vec<String> {
        self.lock()
            .commits
            .values()
            .filter(|c| c.repository_id == repository_id)
            .map(|c| c.sha.clone())
            .collect()
    }

    /// Names of the mutating calls made so far, in order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("memory store mutex poisoned")
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn upsert_repository(&self, repo: NewRepository) -> Result<RepositoryRef> {
        let mut state = self.lock();
        state.calls.push(format!("upsert:{}", repo.url));
        let synced_at = Utc::now().fixed_offset();

        let existing = state
            .repositories
            .values()
            .find(|r| r.url == repo.url)
            .cloned();

        let model = match existing {
            Some(mut model) => {
                if model.name.is_empty() {
                    model.name = repo.name;
                }
                if model.description.is_none() {
                    model.description = repo.description;
                }
                model.platform_id = repo.platform_id;
                model.full_name = repo.full_name;
                model.language = repo.language;
                model.forks = repo.forks;
                model.stars = repo.stars;
                model.open_issues = repo.open_issues;
                model.watchers = repo.watchers;
                model.created_at = repo.created_at.map(|t| t.fixed_offset());
                model.pushed_at = repo.pushed_at.map(|t| t.fixed_offset());
                model.updated_at = repo.updated_at.map(|t| t.fixed_offset());
                model.synced_at = synced_at;
                model
            }
            None => {
                state.next_id += 1;
                RepositoryRef {
                    id: state.next_id,
                    platform_id: repo.platform_id,
                    url: repo.url,
                    name: repo.name,
                    full_name: repo.full_name,
                    description: repo.description,
                    language: repo.language,
                    forks: repo.forks,
                    stars: repo.stars,
                    open_issues: repo.open_issues,
                    watchers: repo.watchers,
                    created_at: repo.created_at.map(|t| t.fixed_offset()),
                    pushed_at: repo.pushed_at.map(|t| t.fixed_offset()),
                    updated_at: repo.updated_at.map(|t| t.fixed_offset()),
                    synced_at,
                }
            }
        };

        state.repositories.insert(model.id, model.clone());
        Ok(model)
    }

    async fn insert_commit_if_absent(&self, commit: &NewCommit) -> Result<InsertOutcome> {
        let mut state = self.lock();
        state.calls.push(format!("insert:{}", commit.sha));
        if state.failing_shas.contains(&commit.sha) {
            return Err(StoreError::Database(DbErr::Custom(format!(
                "injected failure for {}",
                commit.sha
            ))));
        }
        if state.commits.contains_key(&commit.sha) {
            return Ok(InsertOutcome::AlreadyPresent);
        }
        state
            .commits
            .insert(commit.sha.clone(), CommitRecord::from(commit.clone()));
        Ok(InsertOutcome::Inserted)
    }

    async fn delete_commits_for_repository(&self, repository_id: RepositoryId) -> Result<u64> {
        let mut state = self.lock();
        state.calls.push(format!("delete:{repository_id}"));
        if state.fail_deletes {
            return Err(StoreError::Database(DbErr::Custom(
                "injected delete failure".to_string(),
            )));
        }
        let before = state.commits.len();
        state.commits.retain(|_, c| c.repository_id != repository_id);
        Ok((before - state.commits.len()) as u64)
    }

    async fn find_commits_for_repository(
        &self,
        repository_id: RepositoryId,
    ) -> Result<Vec<CommitRecord>> {
        let state = self.lock();
        let mut commits: Vec<CommitRecord> = state
            .commits
            .values()
            .filter(|c| c.repository_id == repository_id)
            .cloned()
            .collect();
        commits.sort_by(|a, b| {
            b.authored_at
                .cmp(&a.authored_at)
                .then_with(|| a.sha.cmp(&b.sha))
        });
        Ok(commits)
    }

    async fn find_latest_commit(
        &self,
        repository_id: RepositoryId,
    ) -> Result<Option<CommitRecord>> {
        Ok(self
            .find_commits_for_repository(repository_id)
            .await?
            .into_iter()
            .next())
    }

    async fn find_repository_by_url(&self, url: &str) -> Result<Option<RepositoryRef>> {
        Ok(self
            .lock()
            .repositories
            .values()
            .find(|r| r.url == url)
            .cloned())
    }

    async fn find_repository_by_id(&self, id: RepositoryId) -> Result<Option<RepositoryRef>> {
        Ok(self.lock().repositories.get(&id).cloned())
    }

    async fn list_repositories(&self) -> Result<Vec<RepositoryRef>> {
        Ok(self.lock().repositories.values().cloned().collect())
    }

    async fn delete_repository(&self, id: RepositoryId) -> Result<u64> {
        let mut state = self.lock();
        state.commits.retain(|_, c| c.repository_id != id);
        Ok(state.repositories.remove(&id).map_or(0, |_| 1))
    }

    async fn top_authors(
        &self,
        repository_id: RepositoryId,
        limit: u64,
    ) -> Result<Vec<AuthorStats>> {
        let state = self.lock();
        let mut counts: BTreeMap<(String, String), i64> = BTreeMap::new();
        for commit in state.commits.values() {
            if commit.repository_id == repository_id {
                *counts
                    .entry((commit.author_name.clone(), commit.author_email.clone()))
                    .or_default() += 1;
            }
        }
        let mut stats: Vec<AuthorStats> = counts
            .into_iter()
            .map(|((name, email), commits)| AuthorStats {
                name,
                email,
                commits,
            })
            .collect();
        stats.sort_by(|a, b| b.commits.cmp(&a.commits).then_with(|| a.name.cmp(&b.name)));
        if limit > 0 {
            stats.truncate(limit as usize);
        }
        Ok(stats)
    }
}
