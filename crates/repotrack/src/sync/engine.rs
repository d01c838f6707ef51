//! The fetch-and-reconcile pipeline.
//!
//! [`Tracker`] ties a [`GitHubClient`] to a [`RecordStore`]. Every entry point
//! sanitizes the repository URL, takes that repository's lock, then walks the
//! API and reconciles each page as it arrives. Pages already reconciled are
//! kept when a later page fails.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::OwnedMutexGuard;

use super::progress::{ProgressCallback, SyncProgress, emit};
use super::types::{CommitSyncResult, ReconcilePolicy, RefreshSummary};
use crate::entity::prelude::{CommitRecord, RepositoryRef};
use crate::github::{FetchError, GitHubClient, PageWalker, commits_url, parse_commit_page, sanitize_repo_url};
use crate::store::{InsertOutcome, RecordStore};

/// One async mutex per repository URL.
#[derive(Default)]
struct RepoLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl RepoLocks {
    async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(map.entry(key.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}

/// Entry point for fetching and refreshing tracked repositories.
pub struct Tracker {
    client: GitHubClient,
    store: Arc<dyn RecordStore>,
    locks: RepoLocks,
    on_progress: Option<ProgressCallback>,
}

impl Tracker {
    pub fn new(client: GitHubClient, store: Arc<dyn RecordStore>) -> Self {
        Self {
            client,
            store,
            locks: RepoLocks::default(),
            on_progress: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn client(&self) -> &GitHubClient {
        &self.client
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    fn progress(&self) -> Option<&ProgressCallback> {
        self.on_progress.as_ref()
    }

    /// Fetch repository metadata and upsert it.
    ///
    /// `url` may be a github.com web URL or an API URL. On a non-success
    /// status nothing is written.
    pub async fn fetch_repository(&self, url: &str) -> Result<RepositoryRef, FetchError> {
        let api_url = sanitize_repo_url(url)?;
        let _guard = self.locks.acquire(&api_url).await;
        self.sync_metadata(&api_url).await
    }

    /// Re-fetch a repository's full history, replacing what is stored.
    pub async fn fetch_commits(
        &self,
        url: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<CommitRecord>, FetchError> {
        Ok(self
            .sync_commits(url, since, ReconcilePolicy::ReplaceAll)
            .await?
            .records)
    }

    /// Run the commit pipeline for an already tracked repository.
    pub async fn sync_commits(
        &self,
        url: &str,
        since: Option<DateTime<Utc>>,
        policy: ReconcilePolicy,
    ) -> Result<CommitSyncResult, FetchError> {
        let api_url = sanitize_repo_url(url)?;
        let _guard = self.locks.acquire(&api_url).await;

        let repo = self
            .store
            .find_repository_by_url(&api_url)
            .await?
            .ok_or(FetchError::RepositoryNotTracked(api_url))?;

        self.run_pipeline(&repo, since, policy).await
    }

    /// Refresh metadata, then append commits newer than the stored cursor.
    ///
    /// With no stored commits the whole history is fetched. A failed metadata
    /// fetch is logged and the commit pull still runs against the stored row.
    pub async fn refresh_repository(
        &self,
        repo: &RepositoryRef,
    ) -> Result<CommitSyncResult, FetchError> {
        let _guard = self.locks.acquire(&repo.url).await;

        let repo = match self.sync_metadata(&repo.url).await {
            Ok(updated) => updated,
            Err(FetchError::Cancelled) => return Err(FetchError::Cancelled),
            Err(e) => {
                tracing::warn!(
                    repository = %repo.full_name,
                    error = %e,
                    "Metadata refresh failed, pulling commits anyway"
                );
                emit(
                    self.progress(),
                    SyncProgress::MetadataFailed {
                        repository: repo.full_name.clone(),
                        error: e.to_string(),
                    },
                );
                repo.clone()
            }
        };
        let cursor = self
            .store
            .find_latest_commit(repo.id)
            .await?
            .map(|c| c.authored_at.with_timezone(&Utc));

        tracing::debug!(repository = %repo.full_name, ?cursor, "Refreshing from cursor");
        self.run_pipeline(&repo, cursor, ReconcilePolicy::AppendOnly)
            .await
    }

    /// Refresh every tracked repository in turn.
    ///
    /// Failures are logged and counted, never returned. A cancelled client
    /// ends the pass early.
    pub async fn refresh_all_tracked(&self) -> RefreshSummary {
        let mut summary = RefreshSummary::default();

        let repositories = match self.store.list_repositories().await {
            Ok(repos) => repos,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list tracked repositories");
                summary.errors.push(("<store>".to_string(), e.to_string()));
                return summary;
            }
        };

        summary.repositories = repositories.len();
        tracing::info!(repositories = summary.repositories, "Refreshing tracked repositories");
        emit(
            self.progress(),
            SyncProgress::RefreshStarted {
                repositories: summary.repositories,
            },
        );

        for repo in &repositories {
            match self.refresh_repository(repo).await {
                Ok(result) => {
                    summary.refreshed += 1;
                    summary.inserted += result.inserted;
                }
                Err(FetchError::Cancelled) => {
                    tracing::info!("Refresh cancelled");
                    break;
                }
                Err(e) => {
                    tracing::error!(repository = %repo.full_name, error = %e, "Refresh failed");
                    emit(
                        self.progress(),
                        SyncProgress::RefreshFailed {
                            repository: repo.full_name.clone(),
                            error: e.to_string(),
                        },
                    );
                    summary.failed += 1;
                    summary.errors.push((repo.full_name.clone(), e.to_string()));
                }
            }
        }

        tracing::info!(
            refreshed = summary.refreshed,
            failed = summary.failed,
            inserted = summary.inserted,
            "Refresh pass complete"
        );
        emit(
            self.progress(),
            SyncProgress::RefreshComplete {
                refreshed: summary.refreshed,
                failed: summary.failed,
            },
        );
        summary
    }

    /// Fetch and upsert metadata. Caller holds the repository lock.
    async fn sync_metadata(&self, api_url: &str) -> Result<RepositoryRef, FetchError> {
        emit(
            self.progress(),
            SyncProgress::FetchingRepository {
                url: api_url.to_string(),
            },
        );

        let fetched = self.client.get_repository(api_url, self.progress()).await?;
        let stored = self.store.upsert_repository(fetched).await?;

        tracing::info!(
            repository = %stored.full_name,
            id = stored.id,
            stars = stored.stars,
            "Repository metadata stored"
        );
        emit(
            self.progress(),
            SyncProgress::RepositorySynced {
                full_name: stored.full_name.clone(),
                stars: stored.stars,
                forks: stored.forks,
            },
        );
        Ok(stored)
    }

    /// Walk the commit listing and reconcile each page. Caller holds the
    /// repository lock.
    async fn run_pipeline(
        &self,
        repo: &RepositoryRef,
        since: Option<DateTime<Utc>>,
        policy: ReconcilePolicy,
    ) -> Result<CommitSyncResult, FetchError> {
        let label = repo.full_name.clone();
        emit(
            self.progress(),
            SyncProgress::FetchingCommits {
                repository: label.clone(),
                since,
                policy,
            },
        );

        if policy == ReconcilePolicy::ReplaceAll {
            let deleted = self.store.delete_commits_for_repository(repo.id).await?;
            tracing::debug!(repository = %label, deleted, "Cleared stored commits");
            emit(
                self.progress(),
                SyncProgress::ClearedCommits {
                    repository: label.clone(),
                    deleted,
                },
            );
        }

        let mut result = CommitSyncResult::default();
        let mut walker = PageWalker::new(&self.client, commits_url(&repo.url, since), self.progress());

        while let Some(page) = walker.next_page().await? {
            let commits = parse_commit_page(&page.body, repo.id)?;
            let mut page_inserted = 0;

            for commit in &commits {
                match self.store.insert_commit_if_absent(commit).await {
                    Ok(InsertOutcome::Inserted) => page_inserted += 1,
                    Ok(InsertOutcome::AlreadyPresent) => result.skipped += 1,
                    Err(e) => {
                        tracing::warn!(sha = %commit.sha, error = %e, "Failed to store commit, skipping");
                        emit(
                            self.progress(),
                            SyncProgress::CommitPersistError {
                                sha: commit.sha.clone(),
                                error: e.to_string(),
                            },
                        );
                        result.failed += 1;
                    }
                }
            }

            result.inserted += page_inserted;
            result.fetched += commits.len();
            result.pages = page.number;
            emit(
                self.progress(),
                SyncProgress::FetchedPage {
                    repository: label.clone(),
                    page: page.number,
                    count: commits.len(),
                    inserted: page_inserted,
                    expected_pages: page.expected_pages,
                },
            );
            result
                .records
                .extend(commits.into_iter().map(CommitRecord::from));
        }

        tracing::info!(
            repository = %label,
            %policy,
            pages = result.pages,
            fetched = result.fetched,
            inserted = result.inserted,
            skipped = result.skipped,
            failed = result.failed,
            "Commit sync complete"
        );
        emit(
            self.progress(),
            SyncProgress::FetchComplete {
                repository: label,
                pages: result.pages,
                fetched: result.fetched,
                inserted: result.inserted,
                skipped: result.skipped,
                failed: result.failed,
            },
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockTransport;
    use crate::store::memory::MemoryStore;
    use crate::store::{NewCommit, NewRepository};
    use chrono::TimeZone;
    use serde_json::json;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    const WEB_URL: &str = "https://github.com/octo/widgets";
    const API_URL: &str = "https://api.github.com/repos/octo/widgets";

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
    }

    fn commit(sha: &str, author: &str, at: DateTime<Utc>) -> serde_json::Value {
        json!({
            "sha": sha,
            "url": format!("{API_URL}/commits/{sha}"),
            "commit": {
                "message": format!("change {sha}"),
                "author": {"name": author, "email": format!("{author}@example.com"), "date": at.to_rfc3339()}
            }
        })
    }

    fn page(commits: &[serde_json::Value]) -> String {
        serde_json::Value::Array(commits.to_vec()).to_string()
    }

    fn next(url: &str) -> String {
        format!("<{url}>; rel=\"next\"")
    }

    fn repo_json(stars: i32) -> String {
        json!({
            "id": 99, "name": "widgets", "full_name": "octo/widgets",
            "description": "Widgets", "language": "Rust",
            "forks_count": 4, "stargazers_count": stars,
            "open_issues_count": 1, "watchers_count": stars
        })
        .to_string()
    }

    fn new_repository(url: &str, full_name: &str) -> NewRepository {
        NewRepository {
            platform_id: 1,
            url: url.to_string(),
            name: full_name.rsplit('/').next().unwrap_or_default().to_string(),
            full_name: full_name.to_string(),
            description: None,
            language: None,
            forks: 0,
            stars: 0,
            open_issues: 0,
            watchers: 0,
            created_at: None,
            pushed_at: None,
            updated_at: None,
        }
    }

    fn stored_commit(sha: &str, repository_id: i32, at: DateTime<Utc>) -> NewCommit {
        NewCommit {
            sha: sha.to_string(),
            message: "old".to_string(),
            url: format!("{API_URL}/commits/{sha}"),
            author_name: "old".to_string(),
            author_email: "old@example.com".to_string(),
            authored_at: at,
            repository_id,
        }
    }

    struct Harness {
        transport: MockTransport,
        store: Arc<MemoryStore>,
        tracker: Tracker,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_cancel(CancellationToken::new())
        }

        fn with_cancel(cancel: CancellationToken) -> Self {
            let transport = MockTransport::new();
            let store = Arc::new(MemoryStore::new());
            let client = GitHubClient::with_transport(Arc::new(transport.clone()), None)
                .with_cancellation(cancel);
            let tracker = Tracker::new(client, store.clone());
            Self {
                transport,
                store,
                tracker,
            }
        }

        async fn track(&self) -> RepositoryRef {
            self.store
                .upsert_repository(new_repository(API_URL, "octo/widgets"))
                .await
                .expect("seed repository")
        }
    }

    fn shas(records: &[CommitRecord]) -> Vec<&str> {
        records.iter().map(|r| r.sha.as_str()).collect()
    }

    #[tokio::test]
    async fn fetch_repository_sanitizes_and_upserts() {
        let h = Harness::new();
        h.transport.push_get(API_URL, 200, &[], &repo_json(10));

        let repo = h.tracker.fetch_repository(WEB_URL).await.expect("fetched");
        assert_eq!(repo.url, API_URL);
        assert_eq!(repo.stars, 10);
        assert_eq!(repo.description.as_deref(), Some("Widgets"));
        assert_eq!(h.transport.requested_urls(), vec![API_URL]);

        h.transport.push_get(API_URL, 200, &[], &repo_json(25));
        let again = h.tracker.fetch_repository(API_URL).await.expect("refetched");
        assert_eq!(again.id, repo.id);
        assert_eq!(again.stars, 25);
    }

    #[tokio::test]
    async fn metadata_failure_writes_nothing() {
        let h = Harness::new();
        h.transport
            .push_get(API_URL, 404, &[], r#"{"message":"Not Found"}"#);

        let err = h.tracker.fetch_repository(WEB_URL).await.expect_err("404");
        assert!(matches!(err, FetchError::Api { status: 404, .. }));
        assert!(h.store.calls().is_empty());
    }

    #[tokio::test]
    async fn invalid_url_fails_before_any_request() {
        let h = Harness::new();
        let err = h
            .tracker
            .fetch_repository("https://example.com/octo/widgets")
            .await
            .expect_err("invalid");
        assert!(matches!(err, FetchError::InvalidRepoUrl(_)));
        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn untracked_repository_is_rejected() {
        let h = Harness::new();
        let err = h
            .tracker
            .fetch_commits(WEB_URL, None)
            .await
            .expect_err("not tracked");
        assert!(matches!(err, FetchError::RepositoryNotTracked(url) if url == API_URL));
        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn walks_all_pages_and_returns_records_in_page_order() {
        let h = Harness::new();
        let repo = h.track().await;

        let p1 = commits_url(API_URL, None);
        let p2 = format!("{p1}&page=2");
        let p3 = format!("{p1}&page=3");
        let (l1, l2) = (next(&p2), next(&p3));
        h.transport.push_get(&p1, 200, &[("link", l1.as_str())],
            &page(&[commit("c3", "ada", ts(3, 0)), commit("c2", "bob", ts(2, 0))]));
        h.transport.push_get(&p2, 200, &[("link", l2.as_str())],
            &page(&[commit("c1", "ada", ts(1, 0))]));
        h.transport.push_get(&p3, 200, &[], &page(&[commit("c0", "ada", ts(1, 0) - chrono::TimeDelta::days(1))]));

        let result = h
            .tracker
            .sync_commits(WEB_URL, None, ReconcilePolicy::ReplaceAll)
            .await
            .expect("synced");

        assert_eq!(h.transport.requested_urls(), vec![p1, p2, p3]);
        assert_eq!(shas(&result.records), vec!["c3", "c2", "c1", "c0"]);
        assert_eq!(result.pages, 3);
        assert_eq!(result.fetched, 4);
        assert_eq!(result.inserted, 4);
        assert_eq!(result.skipped, 0);
        assert_eq!(h.store.commit_shas(repo.id).len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_page_is_retried_once_without_duplication() {
        let h = Harness::new();
        let repo = h.track().await;

        let p1 = commits_url(API_URL, None);
        let p2 = format!("{p1}&page=2");
        let l1 = next(&p2);
        h.transport.push_get(&p1, 200, &[("link", l1.as_str())], &page(&[commit("a", "ada", ts(2, 0))]));
        h.transport.push_get(&p2, 403, &[("retry-after", "120")], r#"{"message":"API rate limit exceeded"}"#);
        h.transport.push_get(&p2, 200, &[], &page(&[commit("b", "bob", ts(1, 0))]));

        let records = h.tracker.fetch_commits(API_URL, None).await.expect("fetched");

        assert_eq!(shas(&records), vec!["a", "b"]);
        assert_eq!(h.transport.requested_urls(), vec![p1, p2.clone(), p2]);
        assert_eq!(h.store.commit_shas(repo.id), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn replace_all_with_empty_result_clears_the_repository() {
        let h = Harness::new();
        let repo = h.track().await;
        h.store.seed_commit(stored_commit("old1", repo.id, ts(1, 0)));
        h.store.seed_commit(stored_commit("old2", repo.id, ts(2, 0)));
        h.store.seed_commit(stored_commit("other", repo.id + 100, ts(2, 0)));

        h.transport.push_get(commits_url(API_URL, None), 200, &[], "[]");

        let records = h.tracker.fetch_commits(WEB_URL, None).await.expect("fetched");
        assert!(records.is_empty());
        assert!(h.store.commit_shas(repo.id).is_empty());
        assert_eq!(h.store.commit_shas(repo.id + 100), vec!["other"]);
    }

    #[tokio::test]
    async fn replace_all_deletes_before_the_first_request() {
        let h = Harness::new();
        let repo = h.track().await;
        h.transport.push_get(commits_url(API_URL, None), 200, &[], &page(&[commit("x", "ada", ts(1, 0))]));

        h.tracker.fetch_commits(WEB_URL, None).await.expect("fetched");
        let calls = h.store.calls();
        assert_eq!(calls[1], format!("delete:{}", repo.id));
        assert_eq!(calls[2], "insert:x");
    }

    #[tokio::test]
    async fn replace_all_delete_failure_is_fatal() {
        let h = Harness::new();
        h.track().await;
        h.store.fail_deletes();

        let err = h.tracker.fetch_commits(WEB_URL, None).await.expect_err("delete fails");
        assert!(matches!(err, FetchError::Store(_)));
        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn append_only_is_idempotent() {
        let h = Harness::new();
        let repo = h.track().await;
        let body = page(&[commit("a", "ada", ts(2, 0)), commit("b", "bob", ts(1, 0))]);
        let url = commits_url(API_URL, None);
        h.transport.push_get(&url, 200, &[], &body);
        h.transport.push_get(&url, 200, &[], &body);

        let first = h
            .tracker
            .sync_commits(WEB_URL, None, ReconcilePolicy::AppendOnly)
            .await
            .expect("first");
        let after_first = h.store.commit_shas(repo.id);

        let second = h
            .tracker
            .sync_commits(WEB_URL, None, ReconcilePolicy::AppendOnly)
            .await
            .expect("second");

        assert_eq!(first.inserted, 2);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 2);
        assert_eq!(h.store.commit_shas(repo.id), after_first);
        assert!(!h.store.calls().iter().any(|c| c.starts_with("delete:")));
    }

    #[tokio::test]
    async fn store_failure_on_one_commit_is_skipped() {
        let h = Harness::new();
        let repo = h.track().await;
        h.store.fail_insert_of("bad");

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let tracker = Tracker::new(
            GitHubClient::with_transport(Arc::new(h.transport.clone()), None),
            h.store.clone(),
        )
        .with_progress(Box::new(move |e| sink.lock().unwrap().push(e)));

        h.transport.push_get(
            commits_url(API_URL, None),
            200,
            &[],
            &page(&[
                commit("good1", "ada", ts(3, 0)),
                commit("bad", "bob", ts(2, 0)),
                commit("good2", "ada", ts(1, 0)),
            ]),
        );

        let result = tracker
            .sync_commits(WEB_URL, None, ReconcilePolicy::ReplaceAll)
            .await
            .expect("best effort");
        assert_eq!(result.inserted, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(h.store.commit_shas(repo.id), vec!["good1", "good2"]);

        let events = events.lock().unwrap();
        assert!(events.iter().any(
            |e| matches!(e, SyncProgress::CommitPersistError { sha, .. } if sha == "bad")
        ));
        assert!(matches!(
            events.last(),
            Some(SyncProgress::FetchComplete { inserted: 2, failed: 1, .. })
        ));
    }

    #[tokio::test]
    async fn parse_error_aborts_but_keeps_earlier_pages() {
        let h = Harness::new();
        let repo = h.track().await;
        let p1 = commits_url(API_URL, None);
        let p2 = format!("{p1}&page=2");
        let l1 = next(&p2);
        h.transport.push_get(&p1, 200, &[("link", l1.as_str())], &page(&[commit("kept", "ada", ts(1, 0))]));
        h.transport.push_get(&p2, 200, &[], "{\"truncated\":");

        let err = h
            .tracker
            .sync_commits(WEB_URL, None, ReconcilePolicy::AppendOnly)
            .await
            .expect_err("parse");
        assert!(matches!(err, FetchError::Parse(_)));
        assert_eq!(h.store.commit_shas(repo.id), vec!["kept"]);
    }

    #[tokio::test]
    async fn transport_error_aborts_the_fetch() {
        let h = Harness::new();
        h.track().await;
        // No response registered: the mock transport fails.
        let err = h.tracker.fetch_commits(WEB_URL, None).await.expect_err("transport");
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[tokio::test]
    async fn incremental_fetch_absorbs_the_boundary_commit() {
        let h = Harness::new();
        let repo = h.track().await;
        let cursor = ts(10, 12);
        h.store.seed_commit(stored_commit("boundary", repo.id, cursor));

        h.transport.push_get(
            commits_url(API_URL, Some(cursor)),
            200,
            &[],
            &page(&[commit("newer", "ada", ts(11, 0)), commit("boundary", "old", cursor)]),
        );

        let result = h
            .tracker
            .sync_commits(WEB_URL, Some(cursor), ReconcilePolicy::AppendOnly)
            .await
            .expect("incremental");

        assert!(result.records.iter().all(|r| r.authored_at >= cursor));
        assert_eq!(result.inserted, 1);
        assert_eq!(result.skipped, 1);
        let mut stored = h.store.commit_shas(repo.id);
        stored.sort();
        assert_eq!(stored, vec!["boundary", "newer"]);
    }

    #[tokio::test]
    async fn refresh_repository_uses_latest_commit_as_cursor() {
        let h = Harness::new();
        let repo = h.track().await;
        let cursor = ts(20, 8);
        h.store.seed_commit(stored_commit("older", repo.id, ts(1, 0)));
        h.store.seed_commit(stored_commit("latest", repo.id, cursor));

        h.transport.push_get(API_URL, 200, &[], &repo_json(3));
        let since_url = commits_url(API_URL, Some(cursor));
        assert!(since_url.ends_with("since=2024-05-20T08:00:00Z"));
        h.transport.push_get(&since_url, 200, &[], &page(&[commit("latest", "old", cursor)]));

        let result = h.tracker.refresh_repository(&repo).await.expect("refreshed");
        assert_eq!(result.inserted, 0);
        assert_eq!(result.skipped, 1);
        assert_eq!(h.transport.requested_urls(), vec![API_URL.to_string(), since_url]);
    }

    #[tokio::test]
    async fn refresh_without_commits_fetches_full_history() {
        let h = Harness::new();
        let repo = h.track().await;
        h.transport.push_get(API_URL, 200, &[], &repo_json(3));
        h.transport.push_get(commits_url(API_URL, None), 200, &[], &page(&[commit("first", "ada", ts(1, 0))]));

        let result = h.tracker.refresh_repository(&repo).await.expect("refreshed");
        assert_eq!(result.inserted, 1);
    }

    #[tokio::test]
    async fn refresh_pulls_commits_when_metadata_fails() {
        let h = Harness::new();
        let repo = h.track().await;
        let events = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen = Arc::clone(&events);
        let tracker = Tracker::new(h.tracker.client().clone(), h.store.clone()).with_progress(
            Box::new(move |event| {
                if let SyncProgress::MetadataFailed { repository, .. } = event {
                    seen.lock().unwrap().push(repository);
                }
            }),
        );

        h.transport.push_get(API_URL, 502, &[], "bad gateway");
        h.transport.push_get(commits_url(API_URL, None), 200, &[], &page(&[commit("a", "ada", ts(1, 0))]));

        let result = tracker.refresh_repository(&repo).await.expect("refreshed");
        assert_eq!(result.inserted, 1);
        assert_eq!(
            h.transport.requested_urls(),
            vec![API_URL.to_string(), commits_url(API_URL, None)]
        );
        assert_eq!(h.store.commit_shas(repo.id), vec!["a"]);
        assert_eq!(*events.lock().unwrap(), vec!["octo/widgets".to_string()]);

        // The stored row is left as it was.
        let stored = h.store.find_repository_by_id(repo.id).await.unwrap();
        assert_eq!(stored, Some(repo));
    }

    #[tokio::test]
    async fn refresh_all_logs_failures_and_continues() {
        let h = Harness::new();
        let broken_url = "https://api.github.com/repos/octo/broken";
        h.store
            .upsert_repository(new_repository(broken_url, "octo/broken"))
            .await
            .expect("seed");
        h.track().await;

        h.transport.push_get(broken_url, 500, &[], "boom");
        h.transport.push_get(commits_url(broken_url, None), 500, &[], "boom");
        h.transport.push_get(API_URL, 200, &[], &repo_json(3));
        h.transport.push_get(commits_url(API_URL, None), 200, &[], &page(&[commit("a", "ada", ts(1, 0))]));

        let summary = h.tracker.refresh_all_tracked().await;
        assert_eq!(summary.repositories, 2);
        assert_eq!(summary.refreshed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.errors[0].0, "octo/broken");
    }

    #[tokio::test]
    async fn refresh_all_stops_when_cancelled() {
        let cancel = CancellationToken::new();
        let h = Harness::with_cancel(cancel.clone());
        h.track().await;
        cancel.cancel();

        let summary = h.tracker.refresh_all_tracked().await;
        assert_eq!(summary.repositories, 1);
        assert_eq!(summary.refreshed, 0);
        assert_eq!(summary.failed, 0);
        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn repo_locks_serialize_same_key() {
        let locks = Arc::new(RepoLocks::default());
        let held = locks.acquire(API_URL).await;

        let contender = Arc::clone(&locks);
        let waiter = tokio::spawn(async move {
            let _guard = contender.acquire(API_URL).await;
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!waiter.is_finished());

        // A different repository is not blocked.
        let _other = locks.acquire("https://api.github.com/repos/x/y").await;

        drop(held);
        waiter.await.expect("waiter completes");
    }
}
