use repotrack::SyncProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn handle(&self, event: SyncProgress) {
        match event {
            SyncProgress::FetchingRepository { url } => {
                tracing::info!(url = %url, "Fetching repository metadata");
            }

            SyncProgress::MetadataFailed { repository, error } => {
                tracing::warn!(repository = %repository, error = %error, "Metadata refresh failed");
            }

            SyncProgress::RepositorySynced {
                full_name,
                stars,
                forks,
            } => {
                tracing::info!(repository = %full_name, stars, forks, "Repository metadata stored");
            }

            SyncProgress::FetchingCommits {
                repository,
                since,
                policy,
            } => {
                tracing::info!(repository = %repository, since = ?since, policy = %policy, "Fetching commits");
            }

            SyncProgress::ClearedCommits {
                repository,
                deleted,
            } => {
                tracing::info!(repository = %repository, deleted, "Cleared stored commits");
            }

            SyncProgress::FetchedPage {
                repository,
                page,
                count,
                inserted,
                expected_pages,
            } => {
                tracing::debug!(repository = %repository, page, count, inserted, expected_pages = ?expected_pages, "Fetched page");
            }

            SyncProgress::RateLimited {
                url,
                status,
                resume_at,
            } => {
                tracing::warn!(url = %url, status, resume_at = %resume_at, "Rate limited, waiting");
            }

            SyncProgress::CommitPersistError { sha, error } => {
                tracing::warn!(sha = %sha, error = %error, "Failed to store commit");
            }

            SyncProgress::FetchComplete {
                repository,
                pages,
                fetched,
                inserted,
                skipped,
                failed,
            } => {
                tracing::info!(repository = %repository, pages, fetched, inserted, skipped, failed, "Fetch complete");
            }

            SyncProgress::RefreshStarted { repositories } => {
                tracing::info!(repositories, "Refresh started");
            }

            SyncProgress::RefreshFailed { repository, error } => {
                tracing::error!(repository = %repository, error = %error, "Refresh failed");
            }

            SyncProgress::RefreshComplete { refreshed, failed } => {
                tracing::info!(refreshed, failed, "Refresh complete");
            }

            _ => {}
        }
    }
}
