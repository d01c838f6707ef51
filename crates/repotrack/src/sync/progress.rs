//! Progress events emitted while fetching and reconciling.
//!
//! The library never prints; front ends subscribe with a [`ProgressCallback`]
//! and render events however they like.

use chrono::{DateTime, Utc};

use super::types::ReconcilePolicy;

#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SyncProgress {
    /// Requesting repository metadata.
    FetchingRepository { url: String },

    /// Metadata could not be refreshed; stored values are kept.
    MetadataFailed { repository: String, error: String },

    /// Metadata stored.
    RepositorySynced {
        full_name: String,
        stars: i32,
        forks: i32,
    },

    /// Starting a commit walk.
    FetchingCommits {
        repository: String,
        since: Option<DateTime<Utc>>,
        policy: ReconcilePolicy,
    },

    /// Stored commits removed ahead of a full replace.
    ClearedCommits { repository: String, deleted: u64 },

    /// A page was fetched and reconciled.
    FetchedPage {
        repository: String,
        /// 1-indexed.
        page: u32,
        count: usize,
        inserted: usize,
        expected_pages: Option<u32>,
    },

    /// The server throttled us; the request will be retried at `resume_at`.
    RateLimited {
        url: String,
        status: u16,
        resume_at: DateTime<Utc>,
    },

    /// A single commit failed to persist and was skipped.
    CommitPersistError { sha: String, error: String },

    /// Commit walk finished.
    FetchComplete {
        repository: String,
        pages: u32,
        fetched: usize,
        inserted: usize,
        skipped: usize,
        failed: usize,
    },

    /// A refresh pass over all tracked repositories began.
    RefreshStarted { repositories: usize },

    /// One repository failed during a refresh pass.
    RefreshFailed { repository: String, error: String },

    RefreshComplete { refreshed: usize, failed: usize },
}

/// Callback receiving [`SyncProgress`] events.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Emit an event if a callback is present.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn emit_invokes_callback() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let callback: ProgressCallback = Box::new(move |event| {
            if let SyncProgress::FetchedPage { count, .. } = event {
                seen.fetch_add(count, Ordering::SeqCst);
            }
        });

        emit(
            Some(&callback),
            SyncProgress::FetchedPage {
                repository: "a/b".to_string(),
                page: 1,
                count: 3,
                inserted: 3,
                expected_pages: None,
            },
        );
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn emit_without_callback_is_noop() {
        emit(
            None,
            SyncProgress::RefreshComplete {
                refreshed: 0,
                failed: 0,
            },
        );
    }
}
