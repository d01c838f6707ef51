//! Shared sync types and constants.

use std::time::Duration;

use crate::entity::prelude::CommitRecord;

/// Default interval between scheduled refresh passes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// How fetched commits are reconciled against stored ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePolicy {
    /// Delete the repository's commits before the first request, then insert
    /// every fetched commit.
    ReplaceAll,
    /// Keep stored commits; insert fetched commits whose SHA is new.
    AppendOnly,
}

impl std::fmt::Display for ReconcilePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReplaceAll => f.write_str("replace-all"),
            Self::AppendOnly => f.write_str("append-only"),
        }
    }
}

/// Outcome of one commit pipeline run.
#[derive(Debug, Default)]
pub struct CommitSyncResult {
    /// Fetched commits from every page, concatenated in page order.
    pub records: Vec<CommitRecord>,
    /// Pages fetched.
    pub pages: u32,
    /// Commits parsed from those pages.
    pub fetched: usize,
    pub inserted: usize,
    /// Already present (same SHA).
    pub skipped: usize,
    /// Store failures, logged and skipped.
    pub failed: usize,
}

/// Outcome of a refresh pass over every tracked repository.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshSummary {
    pub repositories: usize,
    pub refreshed: usize,
    pub failed: usize,
    /// New commits across all repositories.
    pub inserted: usize,
    /// `(full_name, error)` for each failed repository.
    pub errors: Vec<(String, String)>,
}
